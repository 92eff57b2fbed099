//! Combines remote and local discovery into one ordered candidate list.
//!
//! Order is always remote first, then local in scanner order. Local scanning
//! runs even when the store produced a document, so the dump records every
//! source that was found.

use crate::local_scan::LocalScanner;
use crate::models::{CandidateDocument, MatchKind, Package};
use crate::remote::{RemoteResolver, STORE_SOURCE};

pub struct EulaAggregator {
    resolver: RemoteResolver,
    scanner: LocalScanner,
}

impl EulaAggregator {
    pub fn new(resolver: RemoteResolver, scanner: LocalScanner) -> Self {
        Self { resolver, scanner }
    }

    /// Every candidate document for `package`, in discovery order.
    pub fn discover(&self, package: &Package) -> Vec<CandidateDocument> {
        let mut candidates = Vec::new();

        if let Some(text) = self.resolver.resolve(package) {
            candidates.push(CandidateDocument::new(
                STORE_SOURCE,
                text,
                MatchKind::ApiOrStore,
            ));
        }
        candidates.extend(self.scanner.scan(&package.name, &package.install_path));

        tracing::debug!(
            app_id = %package.app_id,
            candidates = candidates.len(),
            "discovery finished"
        );
        candidates
    }
}

/// The first candidate with a qualifying match kind, else the first
/// candidate of any kind, else `None`.
pub fn select(candidates: &[CandidateDocument]) -> Option<&CandidateDocument> {
    candidates
        .iter()
        .find(|c| c.match_kind.is_qualifying())
        .or_else(|| candidates.first())
}
