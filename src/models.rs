//! Core data models used throughout the scanner.
//!
//! These types represent the installed packages, the candidate documents
//! discovered for each one, and the per-package report rows.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// An installed game, as read from its app manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    pub app_id: String,
    pub name: String,
    pub install_path: PathBuf,
}

/// How a candidate document was judged relevant to its package.
///
/// Variants are declared in selection priority: the first three are
/// "qualifying" kinds, [`MatchKind::GenericRoot`] is only a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchKind {
    /// Text fetched from the Steam API or store page.
    ApiOrStore,
    /// Local file whose name resembles the game name.
    FilenameMatch,
    /// Local file whose content mentions the game name.
    ContentMatch,
    /// Legal-looking file in the install root with no name/content match.
    GenericRoot,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchKind::ApiOrStore => "api-or-store",
            MatchKind::FilenameMatch => "filename-match",
            MatchKind::ContentMatch => "content-match",
            MatchKind::GenericRoot => "generic-root",
        }
    }

    /// Whether this kind wins selection over generic fallbacks.
    pub fn is_qualifying(&self) -> bool {
        match self {
            MatchKind::ApiOrStore | MatchKind::FilenameMatch | MatchKind::ContentMatch => true,
            MatchKind::GenericRoot => false,
        }
    }
}

impl fmt::Display for MatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A piece of EULA text tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateDocument {
    /// Vendor label (`"Steam API/Store"`) or an absolute file path.
    pub source: String,
    pub text: String,
    pub match_kind: MatchKind,
}

impl CandidateDocument {
    pub fn new(source: impl Into<String>, text: impl Into<String>, match_kind: MatchKind) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            match_kind,
        }
    }
}

/// One row of the privacy report.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRow {
    #[serde(rename = "App ID")]
    pub app_id: String,
    #[serde(rename = "Game Name")]
    pub name: String,
    #[serde(rename = "Install Path")]
    pub install_path: String,
    #[serde(rename = "EULA Found")]
    pub eula_found: String,
    #[serde(rename = "Selected Source")]
    pub selected_source: String,
    #[serde(rename = "Match")]
    pub match_kind: String,
    #[serde(rename = "Keyword Scan")]
    pub keyword_scan: String,
    #[serde(rename = "Privacy Assessment")]
    pub assessment: String,
    #[serde(rename = "Error/Notes")]
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifying_kinds() {
        assert!(MatchKind::ApiOrStore.is_qualifying());
        assert!(MatchKind::FilenameMatch.is_qualifying());
        assert!(MatchKind::ContentMatch.is_qualifying());
        assert!(!MatchKind::GenericRoot.is_qualifying());
    }

    #[test]
    fn serialized_names_match_display() {
        for kind in [
            MatchKind::ApiOrStore,
            MatchKind::FilenameMatch,
            MatchKind::ContentMatch,
            MatchKind::GenericRoot,
        ] {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind));
        }
    }
}
