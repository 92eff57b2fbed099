//! Local EULA candidates from a game's install directory.
//!
//! Two passes over the install directory:
//!
//! 1. A recursive walk for legal-looking filenames anywhere in the tree. Each
//!    file is tagged [`MatchKind::FilenameMatch`] when its name resembles the
//!    game name, [`MatchKind::ContentMatch`] when its text mentions the game,
//!    and dropped otherwise.
//! 2. Only when pass 1 tags nothing: a non-recursive pass over the install
//!    root that keeps every prefix-named legal file with non-empty text as
//!    [`MatchKind::GenericRoot`].
//!
//! Files are visited in file-name order, so results are stable for a given tree.

use anyhow::Result;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ScanConfig;
use crate::extract;
use crate::matcher::{content_matches_game, is_close_match};
use crate::models::{CandidateDocument, MatchKind};

/// Recursive pass: keyword anywhere in the file name.
pub const RECURSIVE_PATTERNS: &[&str] = &[
    "**/*eula*.txt",
    "**/*license*.txt",
    "**/*legal*.txt",
    "**/*eula*.pdf",
    "**/*license*.pdf",
    "**/*legal*.pdf",
    "**/*eula*.rtf",
    "**/*license*.rtf",
    "**/*legal*.rtf",
    "**/*eula*.docx",
    "**/*license*.docx",
    "**/*legal*.docx",
    "**/*eula*.html",
    "**/*license*.html",
    "**/*legal*.html",
    "**/*eula*.htm",
    "**/*license*.htm",
    "**/*legal*.htm",
    "**/*readme*.txt",
    "**/*manual*.txt",
];

/// Root pass: keyword must prefix the file name. Unlike the recursive list
/// there is no `.htm` variant; see DESIGN.md before unifying the two.
pub const ROOT_PATTERNS: &[&str] = &[
    "eula*.txt",
    "license*.txt",
    "legal*.txt",
    "eula*.pdf",
    "license*.pdf",
    "legal*.pdf",
    "eula*.rtf",
    "license*.rtf",
    "legal*.rtf",
    "eula*.docx",
    "license*.docx",
    "legal*.docx",
    "eula*.html",
    "license*.html",
    "legal*.html",
    "readme*.txt",
    "manual*.txt",
];

pub struct LocalScanner {
    recursive: GlobSet,
    root_only: GlobSet,
    max_file_bytes: u64,
}

impl LocalScanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Self::with_limit(config.max_file_bytes)
    }

    pub fn with_limit(max_file_bytes: u64) -> Result<Self> {
        Ok(Self {
            recursive: build_globset(RECURSIVE_PATTERNS)?,
            root_only: build_globset(ROOT_PATTERNS)?,
            max_file_bytes,
        })
    }

    /// Runs both passes for one game and returns its tagged candidates.
    pub fn scan(&self, game_name: &str, install_path: &Path) -> Vec<CandidateDocument> {
        let mut found = Vec::new();

        for path in self.recursive_candidates(install_path) {
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            let text = extract::extract_file(&path, self.max_file_bytes);
            let kind = if is_close_match(game_name, &filename) {
                MatchKind::FilenameMatch
            } else if content_matches_game(game_name, &text) {
                MatchKind::ContentMatch
            } else {
                tracing::debug!(path = %path.display(), "no name or content match");
                continue;
            };
            found.push(CandidateDocument::new(path.display().to_string(), text, kind));
        }

        if found.is_empty() {
            for path in self.root_candidates(install_path) {
                let text = extract::extract_file(&path, self.max_file_bytes);
                if text.trim().is_empty() {
                    continue;
                }
                found.push(CandidateDocument::new(
                    path.display().to_string(),
                    text,
                    MatchKind::GenericRoot,
                ));
            }
        }

        found
    }

    /// Files anywhere under `install_path` matching [`RECURSIVE_PATTERNS`].
    pub fn recursive_candidates(&self, install_path: &Path) -> Vec<PathBuf> {
        walk_matching(install_path, None, &self.recursive)
    }

    /// Files directly in `install_path` matching [`ROOT_PATTERNS`].
    pub fn root_candidates(&self, install_path: &Path) -> Vec<PathBuf> {
        walk_matching(install_path, Some(1), &self.root_only)
    }
}

fn walk_matching(root: &Path, max_depth: Option<usize>, set: &GlobSet) -> Vec<PathBuf> {
    if !root.is_dir() {
        tracing::debug!(path = %root.display(), "install directory does not exist");
        return Vec::new();
    }

    let mut walker = WalkDir::new(root).sort_by_file_name();
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut paths = Vec::new();
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if set.is_match(relative) {
            paths.push(path.to_path_buf());
        }
    }
    paths
}

fn build_globset(patterns: &[&str]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            GlobBuilder::new(pattern)
                .case_insensitive(true)
                .literal_separator(true)
                .build()?,
        );
    }
    Ok(builder.build()?)
}
