//! Raw-text provenance dump.
//!
//! The dump file is truncated once per run and then appended to after each
//! package, so a run that stops early still leaves every finished package on
//! disk. Text is cleaned only here; matching and classification always see
//! the extractor output unchanged.

use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::CandidateDocument;

static SPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r" {2,}").expect("space run pattern is valid"));
static BLANK_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{3,}").expect("blank run pattern is valid"));

/// Normalizes whitespace for the dump: tabs become spaces, space runs
/// collapse, every line is trimmed, and at most one blank line separates
/// paragraphs.
pub fn clean_text(text: &str) -> String {
    let text = text.replace("\r\n", "\n").replace('\t', " ");
    let text = SPACE_RUNS.replace_all(&text, " ");
    let text = BLANK_RUNS.replace_all(&text, "\n\n");
    let text = text.lines().map(str::trim).collect::<Vec<_>>().join("\n");
    BLANK_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

/// Writes one package section.
pub fn write_section<W: Write>(
    out: &mut W,
    package_name: &str,
    candidates: &[CandidateDocument],
) -> std::io::Result<()> {
    writeln!(out, "-------------------- {} --------------------", package_name)?;
    if candidates.is_empty() {
        writeln!(out, "[No EULA found]")?;
        writeln!(out)?;
        return Ok(());
    }
    for candidate in candidates {
        writeln!(
            out,
            "[Source: {} | Match: {}]",
            candidate.source, candidate.match_kind
        )?;
        write!(out, "{}", clean_text(&candidate.text))?;
        write!(out, "\n\n")?;
    }
    Ok(())
}

/// Append-only dump file.
pub struct DumpWriter {
    path: PathBuf,
}

impl DumpWriter {
    /// Creates (or truncates) the dump file.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        File::create(path)
            .with_context(|| format!("Failed to create dump file: {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one package section and flushes it to disk.
    pub fn append(&self, package_name: &str, candidates: &[CandidateDocument]) -> Result<()> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open dump file: {}", self.path.display()))?;
        write_section(&mut file, package_name, candidates)
            .with_context(|| format!("Failed to write dump file: {}", self.path.display()))?;
        file.flush()?;
        Ok(())
    }
}
