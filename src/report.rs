//! Per-package privacy report.
//!
//! Rows are collected for the whole run and written once at the end, as CSV
//! (the default) or as a pretty-printed JSON array. Column names come from
//! the `serde` renames on [`ReportRow`].

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::str::FromStr;

use crate::models::ReportRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "csv" => Ok(ReportFormat::Csv),
            "json" => Ok(ReportFormat::Json),
            other => bail!("Unknown output format: '{}'. Must be csv or json.", other),
        }
    }
}

/// Writes `rows` to `path`, creating parent directories as needed.
pub fn write_report(path: &Path, format: ReportFormat, rows: &[ReportRow]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    match format {
        ReportFormat::Csv => write_csv(path, rows),
        ReportFormat::Json => {
            let json = serde_json::to_string_pretty(rows)?;
            std::fs::write(path, json)
                .with_context(|| format!("Failed to write report: {}", path.display()))
        }
    }
}

fn write_csv(path: &Path, rows: &[ReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    if rows.is_empty() {
        writer.write_record(HEADERS)?;
    }
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Column order, for an empty CSV report.
const HEADERS: [&str; 9] = [
    "App ID",
    "Game Name",
    "Install Path",
    "EULA Found",
    "Selected Source",
    "Match",
    "Keyword Scan",
    "Privacy Assessment",
    "Error/Notes",
];
