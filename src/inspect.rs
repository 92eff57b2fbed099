//! `eula-scan inspect` and `eula-scan packages`: read-only views of what a
//! scan would see.
//!
//! Neither command writes the report or dump files, and neither calls the
//! LLM.

use anyhow::{bail, Result};

use crate::aggregate::{self, EulaAggregator};
use crate::classify::keyword;
use crate::config::Config;
use crate::local_scan::LocalScanner;
use crate::models::{CandidateDocument, Package};
use crate::pipeline;
use crate::remote::RemoteResolver;

/// Characters of each candidate shown by `inspect`.
const PREVIEW_CHARS: usize = 400;

/// Prints one line per installed package.
pub fn list_packages(config: &Config, limit: Option<usize>) -> Result<()> {
    let packages = pipeline::list_packages(config, limit)?;

    println!("{:<10} {:<40} INSTALLED", "APP ID", "NAME");
    for package in &packages {
        println!(
            "{:<10} {:<40} {}",
            package.app_id,
            package.name,
            if package.install_path.is_dir() { "yes" } else { "no" }
        );
    }
    println!();
    println!("{} packages", packages.len());
    Ok(())
}

/// Runs discovery for one package and prints every candidate.
pub fn run_inspect(config: &Config, app_id: &str) -> Result<()> {
    let packages = pipeline::list_packages(config, None)?;
    let Some(package) = packages.iter().find(|p| p.app_id == app_id) else {
        bail!("No installed package with app id {}", app_id);
    };

    let aggregator = EulaAggregator::new(
        RemoteResolver::from_config(&config.store)?,
        LocalScanner::new(&config.scan)?,
    );
    let candidates = aggregator.discover(package);
    print_inspection(package, &candidates);
    Ok(())
}

fn print_inspection(package: &Package, candidates: &[CandidateDocument]) {
    let selected = aggregate::select(candidates);

    println!("--- Package ---");
    println!("app_id:       {}", package.app_id);
    println!("name:         {}", package.name);
    println!("install_path: {}", package.install_path.display());
    println!();

    println!("--- Candidates ({}) ---", candidates.len());
    for (i, candidate) in candidates.iter().enumerate() {
        let marker = if selected.is_some_and(|s| std::ptr::eq(s, candidate)) {
            " (selected)"
        } else {
            ""
        };
        println!(
            "[{}] {} | {}{}",
            i + 1,
            candidate.match_kind,
            candidate.source,
            marker
        );
        println!("{}", preview(&candidate.text));
        println!();
    }

    println!("--- Keyword Scan ---");
    println!("{}", keyword::classify(selected.map(|c| c.text.as_str())));
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    let mut out: String = trimmed.chars().take(PREVIEW_CHARS).collect();
    if trimmed.chars().nth(PREVIEW_CHARS).is_some() {
        out.push_str(" ...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preview_truncates_long_text() {
        let long = "a".repeat(PREVIEW_CHARS + 10);
        let shown = preview(&long);
        assert!(shown.ends_with(" ..."));
        assert_eq!(shown.chars().count(), PREVIEW_CHARS + 4);
        assert_eq!(preview("  short \n"), "short");
    }

    #[test]
    fn unknown_app_id_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("steamapps")).unwrap();
        let mut config = Config::default();
        config.steam.path = dir.path().to_path_buf();
        config.store.enabled = false;
        assert!(run_inspect(&config, "620").is_err());
    }
}
