//! Scan orchestration.
//!
//! Drives one run: enumerate packages → for each package discover, select,
//! classify, dump → write the report. Packages are processed strictly in
//! enumeration order on the calling thread. Per-package failures in
//! discovery or classification never abort the run; only startup checks and
//! failures writing the output files are fatal.

use anyhow::{bail, Result};
use std::path::Path;
use std::time::Duration;

use crate::aggregate::{self, EulaAggregator};
use crate::classify::{keyword, LlmClassifier};
use crate::config::Config;
use crate::dump::DumpWriter;
use crate::library;
use crate::local_scan::LocalScanner;
use crate::models::{Package, ReportRow};
use crate::progress::{ScanProgressEvent, ScanProgressReporter};
use crate::remote::RemoteResolver;
use crate::report::{self, ReportFormat};

/// Called between packages to respect external rate limits.
pub trait Pacer {
    fn pause(&self);
}

/// Sleeps for a fixed duration.
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    fn pause(&self) {
        std::thread::sleep(self.0);
    }
}

pub struct NoDelay;

impl Pacer for NoDelay {
    fn pause(&self) {}
}

/// `scan.delay_ms` as a pacer; zero means no pause at all.
pub fn pacer_from_millis(delay_ms: u64) -> Box<dyn Pacer> {
    if delay_ms == 0 {
        Box::new(NoDelay)
    } else {
        Box::new(FixedDelay(Duration::from_millis(delay_ms)))
    }
}

/// Run-level options that are not part of the config file.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// Process at most this many packages.
    pub limit: Option<usize>,
}

/// Counts printed at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanSummary {
    pub packages: usize,
    pub with_eula: usize,
    pub detected: usize,
    pub llm_quota_exhausted: bool,
}

/// State that lives for one run: the discovery stack, the LLM quota latch,
/// the dump target and the pacing/progress hooks.
pub struct ScanSession {
    aggregator: EulaAggregator,
    llm: LlmClassifier,
    dump: DumpWriter,
    pacer: Box<dyn Pacer>,
    progress: Box<dyn ScanProgressReporter>,
}

impl ScanSession {
    pub fn new(
        aggregator: EulaAggregator,
        llm: LlmClassifier,
        dump: DumpWriter,
        pacer: Box<dyn Pacer>,
        progress: Box<dyn ScanProgressReporter>,
    ) -> Self {
        Self {
            aggregator,
            llm,
            dump,
            pacer,
            progress,
        }
    }

    /// Builds every collaborator from `config`. Truncates the dump file.
    pub fn from_config(config: &Config, progress: Box<dyn ScanProgressReporter>) -> Result<Self> {
        let aggregator = EulaAggregator::new(
            RemoteResolver::from_config(&config.store)?,
            LocalScanner::new(&config.scan)?,
        );
        let llm = LlmClassifier::from_config(&config.llm)?;
        let dump = DumpWriter::create(&config.output.dump)?;
        Ok(Self::new(
            aggregator,
            llm,
            dump,
            pacer_from_millis(config.scan.delay_ms),
            progress,
        ))
    }

    pub fn llm_quota_exhausted(&self) -> bool {
        self.llm.quota_exhausted()
    }

    /// Discovers, classifies and dumps one package, returning its report row.
    pub fn process_package(&mut self, package: &Package) -> Result<ReportRow> {
        let candidates = self.aggregator.discover(package);
        let selected = aggregate::select(&candidates);
        let selected_text = selected.map(|c| c.text.as_str());

        let verdict = keyword::classify(selected_text);
        let outcome = self.llm.classify(selected_text);

        self.dump.append(&package.name, &candidates)?;

        tracing::info!(
            app_id = %package.app_id,
            name = %package.name,
            candidates = candidates.len(),
            keyword = %verdict,
            llm = outcome.status(),
            "package processed"
        );

        Ok(ReportRow {
            app_id: package.app_id.clone(),
            name: package.name.clone(),
            install_path: package.install_path.display().to_string(),
            eula_found: if candidates.is_empty() { "No" } else { "Yes" }.to_string(),
            selected_source: selected.map(|c| c.source.clone()).unwrap_or_default(),
            match_kind: selected
                .map(|c| c.match_kind.to_string())
                .unwrap_or_default(),
            keyword_scan: verdict.to_string(),
            assessment: outcome.status().to_string(),
            notes: outcome.error().to_string(),
        })
    }

    pub fn dump_path(&self) -> &Path {
        self.dump.path()
    }

    /// Processes `packages` in order, pausing between (not after) them.
    pub fn run(&mut self, packages: &[Package]) -> Result<Vec<ReportRow>> {
        let total = packages.len() as u64;
        self.progress.report(ScanProgressEvent::Discovered { total });

        let mut rows = Vec::with_capacity(packages.len());
        for (i, package) in packages.iter().enumerate() {
            if i > 0 {
                self.pacer.pause();
            }
            let row = self.process_package(package)?;
            self.progress.report(ScanProgressEvent::Package {
                n: i as u64 + 1,
                total,
                app_id: package.app_id.clone(),
                name: package.name.clone(),
                eula_found: row.eula_found == "Yes",
            });
            rows.push(row);
        }
        Ok(rows)
    }
}

/// Fails fast when the Steam installation is missing.
pub fn check_prerequisites(config: &Config) -> Result<()> {
    let steamapps = config.steam.path.join("steamapps");
    if !steamapps.is_dir() {
        bail!(
            "Steam library not found at {} (set steam.path or --steam-path)",
            steamapps.display()
        );
    }
    Ok(())
}

/// Enumerates installed packages, honouring `--limit`.
pub fn list_packages(config: &Config, limit: Option<usize>) -> Result<Vec<Package>> {
    check_prerequisites(config)?;
    let mut packages = library::discover_packages(&config.steam.path)?;
    if let Some(limit) = limit {
        packages.truncate(limit);
    }
    Ok(packages)
}

/// Runs a full scan and writes the report and dump files.
pub fn run_scan(
    config: &Config,
    options: &ScanOptions,
    progress: Box<dyn ScanProgressReporter>,
) -> Result<ScanSummary> {
    let format: ReportFormat = config.output.format.parse()?;
    let packages = list_packages(config, options.limit)?;
    let started = chrono::Utc::now();

    let mut session = ScanSession::from_config(config, progress)?;
    let rows = session.run(&packages)?;
    report::write_report(&config.output.report, format, &rows)?;

    let summary = ScanSummary {
        packages: rows.len(),
        with_eula: rows.iter().filter(|r| r.eula_found == "Yes").count(),
        detected: rows
            .iter()
            .filter(|r| r.keyword_scan.starts_with("Detected"))
            .count(),
        llm_quota_exhausted: session.llm_quota_exhausted(),
    };

    let elapsed = chrono::Utc::now() - started;
    print_summary(
        &summary,
        &config.output.report,
        session.dump_path(),
        elapsed.num_seconds(),
    );
    Ok(summary)
}

fn print_summary(summary: &ScanSummary, report: &Path, dump: &Path, elapsed_secs: i64) {
    println!("scan");
    println!("  packages: {}", summary.packages);
    println!("  eula found: {}", summary.with_eula);
    println!("  anti-cheat/DRM detected: {}", summary.detected);
    if summary.llm_quota_exhausted {
        println!("  llm: quota exceeded, later packages skipped");
    }
    println!("  report: {}", report.display());
    println!("  dump: {}", dump.display());
    println!("  elapsed: {}s", elapsed_secs);
    println!("ok");
}
