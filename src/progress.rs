//! Scan progress reporting.
//!
//! Reports per-package progress during `eula-scan scan` so users can see how
//! far a long run has got. Progress is emitted on **stderr** so stdout stays
//! free for command output.

use std::io::Write;

/// A single progress event for a scan.
#[derive(Clone, Debug)]
pub enum ScanProgressEvent {
    /// Packages were enumerated; `total` will be processed.
    Discovered { total: u64 },
    /// Package `n` of `total` finished.
    Package {
        n: u64,
        total: u64,
        app_id: String,
        name: String,
        eula_found: bool,
    },
}

/// Reports scan progress. Implementations write to stderr (human or JSON).
pub trait ScanProgressReporter {
    /// Emit a progress event. Called from the scan pipeline.
    fn report(&self, event: ScanProgressEvent);
}

/// Human-friendly progress on stderr: "scan  12 / 1,024  Portal 2 (620)  eula found".
pub struct StderrProgress;

impl ScanProgressReporter for StderrProgress {
    fn report(&self, event: ScanProgressEvent) {
        let line = match &event {
            ScanProgressEvent::Discovered { total } => {
                format!("scan  found {} installed packages\n", format_number(*total))
            }
            ScanProgressEvent::Package {
                n,
                total,
                app_id,
                name,
                eula_found,
            } => format!(
                "scan  {} / {}  {} ({})  {}\n",
                format_number(*n),
                format_number(*total),
                name,
                app_id,
                if *eula_found { "eula found" } else { "no eula" }
            ),
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ScanProgressReporter for JsonProgress {
    fn report(&self, event: ScanProgressEvent) {
        let obj = match &event {
            ScanProgressEvent::Discovered { total } => serde_json::json!({
                "event": "progress",
                "phase": "discovered",
                "total": total
            }),
            ScanProgressEvent::Package {
                n,
                total,
                app_id,
                name,
                eula_found,
            } => serde_json::json!({
                "event": "progress",
                "phase": "package",
                "n": n,
                "total": total,
                "app_id": app_id,
                "name": name,
                "eula_found": eula_found
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ScanProgressReporter for NoProgress {
    fn report(&self, _event: ScanProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    /// Parses a `--progress` value; `None` falls back to the TTY default.
    pub fn from_flag(value: Option<&str>) -> anyhow::Result<Self> {
        match value {
            None => Ok(Self::default_for_tty()),
            Some("off") => Ok(ProgressMode::Off),
            Some("human") => Ok(ProgressMode::Human),
            Some("json") => Ok(ProgressMode::Json),
            Some(other) => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human or json.",
                other
            ),
        }
    }

    /// Build a reporter for this mode. Caller passes it to the pipeline.
    pub fn reporter(&self) -> Box<dyn ScanProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
