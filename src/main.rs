//! # eula-scan CLI
//!
//! The `eula-scan` binary locates the EULAs of installed Steam games and
//! classifies them for anti-cheat and privacy concerns.
//!
//! ## Usage
//!
//! ```bash
//! eula-scan --config ./config/eula-scan.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `eula-scan scan` | Scan every installed package, write report and dump |
//! | `eula-scan packages` | List installed packages |
//! | `eula-scan inspect <appid>` | Show every EULA candidate for one package |
//! | `eula-scan extract <file>` | Print the text extracted from one file |
//! | `eula-scan completions <shell>` | Generate shell completions |
//!
//! ## Examples
//!
//! ```bash
//! # Keyword scan only, no pauses, JSON report
//! eula-scan scan --no-llm --delay-ms 0 --format json --report report.json
//!
//! # Local files only, first 10 packages
//! eula-scan scan --offline --limit 10
//!
//! # A Steam library in a non-default location
//! eula-scan packages --steam-path /mnt/games/Steam
//! ```

use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};
use std::path::{Path, PathBuf};

use eula_scan::config::{self, Config};
use eula_scan::extract;
use eula_scan::inspect;
use eula_scan::logging;
use eula_scan::pipeline::{self, ScanOptions};
use eula_scan::progress::ProgressMode;

const DEFAULT_CONFIG: &str = "./config/eula-scan.toml";

/// eula-scan: find and classify the EULAs of installed Steam games.
///
/// Configuration is read from `./config/eula-scan.toml` when it exists,
/// otherwise built-in defaults are used. See `config/eula-scan.example.toml`.
#[derive(Parser)]
#[command(
    name = "eula-scan",
    about = "Find and classify the EULAs of locally installed Steam games",
    version,
    long_about = "eula-scan gathers each installed game's end-user license agreement from the \
    Steam store and from legal files in the install directory, flags anti-cheat, DRM and \
    privacy-sensitive terms, and writes a report plus a raw-text dump."
)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// A path given here must exist. Without it, `./config/eula-scan.toml`
    /// is used when present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (`-v` info, `-vv` debug). `RUST_LOG` overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand)]
enum Commands {
    /// Scan every installed package.
    ///
    /// For each package, fetches the store EULA, scans the install
    /// directory for legal files, classifies the best candidate and
    /// appends every candidate to the dump. The report is written at
    /// the end of the run.
    Scan(ScanArgs),

    /// List installed packages.
    Packages {
        #[command(flatten)]
        library: LibraryArgs,

        /// Maximum number of packages to list.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show every EULA candidate for one package.
    ///
    /// Runs discovery only: nothing is written and the LLM is not called.
    Inspect {
        /// Steam app id.
        app_id: String,

        #[command(flatten)]
        library: LibraryArgs,

        /// Skip the Steam store and only look at local files.
        #[arg(long)]
        offline: bool,
    },

    /// Print the text extracted from a single file.
    Extract {
        /// File to extract (txt, pdf, rtf, docx, html, htm).
        file: PathBuf,
    },

    /// Generate shell completions on stdout.
    Completions {
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args)]
struct LibraryArgs {
    /// Steam installation directory (overrides `steam.path`).
    #[arg(long)]
    steam_path: Option<PathBuf>,
}

#[derive(Args)]
struct ScanArgs {
    #[command(flatten)]
    library: LibraryArgs,

    /// Skip the Steam store and only look at local files.
    #[arg(long)]
    offline: bool,

    /// Disable the LLM assessment.
    #[arg(long)]
    no_llm: bool,

    /// Pause between packages in milliseconds (overrides `scan.delay_ms`).
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Report file (overrides `output.report`).
    #[arg(long)]
    report: Option<PathBuf>,

    /// Dump file (overrides `output.dump`).
    #[arg(long)]
    dump: Option<PathBuf>,

    /// Report format: `csv` or `json` (overrides `output.format`).
    #[arg(long)]
    format: Option<String>,

    /// Maximum number of packages to process.
    #[arg(long)]
    limit: Option<usize>,

    /// Progress output: `off`, `human` or `json`. Defaults to human on a TTY.
    #[arg(long)]
    progress: Option<String>,
}

fn load(config: Option<&Path>) -> Result<Config> {
    match config {
        Some(path) => config::load_or_default(path, true),
        None => config::load_or_default(Path::new(DEFAULT_CONFIG), false),
    }
}

fn apply_library(cfg: &mut Config, library: &LibraryArgs) {
    if let Some(path) = &library.steam_path {
        cfg.steam.path = path.clone();
    }
}

fn apply_scan_overrides(cfg: &mut Config, args: &ScanArgs) -> Result<()> {
    apply_library(cfg, &args.library);
    if args.offline {
        cfg.store.enabled = false;
    }
    if args.no_llm {
        cfg.llm.provider = "disabled".to_string();
    }
    if let Some(delay) = args.delay_ms {
        cfg.scan.delay_ms = delay;
    }
    if let Some(report) = &args.report {
        cfg.output.report = report.clone();
    }
    if let Some(dump) = &args.dump {
        cfg.output.dump = dump.clone();
    }
    if let Some(format) = &args.format {
        cfg.output.format = format.clone();
    }
    cfg.validate()
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);

    // Commands that don't require config
    match &cli.command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(*shell, &mut cmd, "eula-scan", &mut std::io::stdout().lock());
            return Ok(());
        }
        Commands::Extract { file } => {
            let text = extract::try_extract_file(file, u64::MAX)?;
            println!("{}", text);
            return Ok(());
        }
        _ => {}
    }

    let mut cfg = load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan(args) => {
            apply_scan_overrides(&mut cfg, &args)?;
            let progress = ProgressMode::from_flag(args.progress.as_deref())?;
            let options = ScanOptions { limit: args.limit };
            pipeline::run_scan(&cfg, &options, progress.reporter())?;
        }
        Commands::Packages { library, limit } => {
            apply_library(&mut cfg, &library);
            inspect::list_packages(&cfg, limit)?;
        }
        Commands::Inspect {
            app_id,
            library,
            offline,
        } => {
            apply_library(&mut cfg, &library);
            if offline {
                cfg.store.enabled = false;
            }
            inspect::run_inspect(&cfg, &app_id)?;
        }
        Commands::Extract { .. } | Commands::Completions { .. } => {
            // Handled above (before config loading)
            unreachable!()
        }
    }

    Ok(())
}
