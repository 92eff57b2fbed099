//! # eula-scan
//!
//! Finds the end-user license agreements of locally installed Steam games
//! and flags the ones that mention anti-cheat, DRM or privacy-sensitive
//! data handling.
//!
//! For every installed package the scanner gathers candidate documents from
//! the Steam store (API first, store page second) and from legal-looking
//! files in the install directory, picks the best one, runs a keyword scan
//! and an optional LLM assessment, and writes a report plus a raw-text dump.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────────────┐   ┌────────────┐   ┌──────────────┐
//! │ Library  │──▶│ Aggregator         │──▶│ Classifier │──▶│ Report/Dump  │
//! │ VDF/ACF  │   │ Remote → Local     │   │ Keyword+LLM│   │ CSV/JSON/txt │
//! └──────────┘   └────────────────────┘   └────────────┘   └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! eula-scan packages                 # list installed games
//! eula-scan inspect 620              # show every EULA candidate for one game
//! eula-scan scan --no-llm            # keyword scan only
//! eula-scan scan --format json       # JSON report instead of CSV
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`library`] | Steam library and app manifest discovery |
//! | [`matcher`] | Game-name normalization and matching |
//! | [`extract`] | Text extraction (txt, pdf, rtf, docx, html) |
//! | [`local_scan`] | Install-directory candidate scanner |
//! | [`remote`] | Store API and store page resolver |
//! | [`aggregate`] | Candidate ordering and selection |
//! | [`classify`] | Keyword and LLM classifiers |
//! | [`dump`] | Raw-text provenance dump |
//! | [`report`] | CSV/JSON report writer |
//! | [`pipeline`] | Scan orchestration and pacing |
//! | [`inspect`] | Read-only `packages`/`inspect` views |
//! | [`progress`] | Progress reporting on stderr |
//! | [`logging`] | `tracing` subscriber setup |

pub mod aggregate;
pub mod classify;
pub mod config;
pub mod dump;
pub mod extract;
pub mod inspect;
pub mod library;
pub mod local_scan;
pub mod logging;
pub mod matcher;
pub mod models;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod report;
