//! TOML configuration.
//!
//! A [`Config`] is built once at startup (from file or defaults) and passed by
//! reference into every component constructor. The only environment lookup is
//! `OPENAI_API_KEY`, read by [`load_config`] / [`Config::resolve_api_key`].

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub steam: SteamConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SteamConfig {
    #[serde(default = "default_steam_path")]
    pub path: PathBuf,
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            path: default_steam_path(),
        }
    }
}

#[cfg(windows)]
fn default_steam_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files (x86)\Steam")
}

#[cfg(not(windows))]
fn default_steam_path() -> PathBuf {
    match std::env::var_os("HOME") {
        Some(home) => PathBuf::from(home).join(".steam").join("steam"),
        None => PathBuf::from(".steam/steam"),
    }
}

/// Steam storefront endpoints used by the remote resolver.
#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_page_url")]
    pub page_url: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_url: default_api_url(),
            page_url: default_page_url(),
            country: default_country(),
            language: default_language(),
            timeout_secs: default_store_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

fn default_true() -> bool {
    true
}
fn default_api_url() -> String {
    "https://store.steampowered.com/api/appdetails".to_string()
}
fn default_page_url() -> String {
    "https://store.steampowered.com/app".to_string()
}
fn default_country() -> String {
    "us".to_string()
}
fn default_language() -> String {
    "en".to_string()
}
fn default_store_timeout() -> u64 {
    10
}
fn default_user_agent() -> String {
    format!("eula-scan/{}", env!("CARGO_PKG_VERSION"))
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScanConfig {
    /// Local files larger than this are not read.
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
    /// Pause between packages, in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: default_max_file_bytes(),
            delay_ms: default_delay_ms(),
        }
    }
}

fn default_max_file_bytes() -> u64 {
    20 * 1024 * 1024
}
fn default_delay_ms() -> u64 {
    2000
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_llm_url")]
    pub api_url: String,
    /// Characters of EULA text sent with the prompt.
    #[serde(default = "default_max_chars")]
    pub max_chars: usize,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default)]
    pub temperature: f32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            api_url: default_llm_url(),
            max_chars: default_max_chars(),
            max_tokens: default_max_tokens(),
            temperature: 0.0,
            timeout_secs: default_llm_timeout(),
            api_key: None,
        }
    }
}

fn default_provider() -> String {
    "openai".to_string()
}
fn default_model() -> String {
    "gpt-3.5-turbo-instruct".to_string()
}
fn default_llm_url() -> String {
    "https://api.openai.com/v1/completions".to_string()
}
fn default_max_chars() -> usize {
    4000
}
fn default_max_tokens() -> u32 {
    300
}
fn default_llm_timeout() -> u64 {
    30
}

impl LlmConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    /// The configured key, unless it is blank or the placeholder text.
    pub fn usable_api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty() && *k != "YOUR_OPENAI_API_KEY_HERE")
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    #[serde(default = "default_report")]
    pub report: PathBuf,
    #[serde(default = "default_dump")]
    pub dump: PathBuf,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report: default_report(),
            dump: default_dump(),
            format: default_format(),
        }
    }
}

fn default_report() -> PathBuf {
    PathBuf::from("steam_eula_privacy_report.csv")
}
fn default_dump() -> PathBuf {
    PathBuf::from("eula_dump.txt")
}
fn default_format() -> String {
    "csv".to_string()
}

impl Config {
    /// Fills `llm.api_key` from `OPENAI_API_KEY` when the environment has one.
    pub fn resolve_api_key(&mut self) {
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if !key.trim().is_empty() {
                self.llm.api_key = Some(key);
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.store.timeout_secs == 0 {
            bail!("store.timeout_secs must be > 0");
        }
        if self.llm.max_chars == 0 {
            bail!("llm.max_chars must be > 0");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be in [0.0, 2.0]");
        }
        match self.llm.provider.as_str() {
            "disabled" | "openai" => {}
            other => bail!(
                "Unknown llm provider: '{}'. Must be disabled or openai.",
                other
            ),
        }
        match self.output.format.as_str() {
            "csv" | "json" => {}
            other => bail!("Unknown output format: '{}'. Must be csv or json.", other),
        }
        Ok(())
    }
}

/// Parses a config file, applies the environment API key and validates.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let mut config: Config =
        toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.resolve_api_key();
    config.validate()?;
    Ok(config)
}

/// Loads `path` if it exists; a missing file falls back to defaults unless
/// `required` is set.
pub fn load_or_default(path: &Path, required: bool) -> Result<Config> {
    if path.exists() || required {
        return load_config(path);
    }
    let mut config = Config::default();
    config.resolve_api_key();
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert!(config.store.enabled);
        assert_eq!(config.llm.max_chars, 4000);
        assert_eq!(config.llm.max_tokens, 300);
        assert_eq!(config.scan.delay_ms, 2000);
        assert_eq!(config.output.format, "csv");
        config.validate().unwrap();
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config: Config = toml::from_str(
            r#"
[store]
enabled = false

[llm]
provider = "disabled"
"#,
        )
        .unwrap();
        assert!(!config.store.enabled);
        assert_eq!(config.store.country, "us");
        assert!(!config.llm.is_enabled());
    }

    #[test]
    fn unknown_provider_rejected() {
        let mut config = Config::default();
        config.llm.provider = "bard".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn unknown_format_rejected() {
        let mut config = Config::default();
        config.output.format = "xlsx".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn placeholder_key_is_unusable() {
        let mut llm = LlmConfig::default();
        llm.api_key = Some("YOUR_OPENAI_API_KEY_HERE".to_string());
        assert!(llm.usable_api_key().is_none());
        llm.api_key = Some("  ".to_string());
        assert!(llm.usable_api_key().is_none());
        llm.api_key = Some("sk-test".to_string());
        assert_eq!(llm.usable_api_key(), Some("sk-test"));
    }

    #[test]
    fn missing_optional_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_or_default(&path, false).is_ok());
        assert!(load_or_default(&path, true).is_err());
    }
}
