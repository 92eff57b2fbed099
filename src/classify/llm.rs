//! LLM-backed privacy assessment.
//!
//! [`LlmClassifier`] truncates the selected EULA to `llm.max_chars`
//! characters, sends it to a [`CompletionProvider`], and owns the run-scoped
//! quota latch: once a call fails for quota reasons, every later package is
//! reported as [`LlmOutcome::Skipped`] without another request.

use serde_json::json;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;

const PROMPT_PREAMBLE: &str = concat!(
    "You are a privacy expert. Analyze the following End User License Agreement (EULA) ",
    "for privacy-related red flags, such as data collection, third-party sharing, ",
    "user tracking, or invasive permissions. ",
    "Respond with either 'Privacy risk' or 'No issues', then a short explanation. ",
    "EULA:\n\n",
);

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("quota exceeded: {0}")]
    Quota(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl LlmError {
    /// Quota exhaustion, either flagged by the provider or mentioned in the
    /// error text.
    pub fn is_quota(&self) -> bool {
        matches!(self, LlmError::Quota(_)) || self.to_string().to_lowercase().contains("quota")
    }
}

/// Something that turns a prompt into a completion.
pub trait CompletionProvider {
    fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// OpenAI legacy completions endpoint (`/v1/completions`).
pub struct OpenAiCompletions {
    client: reqwest::blocking::Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
}

impl OpenAiCompletions {
    pub fn new(config: &LlmConfig, api_key: &str) -> Result<Self, LlmError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: api_key.to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }
}

impl CompletionProvider for OpenAiCompletions {
    fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.model,
            "prompt": prompt,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
        });

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().unwrap_or_default();
            if status.as_u16() == 429 && body_text.contains("insufficient_quota") {
                return Err(LlmError::Quota(body_text));
            }
            return Err(LlmError::Api {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let json: serde_json::Value = response.json()?;
        parse_completion(&json)
    }
}

/// Extracts `choices[0].text` from a completions response.
fn parse_completion(json: &serde_json::Value) -> Result<String, LlmError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("text"))
        .and_then(|t| t.as_str())
        .map(|t| t.trim().to_string())
        .ok_or_else(|| LlmError::Malformed("missing choices[0].text".to_string()))
}

/// Result of the LLM path for one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LlmOutcome {
    /// Free-text verdict from the model.
    Assessment(String),
    NoDocument,
    Disabled,
    MissingKey,
    /// Not attempted because quota ran out earlier in the run.
    Skipped,
    QuotaExceeded(String),
    Failed(String),
}

impl LlmOutcome {
    /// Value for the report's assessment column.
    pub fn status(&self) -> &str {
        match self {
            LlmOutcome::Assessment(text) => text,
            LlmOutcome::NoDocument => "No EULA found",
            LlmOutcome::Disabled => "Skipped (LLM disabled)",
            LlmOutcome::MissingKey => "Skipped (no API key)",
            LlmOutcome::Skipped => "Skipped",
            LlmOutcome::QuotaExceeded(_) => "Quota exceeded",
            LlmOutcome::Failed(_) => "AI analysis failed",
        }
    }

    /// Value for the report's error column.
    pub fn error(&self) -> &str {
        match self {
            LlmOutcome::QuotaExceeded(e) | LlmOutcome::Failed(e) => e,
            _ => "",
        }
    }
}

enum Backend {
    Disabled,
    MissingKey,
    Provider(Box<dyn CompletionProvider>),
}

/// Run-scoped LLM classifier.
pub struct LlmClassifier {
    backend: Backend,
    max_chars: usize,
    quota_exhausted: bool,
}

impl LlmClassifier {
    /// Builds the OpenAI-backed classifier, or a disabled one when the
    /// provider is `"disabled"` or no API key is available.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let backend = if !config.is_enabled() {
            Backend::Disabled
        } else {
            match config.usable_api_key() {
                Some(key) => Backend::Provider(Box::new(OpenAiCompletions::new(config, key)?)),
                None => {
                    tracing::warn!(
                        "OpenAI API key not set; set OPENAI_API_KEY or llm.api_key \
                         to enable AI privacy checking"
                    );
                    Backend::MissingKey
                }
            }
        };
        Ok(Self {
            backend,
            max_chars: config.max_chars,
            quota_exhausted: false,
        })
    }

    pub fn with_provider(provider: Box<dyn CompletionProvider>, max_chars: usize) -> Self {
        Self {
            backend: Backend::Provider(provider),
            max_chars,
            quota_exhausted: false,
        }
    }

    pub fn disabled() -> Self {
        Self {
            backend: Backend::Disabled,
            max_chars: 0,
            quota_exhausted: false,
        }
    }

    pub fn quota_exhausted(&self) -> bool {
        self.quota_exhausted
    }

    /// Builds the prompt from the first `max_chars` characters of `text`.
    pub fn prompt(&self, text: &str) -> String {
        let truncated: String = text.chars().take(self.max_chars).collect();
        format!("{}{}", PROMPT_PREAMBLE, truncated)
    }

    pub fn classify(&mut self, text: Option<&str>) -> LlmOutcome {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return LlmOutcome::NoDocument;
        };
        let provider = match &self.backend {
            Backend::Disabled => return LlmOutcome::Disabled,
            Backend::MissingKey => return LlmOutcome::MissingKey,
            Backend::Provider(provider) => provider,
        };
        if self.quota_exhausted {
            return LlmOutcome::Skipped;
        }

        match provider.complete(&self.prompt(text)) {
            Ok(answer) => LlmOutcome::Assessment(answer),
            Err(e) if e.is_quota() => {
                tracing::warn!(
                    "OpenAI quota exceeded; skipping AI analysis for remaining packages"
                );
                self.quota_exhausted = true;
                LlmOutcome::QuotaExceeded(e.to_string())
            }
            Err(e) => {
                tracing::warn!("AI analysis failed: {}", e);
                LlmOutcome::Failed(e.to_string())
            }
        }
    }
}
