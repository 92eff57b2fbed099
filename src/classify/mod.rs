//! Privacy classification of the selected EULA text.
//!
//! | Module | Classifier |
//! |--------|------------|
//! | [`keyword`] | static anti-cheat/DRM names and privacy vocabulary |
//! | [`llm`] | completion-model assessment with a run-scoped quota latch |

pub mod keyword;
pub mod llm;

pub use keyword::KeywordVerdict;
pub use llm::{CompletionProvider, LlmClassifier, LlmError, LlmOutcome, OpenAiCompletions};
