//! Machine translation support for LocalizePipe
//!
//! This crate turns scanned rows into validated translation proposals:
//!
//! 1. **Mapping** - resolve each row's locale tag to a backend language code
//! 2. **Translation** - call a generative backend (local Ollama or hosted
//!    Hugging Face) with bounded transport retries
//! 3. **Validation** - reject output that changed placeholders or tags, is
//!    blank, or would break the XML, retrying once before giving up
//!
//! # Workflow Example
//!
//! ```ignore
//! use localize_pipe::{CancellationToken, FilesystemLayout, ScanOptions, StringsXmlScanner};
//! use localize_pipe_mt::{TranslationOrchestrator, TranslationSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let token = CancellationToken::new();
//!     let scanner = StringsXmlScanner::new(FilesystemLayout::new("."));
//!     let rows = scanner.scan(&ScanOptions::default(), &token)?.rows;
//!
//!     let settings = TranslationSettings::default();
//!     let orchestrator = TranslationOrchestrator::new(settings.build_backend()?, settings);
//!     let translated = orchestrator.translate_rows(&rows, |_, _| {}, &token).await?;
//!
//!     for row in translated {
//!         println!("{} [{}] {:?}", row.key, row.locale_tag, row.proposed_text);
//!     }
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod hugging_face;
pub mod language;
pub mod mock;
pub mod model_check;
pub mod ollama;
pub mod orchestrator;
pub mod settings;
pub mod sizing;
pub mod translator;
pub mod validation;

#[cfg(test)]
mod test_support;

// Re-export main types for convenient access
pub use error::{MtError, MtResult};
pub use hugging_face::HuggingFaceBackend;
pub use language::{supported_locale_tags, to_backend_code};
pub use mock::{MockBackend, MockMode};
pub use model_check::{
    ModelCheckResult, ModelCheckStatus, PullProgress, PullResult, PullStatus, check_model,
    is_model_available, pull_model,
};
pub use ollama::OllamaBackend;
pub use orchestrator::TranslationOrchestrator;
pub use settings::{OllamaRuntime, ProviderType, TranslationSettings};
pub use sizing::{ModelSize, recommended_model_id, recommended_size, size_for_model_id};
pub use translator::{TranslationBackend, build_prompt};
pub use validation::{ValidationError, ValidationResult, validate};
