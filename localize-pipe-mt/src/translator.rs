//! Translation backend trait and prompt construction
//!
//! This module defines the `TranslationBackend` trait for provider abstraction,
//! so the orchestrator can drive a local Ollama daemon, the hosted Hugging Face
//! inference API or a mock without knowing their wire formats.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe_mt::{OllamaBackend, TranslationBackend, TranslationSettings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = OllamaBackend::from_settings(&TranslationSettings::default())?;
//!     let result = backend.request_translation("Settings", "en", "de").await?;
//!     println!("{}", result); // "Einstellungen"
//!     Ok(())
//! }
//! ```

use crate::error::MtResult;
use async_trait::async_trait;

/// Generic trait for generative translation backends
///
/// Implementations own the request/response format of one provider. Nothing
/// provider specific leaks past this boundary: callers only see the
/// translated text or an [`MtError`](crate::MtError) with a ready-to-show
/// message.
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// Translate a single text from source to target language
    ///
    /// # Arguments
    ///
    /// * `text` - Source text, placeholders and tags included
    /// * `source_code` - Backend language code of the source (e.g., "en")
    /// * `target_code` - Backend language code of the target (e.g., "pt-BR")
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The raw model output
    /// * `Err(MtError)` - If the request fails or the response is unusable
    async fn request_translation(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> MtResult<String>;

    /// Get the name of this translation provider
    ///
    /// Used for logging to identify which provider handled a translation.
    fn provider_name(&self) -> &str;

    /// Model identifier sent to the provider
    fn model(&self) -> &str;
}

/// Build the instruction prompt sent to generative backends
///
/// ```ignore
/// let prompt = build_prompt("Save", "en", "de");
/// assert!(prompt.starts_with("Translate from en to de."));
/// assert!(prompt.ends_with("Text: Save"));
/// ```
pub fn build_prompt(text: &str, source_code: &str, target_code: &str) -> String {
    [
        format!("Translate from {} to {}.", source_code, target_code),
        "Return only translated text.".to_string(),
        "Preserve placeholders exactly (e.g. %1$s, %d, {name}).".to_string(),
        "Preserve XML tags exactly.".to_string(),
        format!("Text: {}", text),
    ]
    .join("\n")
}
