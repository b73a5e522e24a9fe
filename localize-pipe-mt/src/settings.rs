//! Translation provider settings
//!
//! Settings deserialize from the `[translation]` table of the project config
//! file; every field has a default so a partial table is valid.

use crate::error::MtResult;
use crate::hugging_face::HuggingFaceBackend;
use crate::ollama::OllamaBackend;
use crate::translator::TranslationBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

pub const DEFAULT_OLLAMA_BASE_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "translategemma:4b";
pub const DEFAULT_HUGGING_FACE_BASE_URL: &str = "https://api-inference.huggingface.co";
pub const DEFAULT_HUGGING_FACE_MODEL: &str = "google/translategemma-4b-it";

/// Environment variable consulted when no Hugging Face token is configured
pub const HUGGING_FACE_TOKEN_ENV: &str = "LOCALIZE_PIPE_HF_TOKEN";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    #[default]
    Ollama,
    HuggingFace,
}

impl ProviderType {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderType::Ollama => "Ollama",
            ProviderType::HuggingFace => "Hugging Face",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ProviderType::Ollama => ProviderType::HuggingFace,
            ProviderType::HuggingFace => ProviderType::Ollama,
        }
    }
}

/// How Ollama should place model layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OllamaRuntime {
    /// Let Ollama decide
    #[default]
    Auto,
    CpuOnly,
    GpuPreferred,
}

impl OllamaRuntime {
    /// Value for the `num_gpu` request option, if any
    pub fn num_gpu(&self) -> Option<u32> {
        match self {
            OllamaRuntime::Auto => None,
            OllamaRuntime::CpuOnly => Some(0),
            OllamaRuntime::GpuPreferred => Some(999),
        }
    }
}

impl fmt::Display for OllamaRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OllamaRuntime::Auto => "Auto (Ollama decides)",
            OllamaRuntime::CpuOnly => "CPU only",
            OllamaRuntime::GpuPreferred => "GPU preferred",
        })
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationSettings {
    pub provider: ProviderType,
    pub source_locale: String,
    pub ollama_base_url: String,
    pub ollama_model: String,
    pub ollama_runtime: OllamaRuntime,
    pub hugging_face_base_url: String,
    pub hugging_face_model: String,
    pub hugging_face_token: String,
    pub temperature: f32,
    pub request_timeout_seconds: u64,
    /// Extra transport attempts after the first one
    pub max_retries: u32,
    pub remove_added_trailing_period: bool,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            provider: ProviderType::Ollama,
            source_locale: "en".to_string(),
            ollama_base_url: DEFAULT_OLLAMA_BASE_URL.to_string(),
            ollama_model: DEFAULT_OLLAMA_MODEL.to_string(),
            ollama_runtime: OllamaRuntime::Auto,
            hugging_face_base_url: DEFAULT_HUGGING_FACE_BASE_URL.to_string(),
            hugging_face_model: DEFAULT_HUGGING_FACE_MODEL.to_string(),
            hugging_face_token: String::new(),
            temperature: 0.1,
            request_timeout_seconds: 45,
            max_retries: 1,
            remove_added_trailing_period: true,
        }
    }
}

impl TranslationSettings {
    /// Model identifier of the selected provider
    pub fn active_model(&self) -> &str {
        match self.provider {
            ProviderType::Ollama => &self.ollama_model,
            ProviderType::HuggingFace => &self.hugging_face_model,
        }
    }

    /// Request URL of the selected provider
    pub fn active_endpoint(&self) -> String {
        match self.provider {
            ProviderType::Ollama => format!("{}/api/generate", self.ollama_base_url.trim_end_matches('/')),
            ProviderType::HuggingFace => format!(
                "{}/models/{}",
                self.hugging_face_base_url.trim_end_matches('/'),
                self.hugging_face_model
            ),
        }
    }

    pub fn has_hugging_face_token(&self) -> bool {
        !self.hugging_face_token.trim().is_empty()
    }

    /// Fill a blank Hugging Face token from `LOCALIZE_PIPE_HF_TOKEN`
    pub fn with_token_from_env(mut self) -> Self {
        if !self.has_hugging_face_token() {
            if let Ok(token) = std::env::var(HUGGING_FACE_TOKEN_ENV) {
                self.hugging_face_token = token.trim().to_string();
            }
        }
        self
    }

    /// Total transport attempts per validation attempt, never below one
    pub fn transport_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1).max(1)
    }

    /// Build the backend for the selected provider
    ///
    /// # Returns
    ///
    /// * `Ok(Arc<dyn TranslationBackend>)` - Ready-to-use backend
    /// * `Err(MtError::Config)` - If the HTTP client cannot be created
    pub fn build_backend(&self) -> MtResult<Arc<dyn TranslationBackend>> {
        Ok(match self.provider {
            ProviderType::Ollama => Arc::new(OllamaBackend::from_settings(self)?),
            ProviderType::HuggingFace => Arc::new(HuggingFaceBackend::from_settings(self)?),
        })
    }
}

impl fmt::Debug for TranslationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let token = if self.has_hugging_face_token() { "***" } else { "" };
        f.debug_struct("TranslationSettings")
            .field("provider", &self.provider)
            .field("source_locale", &self.source_locale)
            .field("ollama_base_url", &self.ollama_base_url)
            .field("ollama_model", &self.ollama_model)
            .field("ollama_runtime", &self.ollama_runtime)
            .field("hugging_face_base_url", &self.hugging_face_base_url)
            .field("hugging_face_model", &self.hugging_face_model)
            .field("hugging_face_token", &token)
            .field("temperature", &self.temperature)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("remove_added_trailing_period", &self.remove_added_trailing_period)
            .finish()
    }
}
