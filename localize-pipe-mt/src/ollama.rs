//! Ollama backend for local TranslateGemma models
//!
//! Talks to a local Ollama daemon through its non-streaming
//! `/api/generate` endpoint.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe_mt::{OllamaBackend, TranslationBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = OllamaBackend::new("http://127.0.0.1:11434", "translategemma:4b", 45)?;
//!     let text = backend.request_translation("Settings", "en", "tr").await?;
//!     println!("{}", text); // "Ayarlar"
//!     Ok(())
//! }
//! ```

use crate::error::{MtError, MtResult};
use crate::settings::{DEFAULT_OLLAMA_BASE_URL, OllamaRuntime, TranslationSettings};
use crate::translator::{TranslationBackend, build_prompt};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

/// Blank URLs fall back to the local default; trailing slashes are dropped
pub fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    let base = if trimmed.is_empty() {
        DEFAULT_OLLAMA_BASE_URL
    } else {
        trimmed
    };
    base.trim_end_matches('/').to_string()
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Pull the generated text out of a raw `/api/generate` response
///
/// A missing `response` field yields an empty string. Trailing newlines
/// are trimmed.
pub fn extract_response_text(raw_json: &str) -> Result<String, serde_json::Error> {
    let parsed: GenerateResponse = serde_json::from_str(raw_json)?;
    Ok(parsed.response.trim_end_matches(['\n', '\r']).to_string())
}

/// Generation options for a request
pub fn build_options(temperature: f32, runtime: OllamaRuntime) -> Value {
    let mut options = json!({ "temperature": f64::from(temperature) });
    if let Some(num_gpu) = runtime.num_gpu() {
        options["num_gpu"] = json!(num_gpu);
    }
    options
}

fn extract_json_error(body: Option<&str>) -> Option<String> {
    let body = body?.trim();
    if body.is_empty() {
        return None;
    }
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = parsed.get("error")?.as_str()?.trim();
    (!error.is_empty()).then(|| error.to_string())
}

/// Operator-facing message for a non-2xx `/api/generate` response
///
/// Missing models get an actionable `ollama pull` hint.
pub fn format_failure_message(model: &str, status: u16, body: Option<&str>) -> String {
    let remote_error = extract_json_error(body);
    let normalized = remote_error.as_deref().unwrap_or_default().to_lowercase();
    let looks_like_missing_model = status == 404
        || (normalized.contains("model") && normalized.contains("not found"))
        || normalized.contains("try pulling it first");

    if looks_like_missing_model {
        let suffix = remote_error
            .map(|error| format!(" ({})", error))
            .unwrap_or_default();
        return format!(
            "Ollama model '{}' is not available locally. Run `ollama pull {}` and retry{}",
            model, model, suffix
        );
    }

    match remote_error {
        Some(error) => format!("Ollama request failed (HTTP {}): {}", status, error),
        None => format!("Ollama request failed (HTTP {})", status),
    }
}

/// Ollama `/api/generate` backend
#[derive(Debug, Clone)]
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: f32,
    runtime: OllamaRuntime,
}

impl OllamaBackend {
    /// Create a backend for `model` served at `base_url`
    ///
    /// # Arguments
    ///
    /// * `base_url` - Daemon URL; blank means `http://127.0.0.1:11434`
    /// * `model` - Model tag (e.g., "translategemma:4b")
    /// * `timeout_secs` - Connect and request timeout
    ///
    /// # Returns
    ///
    /// * `Ok(Self)` - New backend instance
    /// * `Err(MtError)` - If the HTTP client cannot be created
    pub fn new(base_url: &str, model: impl Into<String>, timeout_secs: u64) -> MtResult<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| MtError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
            model: model.into(),
            temperature: 0.1,
            runtime: OllamaRuntime::Auto,
        })
    }

    /// Create a backend from the Ollama fields of `settings`
    pub fn from_settings(settings: &TranslationSettings) -> MtResult<Self> {
        Ok(Self::new(
            &settings.ollama_base_url,
            settings.ollama_model.trim(),
            settings.request_timeout_seconds,
        )?
        .with_temperature(settings.temperature)
        .with_runtime(settings.ollama_runtime))
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_runtime(mut self, runtime: OllamaRuntime) -> Self {
        self.runtime = runtime;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TranslationBackend for OllamaBackend {
    async fn request_translation(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> MtResult<String> {
        let body = json!({
            "model": self.model,
            "stream": false,
            "prompt": build_prompt(text, source_code, target_code),
            "options": build_options(self.temperature, self.runtime),
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!("Ollama is unreachable at {}: {}", self.base_url, e);
                MtError::Unreachable(format!("Could not reach Ollama at {}: {}", self.base_url, e))
            })?;

        let status = response.status();
        let raw = response.text().await.map_err(|e| {
            MtError::Unreachable(format!("Could not reach Ollama at {}: {}", self.base_url, e))
        })?;

        if !status.is_success() {
            let message = format_failure_message(&self.model, status.as_u16(), Some(&raw));
            warn!("Ollama request failed: {}", message);
            return Err(MtError::Provider(message));
        }
        if raw.trim().is_empty() {
            return Err(MtError::InvalidResponse(
                "Ollama returned an empty response body".to_string(),
            ));
        }

        extract_response_text(&raw).map_err(|e| {
            warn!("Failed to parse Ollama response: {}", e);
            MtError::InvalidResponse(format!("Failed to parse Ollama response: {}", e))
        })
    }

    fn provider_name(&self) -> &str {
        "Ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use crate::validation::{ValidationError, validate};
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    // ========== Recorded Response Tests ==========

    const TR_SETTINGS: &str =
        include_str!("../tests/fixtures/ollama/translategemma_4b/en_tr_settings.raw.json");
    const DE_WELCOME: &str =
        include_str!("../tests/fixtures/ollama/translategemma_4b/en_de_welcome_placeholder.raw.json");
    const FR_BOLD_SAVE: &str =
        include_str!("../tests/fixtures/ollama/translategemma_4b/en_fr_bold_save.raw.json");

    #[test]
    fn test_extracts_recorded_responses() {
        assert_eq!(extract_response_text(TR_SETTINGS).unwrap(), "Ayarlar");
        assert_eq!(extract_response_text(DE_WELCOME).unwrap(), "Willkommen, %1$s!");
        assert_eq!(
            extract_response_text(FR_BOLD_SAVE).unwrap(),
            "<b >Sauvegarder</b > maintenant"
        );
    }

    #[test]
    fn test_recorded_placeholder_output_validates() {
        let translated = extract_response_text(DE_WELCOME).unwrap();
        assert!(validate("Welcome, %1$s!", &translated).is_valid);
    }

    #[test]
    fn test_recorded_tag_mutation_is_detected() {
        let translated = extract_response_text(FR_BOLD_SAVE).unwrap();
        let result = validate("<b>Save</b> now", &translated);
        assert!(result.contains(ValidationError::TagsChanged));
    }

    #[test]
    fn test_missing_response_field_is_empty() {
        assert_eq!(extract_response_text(r#"{"done":true}"#).unwrap(), "");
        assert!(extract_response_text("[1,2]").is_err());
    }

    // ========== Option Tests ==========

    #[test]
    fn test_options_per_runtime() {
        let auto = build_options(0.2, OllamaRuntime::Auto);
        assert!((auto["temperature"].as_f64().unwrap() - 0.2).abs() < 0.0001);
        assert!(auto.get("num_gpu").is_none());

        assert_eq!(build_options(0.2, OllamaRuntime::CpuOnly)["num_gpu"], 0);
        assert_eq!(build_options(0.2, OllamaRuntime::GpuPreferred)["num_gpu"], 999);
    }

    // ========== Failure Message Tests ==========

    #[test]
    fn test_missing_model_message() {
        let message = format_failure_message(
            "translategemma:12b",
            404,
            Some(r#"{"error":"model 'translategemma:12b' not found, try pulling it first"}"#),
        );
        assert!(message.contains("Ollama model 'translategemma:12b' is not available locally"));
        assert!(message.contains("ollama pull translategemma:12b"));
        assert!(message.ends_with("(model 'translategemma:12b' not found, try pulling it first)"));
    }

    #[test]
    fn test_generic_failure_messages() {
        assert_eq!(
            format_failure_message("translategemma:4b", 500, Some(r#"{"error":"backend overload"}"#)),
            "Ollama request failed (HTTP 500): backend overload"
        );
        assert_eq!(
            format_failure_message("translategemma:4b", 503, None),
            "Ollama request failed (HTTP 503)"
        );
        assert_eq!(
            format_failure_message("m", 404, None),
            "Ollama model 'm' is not available locally. Run `ollama pull m` and retry"
        );
    }

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("  "), "http://127.0.0.1:11434");
        assert_eq!(normalize_base_url("http://gpu-box:11434/"), "http://gpu-box:11434");
    }

    // ========== HTTP Tests ==========

    #[tokio::test]
    async fn test_request_translation_against_server() {
        let seen = Arc::new(Mutex::new(None::<Value>));
        let captured = seen.clone();
        let router = Router::new().route(
            "/api/generate",
            post(move |Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    *captured.lock().unwrap() = Some(body);
                    Json(json!({ "response": "Einstellungen\n", "done": true }))
                }
            }),
        );
        let base = spawn_server(router).await;

        let backend = OllamaBackend::new(&format!("{}/", base), "translategemma:4b", 5)
            .unwrap()
            .with_runtime(OllamaRuntime::CpuOnly);
        let text = backend.request_translation("Settings", "en", "de").await.unwrap();
        assert_eq!(text, "Einstellungen");

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["model"], "translategemma:4b");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["num_gpu"], 0);
        assert!(body["prompt"].as_str().unwrap().ends_with("Text: Settings"));
    }

    #[tokio::test]
    async fn test_missing_model_from_server() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "error": "model \"translategemma:27b\" not found, try pulling it first" })),
                )
            }),
        );
        let base = spawn_server(router).await;

        let backend = OllamaBackend::new(&base, "translategemma:27b", 5).unwrap();
        let err = backend.request_translation("Save", "en", "de").await.unwrap_err();
        assert!(matches!(err, MtError::Provider(_)));
        assert!(err.to_string().contains("Run `ollama pull translategemma:27b`"));
    }

    #[tokio::test]
    async fn test_unreachable_daemon() {
        let base = closed_port_url().await;
        let backend = OllamaBackend::new(&base, "translategemma:4b", 2).unwrap();
        let err = backend.request_translation("Save", "en", "de").await.unwrap_err();
        assert!(matches!(err, MtError::Unreachable(_)));
        assert!(err.to_string().starts_with(&format!("Could not reach Ollama at {}", base)));
    }
}
