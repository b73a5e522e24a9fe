//! Hugging Face inference API backend
//!
//! The token is read from settings (or `LOCALIZE_PIPE_HF_TOKEN`) and sent as
//! a bearer token. Anonymous requests are allowed when no token is set.

use crate::error::{MtError, MtResult};
use crate::settings::{DEFAULT_HUGGING_FACE_BASE_URL, TranslationSettings};
use crate::translator::{TranslationBackend, build_prompt};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::warn;

/// Interpret a Hugging Face inference response body
///
/// The API answers with an array of generations, a single object, or an
/// object carrying an `error` field. Error payloads are surfaced verbatim.
pub fn parse_response(raw: &str) -> MtResult<String> {
    let parsed: Value = serde_json::from_str(raw).map_err(|e| {
        warn!("Failed to parse Hugging Face response: {}", e);
        MtError::InvalidResponse(format!("Failed to parse Hugging Face response: {}", e))
    })?;

    let non_blank = |value: Option<&Value>| {
        value
            .and_then(Value::as_str)
            .filter(|text| !text.trim().is_empty())
            .map(str::to_string)
    };

    match &parsed {
        Value::Array(items) if !items.is_empty() => {
            non_blank(items[0].get("generated_text")).ok_or_else(|| {
                MtError::InvalidResponse("Unexpected Hugging Face array response".to_string())
            })
        }
        Value::Object(object) => {
            if let Some(error) = non_blank(object.get("error")) {
                return Err(MtError::Provider(error));
            }
            non_blank(object.get("generated_text"))
                .or_else(|| non_blank(object.get("translation_text")))
                .ok_or_else(|| {
                    MtError::InvalidResponse("Unexpected Hugging Face response format".to_string())
                })
        }
        _ => Err(MtError::InvalidResponse(
            "Unexpected Hugging Face response type".to_string(),
        )),
    }
}

/// Hugging Face `models/{model}` inference backend
#[derive(Clone)]
pub struct HuggingFaceBackend {
    client: reqwest::Client,
    base_url: String,
    model: String,
    token: String,
}

impl HuggingFaceBackend {
    /// Create a backend for `model` on the inference API at `base_url`
    ///
    /// A blank `token` sends unauthenticated requests.
    pub fn new(
        base_url: &str,
        model: impl Into<String>,
        token: impl Into<String>,
        timeout_secs: u64,
    ) -> MtResult<Self> {
        let timeout = Duration::from_secs(timeout_secs.max(1));
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| MtError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = match base_url.trim() {
            "" => DEFAULT_HUGGING_FACE_BASE_URL,
            trimmed => trimmed,
        };

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.into(),
            token: token.into(),
        })
    }

    pub fn from_settings(settings: &TranslationSettings) -> MtResult<Self> {
        Self::new(
            &settings.hugging_face_base_url,
            settings.hugging_face_model.trim(),
            settings.hugging_face_token.trim(),
            settings.request_timeout_seconds,
        )
    }
}

impl std::fmt::Debug for HuggingFaceBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HuggingFaceBackend")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl TranslationBackend for HuggingFaceBackend {
    async fn request_translation(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
    ) -> MtResult<String> {
        let body = json!({
            "inputs": build_prompt(text, source_code, target_code),
            "parameters": { "return_full_text": false },
        });

        let mut request = self
            .client
            .post(format!("{}/models/{}", self.base_url, self.model))
            .json(&body);
        if !self.token.trim().is_empty() {
            request = request.bearer_auth(&self.token);
        }

        let unreachable = |e: reqwest::Error| {
            warn!("Hugging Face is unreachable: {}", e);
            MtError::Unreachable(format!("Could not reach Hugging Face: {}", e))
        };
        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let raw = response.text().await.map_err(unreachable)?;

        if raw.is_empty() {
            return Err(MtError::InvalidResponse(
                "Hugging Face returned an empty response body".to_string(),
            ));
        }
        if !status.is_success() {
            warn!("Hugging Face request failed with status {}", status.as_u16());
        }

        parse_response(&raw)
    }

    fn provider_name(&self) -> &str {
        "Hugging Face"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{closed_port_url, spawn_server};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use std::sync::{Arc, Mutex};

    // ========== Response Parsing Tests ==========

    #[test]
    fn test_array_response() {
        assert_eq!(
            parse_response(r#"[{"generated_text":"Speichern"}]"#).unwrap(),
            "Speichern"
        );
        assert_eq!(
            parse_response(r#"[{"score":1}]"#).unwrap_err().to_string(),
            "Unexpected Hugging Face array response"
        );
    }

    #[test]
    fn test_object_responses() {
        assert_eq!(
            parse_response(r#"{"translation_text":"Speichern"}"#).unwrap(),
            "Speichern"
        );
        assert_eq!(
            parse_response(r#"{"error":"Model is loading"}"#).unwrap_err(),
            MtError::Provider("Model is loading".to_string())
        );
        assert_eq!(
            parse_response(r#"{"generated_text":"  "}"#).unwrap_err().to_string(),
            "Unexpected Hugging Face response format"
        );
    }

    #[test]
    fn test_other_json_types() {
        assert_eq!(
            parse_response("42").unwrap_err().to_string(),
            "Unexpected Hugging Face response type"
        );
        assert_eq!(
            parse_response("[]").unwrap_err().to_string(),
            "Unexpected Hugging Face response type"
        );
        assert!(
            parse_response("<html>")
                .unwrap_err()
                .to_string()
                .starts_with("Failed to parse Hugging Face response: ")
        );
    }

    #[test]
    fn test_debug_masks_token() {
        let backend = HuggingFaceBackend::new("", "google/translategemma-4b-it", "hf_secret", 5).unwrap();
        let debug = format!("{:?}", backend);
        assert!(!debug.contains("hf_secret"));
        assert!(debug.contains("https://api-inference.huggingface.co"));
    }

    // ========== HTTP Tests ==========

    #[tokio::test]
    async fn test_request_with_bearer_token() {
        let seen = Arc::new(Mutex::new(None::<(Option<String>, Value)>));
        let captured = seen.clone();
        let router = Router::new().route(
            "/models/google/translategemma-4b-it",
            post(move |headers: HeaderMap, Json(body): Json<Value>| {
                let captured = captured.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *captured.lock().unwrap() = Some((auth, body));
                    Json(json!([{ "generated_text": "Speichern" }]))
                }
            }),
        );
        let base = spawn_server(router).await;

        let backend = HuggingFaceBackend::new(&base, "google/translategemma-4b-it", "hf_abc", 5).unwrap();
        assert_eq!(
            backend.request_translation("Save", "en", "de").await.unwrap(),
            "Speichern"
        );

        let (auth, body) = seen.lock().unwrap().clone().unwrap();
        assert_eq!(auth.as_deref(), Some("Bearer hf_abc"));
        assert_eq!(body["parameters"]["return_full_text"], false);
        assert!(body["inputs"].as_str().unwrap().starts_with("Translate from en to de."));
    }

    #[tokio::test]
    async fn test_error_status_body_is_still_parsed() {
        let router = Router::new().route(
            "/models/m",
            post(|| async {
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    Json(json!({ "error": "Model m is currently loading" })),
                )
            }),
        );
        let base = spawn_server(router).await;

        let backend = HuggingFaceBackend::new(&base, "m", "", 5).unwrap();
        let err = backend.request_translation("Save", "en", "de").await.unwrap_err();
        assert_eq!(err.to_string(), "Model m is currently loading");
    }

    #[tokio::test]
    async fn test_empty_body() {
        let router = Router::new().route("/models/m", post(|| async { StatusCode::OK }));
        let base = spawn_server(router).await;

        let backend = HuggingFaceBackend::new(&base, "m", "", 5).unwrap();
        let err = backend.request_translation("Save", "en", "de").await.unwrap_err();
        assert_eq!(err.to_string(), "Hugging Face returned an empty response body");
    }

    #[tokio::test]
    async fn test_unreachable() {
        let backend = HuggingFaceBackend::new(&closed_port_url().await, "m", "", 2).unwrap();
        let err = backend.request_translation("Save", "en", "de").await.unwrap_err();
        assert!(err.to_string().starts_with("Could not reach Hugging Face: "));
    }
}
