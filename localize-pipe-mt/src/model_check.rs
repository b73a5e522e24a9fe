//! Ollama model availability check and pull
//!
//! Both operations report a status plus a ready-to-show message instead of
//! an error, since every outcome (including "daemon not running") is
//! something the operator acts on.

use crate::ollama::normalize_base_url;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelCheckStatus {
    Available,
    Missing,
    Unreachable,
    ParseError,
    InvalidInput,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelCheckResult {
    pub status: ModelCheckStatus,
    pub message: String,
}

impl ModelCheckResult {
    fn new(status: ModelCheckStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PullStatus {
    Pulled,
    Failed,
    Unreachable,
    InvalidInput,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullResult {
    pub status: PullStatus,
    pub message: String,
}

impl PullResult {
    fn new(status: PullStatus, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}

/// One progress update while a model downloads
#[derive(Debug, Clone, PartialEq)]
pub struct PullProgress {
    pub status: String,
    /// `completed / total` in `0.0..=1.0`, when both are reported
    pub fraction: Option<f64>,
}

/// A parsed line of the `/api/pull` progress stream
#[derive(Debug, Clone, PartialEq)]
pub struct PullProgressLine {
    pub status: String,
    pub fraction: Option<f64>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct RawPullLine {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    completed: Option<u64>,
    #[serde(default)]
    total: Option<u64>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one NDJSON progress line; malformed lines yield `None`
pub fn parse_pull_progress_line(raw: &str) -> Option<PullProgressLine> {
    let line: RawPullLine = serde_json::from_str(raw).ok()?;
    let fraction = match (line.completed, line.total) {
        (Some(completed), Some(total)) if total > 0 => {
            Some((completed as f64 / total as f64).clamp(0.0, 1.0))
        }
        _ => None,
    };
    Some(PullProgressLine {
        status: line.status.map(|s| s.trim().to_string()).unwrap_or_default(),
        fraction,
        error: line
            .error
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty()),
    })
}

/// Model names listed by an `/api/tags` payload; `None` for an unexpected shape
pub fn parse_model_names(raw: &str) -> Option<BTreeSet<String>> {
    let parsed: Value = serde_json::from_str(raw).ok()?;
    let models = parsed.get("models")?.as_array()?;
    Some(
        models
            .iter()
            .filter_map(|model| model.get("name")?.as_str())
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect(),
    )
}

/// Whether `requested` is installed
///
/// Case-insensitive. A request without a tag matches any tagged variant.
///
/// ```ignore
/// let available = ["translategemma:4b".to_string()].into_iter().collect();
/// assert!(is_model_available("TranslateGemma", &available));
/// assert!(!is_model_available("translategemma:12b", &available));
/// ```
pub fn is_model_available(requested: &str, available: &BTreeSet<String>) -> bool {
    let requested = requested.trim().to_lowercase();
    if requested.is_empty() {
        return false;
    }
    let tagged_prefix = format!("{}:", requested);
    available.iter().map(|name| name.trim().to_lowercase()).any(|name| {
        name == requested || (!requested.contains(':') && name.starts_with(&tagged_prefix))
    })
}

fn extract_json_error(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    let error = parsed.get("error")?.as_str()?.trim();
    (!error.is_empty()).then(|| error.to_string())
}

fn build_client(timeout: Duration, connect_timeout: Duration) -> Result<reqwest::Client, String> {
    reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .timeout(timeout)
        .build()
        .map_err(|e| e.to_string())
}

/// Check whether `model` is installed in the Ollama daemon at `base_url`
///
/// # Arguments
///
/// * `base_url` - Daemon URL; blank means `http://127.0.0.1:11434`
/// * `model` - Requested model, with or without a tag
/// * `timeout_secs` - Clamped to 3..=30 seconds
pub async fn check_model(base_url: &str, model: &str, timeout_secs: u64) -> ModelCheckResult {
    let model = model.trim();
    if model.is_empty() {
        return ModelCheckResult::new(
            ModelCheckStatus::InvalidInput,
            "Enter an Ollama model to check availability.",
        );
    }

    let base_url = normalize_base_url(base_url);
    let timeout = Duration::from_secs(timeout_secs.clamp(3, 30));
    let unreachable = |detail: String| {
        ModelCheckResult::new(
            ModelCheckStatus::Unreachable,
            format!("Could not reach Ollama at {} ({}).", base_url, detail),
        )
    };

    let client = match build_client(timeout, timeout) {
        Ok(client) => client,
        Err(detail) => return unreachable(detail),
    };
    let response = match client.get(format!("{}/api/tags", base_url)).send().await {
        Ok(response) => response,
        Err(e) => return unreachable(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        return ModelCheckResult::new(
            ModelCheckStatus::Unreachable,
            format!("Ollama check failed (HTTP {}) at {}.", status.as_u16(), base_url),
        );
    }
    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => return unreachable(e.to_string()),
    };

    let Some(names) = parse_model_names(&body) else {
        return ModelCheckResult::new(
            ModelCheckStatus::ParseError,
            "Ollama returned an unexpected /api/tags response payload.",
        );
    };
    debug!("Ollama reports {} local models", names.len());

    if names.is_empty() {
        ModelCheckResult::new(
            ModelCheckStatus::Missing,
            format!("No local Ollama models were found. Run `ollama pull {}`.", model),
        )
    } else if is_model_available(model, &names) {
        ModelCheckResult::new(
            ModelCheckStatus::Available,
            format!("Model '{}' is available locally in Ollama.", model),
        )
    } else {
        ModelCheckResult::new(
            ModelCheckStatus::Missing,
            format!("Model '{}' is not local. Run `ollama pull {}`.", model, model),
        )
    }
}

/// Download `model` into the Ollama daemon at `base_url`
///
/// Progress lines are streamed to `on_progress`; returning `false` from the
/// callback stops the pull.
///
/// # Arguments
///
/// * `timeout_secs` - Overall request timeout, clamped to 5..=600 seconds
pub async fn pull_model<F>(
    base_url: &str,
    model: &str,
    timeout_secs: u64,
    mut on_progress: F,
) -> PullResult
where
    F: FnMut(&PullProgress) -> bool,
{
    let model = model.trim();
    if model.is_empty() {
        return PullResult::new(PullStatus::InvalidInput, "Enter an Ollama model before pulling.");
    }

    let base_url = normalize_base_url(base_url);
    let timeout = Duration::from_secs(timeout_secs.clamp(5, 600));
    let connect_timeout = Duration::from_secs(timeout_secs.clamp(3, 30));
    let unreachable = |detail: String| {
        PullResult::new(
            PullStatus::Unreachable,
            format!("Could not reach Ollama at {} ({}).", base_url, detail),
        )
    };

    let client = match build_client(timeout, connect_timeout) {
        Ok(client) => client,
        Err(detail) => return unreachable(detail),
    };
    info!("Pulling Ollama model {} from {}", model, base_url);
    let mut response = match client
        .post(format!("{}/api/pull", base_url))
        .json(&json!({ "name": model, "stream": true }))
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => return unreachable(e.to_string()),
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let suffix = extract_json_error(&body)
            .map(|error| format!(": {}", error))
            .unwrap_or_default();
        return PullResult::new(
            PullStatus::Failed,
            format!("Ollama pull failed (HTTP {}){}", status.as_u16(), suffix),
        );
    }

    let mut buffer: Vec<u8> = Vec::new();
    let mut last_status = String::new();

    loop {
        let finished = match response.chunk().await {
            Ok(Some(chunk)) => {
                buffer.extend_from_slice(&chunk);
                false
            }
            Ok(None) => {
                buffer.push(b'\n');
                true
            }
            Err(e) => return PullResult::new(PullStatus::Failed, format!("Ollama pull failed: {}", e)),
        };

        while let Some(newline) = buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = buffer.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if line.trim().is_empty() {
                continue;
            }
            let Some(parsed) = parse_pull_progress_line(line.trim()) else {
                continue;
            };
            if let Some(error) = parsed.error {
                return PullResult::new(PullStatus::Failed, error);
            }
            last_status = parsed.status;
            let progress = PullProgress {
                status: if last_status.is_empty() {
                    "Downloading...".to_string()
                } else {
                    last_status.clone()
                },
                fraction: parsed.fraction,
            };
            if !on_progress(&progress) {
                info!("Pull of {} cancelled", model);
                return PullResult::new(PullStatus::Cancelled, "Pull cancelled.");
            }
        }

        if finished {
            break;
        }
    }

    let final_status = if last_status.is_empty() {
        "completed"
    } else {
        last_status.as_str()
    };
    PullResult::new(
        PullStatus::Pulled,
        format!(
            "Model '{}' pull request completed successfully ({}).",
            model, final_status
        ),
    )
}
