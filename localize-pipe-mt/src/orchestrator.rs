//! Per-row translate → validate state machine
//!
//! Rows are processed strictly in order, one backend request at a time.
//! Each row gets up to two validated attempts; each attempt gets a bounded
//! number of transport retries. A "model not installed" failure stops the
//! batch, since every remaining row would fail the same way.

use crate::error::MtError;
use crate::language::to_backend_code;
use crate::settings::TranslationSettings;
use crate::translator::TranslationBackend;
use crate::validation::{ValidationResult, validate};
use localize_pipe::{CancellationToken, Cancelled, RowStatus, StringEntryRow};
use std::sync::Arc;
use tracing::{info, warn};

const VALIDATION_ATTEMPTS: usize = 2;
/// Source code sent when the configured source locale has no mapping.
/// Backend codes are ISO 639-1 style, so this is `en` rather than `eng_Latn`.
const FALLBACK_SOURCE_CODE: &str = "en";

/// Whether a failure means the rest of the batch cannot succeed either
pub fn should_abort_remaining_rows(message: Option<&str>) -> bool {
    message.is_some_and(|message| message.to_lowercase().contains("run `ollama pull"))
}

/// Drop a final `.` the model added to text that had none
///
/// Ellipses are left alone.
pub fn remove_added_trailing_period(base_text: &str, translated: &str) -> String {
    let trimmed = translated.trim_end();
    if trimmed.ends_with('.') && !trimmed.ends_with("..") && !base_text.trim_end().ends_with('.') {
        trimmed[..trimmed.len() - 1].to_string()
    } else {
        translated.to_string()
    }
}

pub struct TranslationOrchestrator {
    backend: Arc<dyn TranslationBackend>,
    settings: TranslationSettings,
}

impl TranslationOrchestrator {
    pub fn new(backend: Arc<dyn TranslationBackend>, settings: TranslationSettings) -> Self {
        Self { backend, settings }
    }

    pub fn backend(&self) -> &Arc<dyn TranslationBackend> {
        &self.backend
    }

    /// Translate every row and return the updated list
    ///
    /// # Arguments
    ///
    /// * `rows` - Rows to translate, in processing order
    /// * `on_progress` - Called after every row with the running row list and
    ///   the number of rows processed so far
    /// * `cancel` - Checked before each row and after each backend call
    ///
    /// # Returns
    ///
    /// * `Ok(rows)` - One output row per input row, same order
    /// * `Err(Cancelled)` - Cancellation was requested; partial results are
    ///   only visible through `on_progress`
    ///
    /// # Example
    ///
    /// ```ignore
    /// let orchestrator = TranslationOrchestrator::new(backend, settings);
    /// let translated = orchestrator
    ///     .translate_rows(&rows, |_, done| println!("{} done", done), &token)
    ///     .await?;
    /// ```
    pub async fn translate_rows<F>(
        &self,
        rows: &[StringEntryRow],
        mut on_progress: F,
        cancel: &CancellationToken,
    ) -> Result<Vec<StringEntryRow>, Cancelled>
    where
        F: FnMut(&[StringEntryRow], usize),
    {
        cancel.check()?;
        let source_code = to_backend_code(&self.settings.source_locale)
            .unwrap_or_else(|| FALLBACK_SOURCE_CODE.to_string());
        info!(
            rows = rows.len(),
            provider = self.backend.provider_name(),
            model = self.backend.model(),
            source = %source_code,
            "Translate request started"
        );

        let mut output = rows.to_vec();
        for (index, row) in rows.iter().enumerate() {
            cancel.check()?;

            let Some(target_code) = to_backend_code(&row.locale_tag) else {
                warn!("Unsupported locale mapping for target locale '{}'", row.locale_tag);
                output[index] = StringEntryRow {
                    status: RowStatus::Error,
                    message: Some(MtError::UnsupportedLocale(row.locale_tag.clone()).to_string()),
                    ..row.clone()
                };
                on_progress(&output, index + 1);
                continue;
            };

            let translated = self.translate_row(row, &source_code, &target_code, cancel).await?;
            let abort = translated.status == RowStatus::Error
                && should_abort_remaining_rows(translated.message.as_deref());
            let abort_message = translated.message.clone();
            output[index] = translated;

            if abort {
                warn!(
                    "Aborting remaining rows due to fatal provider error: {}",
                    abort_message.as_deref().unwrap_or_default()
                );
                for remaining in &mut output[index + 1..] {
                    remaining.status = RowStatus::Error;
                    remaining.message = abort_message.clone();
                }
                on_progress(&output, rows.len());
                break;
            }
            on_progress(&output, index + 1);
        }

        info!(rows = output.len(), "Translate request finished");
        Ok(output)
    }

    async fn translate_row(
        &self,
        row: &StringEntryRow,
        source_code: &str,
        target_code: &str,
        cancel: &CancellationToken,
    ) -> Result<StringEntryRow, Cancelled> {
        let mut latest_text = None;
        let mut latest_validation: Option<ValidationResult> = None;

        for _ in 0..VALIDATION_ATTEMPTS {
            let translated = match self
                .request_with_retry(&row.base_text, source_code, target_code, cancel)
                .await?
            {
                Ok(text) => text,
                Err(message) => {
                    return Ok(StringEntryRow {
                        status: RowStatus::Error,
                        message: Some(message),
                        ..row.clone()
                    });
                }
            };

            let translated = if self.settings.remove_added_trailing_period {
                remove_added_trailing_period(&row.base_text, &translated)
            } else {
                translated
            };

            let validation = validate(&row.base_text, &translated);
            if validation.is_valid {
                return Ok(StringEntryRow {
                    proposed_text: Some(translated),
                    status: RowStatus::Ready,
                    message: None,
                    ..row.clone()
                });
            }
            latest_text = Some(translated);
            latest_validation = Some(validation);
        }

        let summary = latest_validation
            .map(|validation| validation.summary())
            .unwrap_or_default();
        Ok(StringEntryRow {
            proposed_text: latest_text,
            status: RowStatus::Error,
            message: Some(format!("Validation failed: {}", summary)),
            ..row.clone()
        })
    }

    /// Inner `Err(String)` is the last transport failure message
    async fn request_with_retry(
        &self,
        text: &str,
        source_code: &str,
        target_code: &str,
        cancel: &CancellationToken,
    ) -> Result<Result<String, String>, Cancelled> {
        let mut last_error = None;
        for _ in 0..self.settings.transport_attempts() {
            cancel.check()?;
            let result = self
                .backend
                .request_translation(text, source_code, target_code)
                .await;
            cancel.check()?;
            match result {
                Ok(text) => return Ok(Ok(text)),
                Err(error) => last_error = Some(error.to_string()),
            }
        }
        Ok(Err(last_error.unwrap_or_else(|| "Translation failed".to_string())))
    }
}
