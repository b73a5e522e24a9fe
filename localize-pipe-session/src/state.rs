//! Snapshot of everything a caller can observe about the controller

use localize_pipe::{
    LanguageAddTarget, RowStatus, ScanScope, StringEntryRow, TranslationDeleteTarget,
};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UiOperation {
    #[default]
    Idle,
    Scanning,
    Translating,
    /// Writing, deleting and adding languages
    Applying,
}

impl UiOperation {
    pub fn display_name(&self) -> &'static str {
        match self {
            UiOperation::Idle => "Idle",
            UiOperation::Scanning => "Scanning",
            UiOperation::Translating => "Translating",
            UiOperation::Applying => "Applying",
        }
    }
}

impl fmt::Display for UiOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Immutable controller snapshot
///
/// A new snapshot replaces the old one on every transition; readers never
/// see a half-applied update.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ControllerState {
    pub scan_scope: ScanScope,
    pub include_android_resources: bool,
    pub include_compose_resources: bool,
    pub delete_targets: Vec<TranslationDeleteTarget>,
    pub language_add_targets: Vec<LanguageAddTarget>,
    pub detected_locales: BTreeSet<String>,
    pub rows: Vec<StringEntryRow>,
    pub selected_row_id: Option<String>,
    pub status_text: String,
    pub is_busy: bool,
    pub last_message: Option<String>,
    pub active_operation: UiOperation,
    pub progress_current: usize,
    pub progress_total: usize,
    pub has_completed_initial_scan: bool,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            scan_scope: ScanScope::WholeProject,
            include_android_resources: true,
            include_compose_resources: true,
            delete_targets: Vec::new(),
            language_add_targets: Vec::new(),
            detected_locales: BTreeSet::new(),
            rows: Vec::new(),
            selected_row_id: None,
            status_text: "Idle".to_string(),
            is_busy: false,
            last_message: None,
            active_operation: UiOperation::Idle,
            progress_current: 0,
            progress_total: 0,
            has_completed_initial_scan: false,
        }
    }
}

impl ControllerState {
    pub fn selected_row(&self) -> Option<&StringEntryRow> {
        let id = self.selected_row_id.as_deref()?;
        self.rows.iter().find(|row| row.id == id)
    }

    pub(crate) fn begin(&mut self, operation: UiOperation, status_text: &str, total: usize, message: String) {
        self.progress(operation, status_text, 0, total, message);
    }

    pub(crate) fn progress(
        &mut self,
        operation: UiOperation,
        status_text: &str,
        current: usize,
        total: usize,
        message: String,
    ) {
        self.status_text = status_text.to_string();
        self.is_busy = true;
        self.active_operation = operation;
        self.progress_current = current;
        self.progress_total = total;
        self.last_message = Some(message);
    }

    /// Leave the busy state and clear progress
    pub(crate) fn go_idle(&mut self, status_text: &str, message: impl Into<String>) {
        self.status_text = status_text.to_string();
        self.is_busy = false;
        self.active_operation = UiOperation::Idle;
        self.progress_current = 0;
        self.progress_total = 0;
        self.last_message = Some(message.into());
    }
}

/// Carry pending proposals over a rescan
///
/// A scanned row whose previous version had a proposal keeps the proposal and
/// its message; READY and ERROR statuses survive too, so a rescan triggered
/// mid-batch does not wipe work that is not yet written.
pub fn merge_rescanned_rows(
    previous: &[StringEntryRow],
    scanned: Vec<StringEntryRow>,
) -> Vec<StringEntryRow> {
    let previous_by_id: HashMap<&str, &StringEntryRow> =
        previous.iter().map(|row| (row.id.as_str(), row)).collect();

    scanned
        .into_iter()
        .map(|mut row| {
            let Some(old) = previous_by_id.get(row.id.as_str()) else {
                return row;
            };
            if old.proposed_text.is_none() {
                return row;
            }
            row.proposed_text = old.proposed_text.clone();
            row.message = old.message.clone();
            if matches!(old.status, RowStatus::Ready | RowStatus::Error) {
                row.status = old.status;
            }
            row
        })
        .collect()
}

/// Merge updated rows into `rows` by id, keeping order
pub(crate) fn replace_rows_by_id(rows: &[StringEntryRow], updates: &[StringEntryRow]) -> Vec<StringEntryRow> {
    let by_id: HashMap<&str, &StringEntryRow> =
        updates.iter().map(|row| (row.id.as_str(), row)).collect();
    rows.iter()
        .map(|row| by_id.get(row.id.as_str()).map_or_else(|| row.clone(), |u| (*u).clone()))
        .collect()
}

/// Whether a changed path can affect scan results
pub fn should_trigger_rescan(path: &str) -> bool {
    if !path.contains("/values") {
        return false;
    }
    path.ends_with("/strings.xml") || path.contains("/values-")
}
