//! Per-key view over scanned rows, one entry per (root, module, key, base text).

use crate::model::{RowStatus, StringEntryRow};
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::{DefaultHasher, Hash, Hasher};

/// Status precedence used to summarize a group, most severe first
const SEVERITY: [RowStatus; 5] = [
    RowStatus::Error,
    RowStatus::Missing,
    RowStatus::Identical,
    RowStatus::Ready,
    RowStatus::UpToDate,
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupedStringRow {
    pub id: String,
    pub key: String,
    pub base_text: String,
    pub resource_root_path: String,
    pub module_name: Option<String>,
    /// Sorted by (locale, id)
    pub rows: Vec<StringEntryRow>,
    pub missing_locales: Vec<String>,
    pub proposed_count: usize,
    pub aggregate_status: RowStatus,
}

impl GroupedStringRow {
    /// Row to show for this group: the selected one, else the first missing,
    /// else the first identical, else the first row
    pub fn preferred_row(&self, selected_row_id: Option<&str>) -> Option<&StringEntryRow> {
        selected_row_id
            .and_then(|id| self.rows.iter().find(|row| row.id == id))
            .or_else(|| self.rows.iter().find(|row| row.status == RowStatus::Missing))
            .or_else(|| self.rows.iter().find(|row| row.status == RowStatus::Identical))
            .or_else(|| self.rows.first())
    }
}

pub fn aggregate_status(rows: &[StringEntryRow]) -> RowStatus {
    SEVERITY
        .into_iter()
        .find(|status| rows.iter().any(|row| row.status == *status))
        .unwrap_or(RowStatus::UpToDate)
}

/// Group rows by key so every locale of one string is shown together
///
/// Groups are sorted by (key, module, resource root).
pub fn group_rows(rows: &[StringEntryRow]) -> Vec<GroupedStringRow> {
    let mut grouped: BTreeMap<(&str, Option<&str>, &str, &str), Vec<StringEntryRow>> = BTreeMap::new();
    for row in rows {
        grouped
            .entry((
                row.resource_root_path.as_str(),
                row.module_name.as_deref(),
                row.key.as_str(),
                row.base_text.as_str(),
            ))
            .or_default()
            .push(row.clone());
    }

    let mut groups: Vec<GroupedStringRow> = grouped
        .into_iter()
        .map(|((root, module, key, base_text), mut rows)| {
            rows.sort_by(|a, b| a.locale_tag.cmp(&b.locale_tag).then_with(|| a.id.cmp(&b.id)));
            let mut hasher = DefaultHasher::new();
            base_text.hash(&mut hasher);

            GroupedStringRow {
                id: format!(
                    "{}|{}|{}|{:x}",
                    root,
                    module.unwrap_or_default(),
                    key,
                    hasher.finish()
                ),
                key: key.to_string(),
                base_text: base_text.to_string(),
                resource_root_path: root.to_string(),
                module_name: module.map(str::to_string),
                missing_locales: rows
                    .iter()
                    .filter(|row| row.status == RowStatus::Missing)
                    .map(|row| row.locale_tag.clone())
                    .collect(),
                proposed_count: rows.iter().filter(|row| row.is_writable()).count(),
                aggregate_status: aggregate_status(&rows),
                rows,
            }
        })
        .collect();

    groups.sort_by(|a, b| {
        a.key
            .cmp(&b.key)
            .then_with(|| {
                a.module_name
                    .as_deref()
                    .unwrap_or_default()
                    .cmp(b.module_name.as_deref().unwrap_or_default())
            })
            .then_with(|| a.resource_root_path.cmp(&b.resource_root_path))
    });
    groups
}
