//! Diffing scanner: turns the resource layout into actionable rows
//!
//! Files are grouped by (resource root, kind, module). Within a group the
//! `values` folder is the base every locale folder is compared against.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe::{CancellationToken, FilesystemLayout, ScanOptions, StringsXmlScanner};
//!
//! let scanner = StringsXmlScanner::new(FilesystemLayout::new("/path/to/project"));
//! let result = scanner.scan(&ScanOptions::default(), &CancellationToken::new())?;
//! for row in &result.rows {
//!     println!("{} [{}] {}", row.key, row.locale_tag, row.status);
//! }
//! ```

use crate::cancel::{CancellationToken, Cancelled};
use crate::extractor::{StringValues, extract};
use crate::layout::{LocalizedStringsFile, ResourceLayout};
use crate::locale::{canonical_locale_tag, locale_tag_to_qualifier};
use crate::model::{
    LanguageAddTarget, ResourceKind, RowStatus, ScanOptions, ScanResult, StringEntryRow,
    TranslationDeleteLocaleEntry, TranslationDeleteTarget,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    resource_root_path: String,
    kind: ResourceKind,
    module_name: Option<String>,
}

type Groups<'a> = BTreeMap<GroupKey, Vec<&'a LocalizedStringsFile>>;

/// Status of one key in one locale relative to the base text
///
/// `MISSING` when the locale lacks the key, `IDENTICAL` when it repeats the
/// base text, `UP_TO_DATE` otherwise.
pub fn diff_status(base_text: &str, localized_text: Option<&str>) -> RowStatus {
    match localized_text {
        None => RowStatus::Missing,
        Some(text) if text == base_text => RowStatus::Identical,
        Some(_) => RowStatus::UpToDate,
    }
}

/// Scanner over a [`ResourceLayout`]
#[derive(Clone)]
pub struct StringsXmlScanner {
    layout: Arc<dyn ResourceLayout>,
}

impl StringsXmlScanner {
    pub fn new(layout: impl ResourceLayout + 'static) -> Self {
        Self {
            layout: Arc::new(layout),
        }
    }

    pub fn from_shared(layout: Arc<dyn ResourceLayout>) -> Self {
        Self { layout }
    }

    fn filtered_files(&self, options: &ScanOptions) -> Vec<LocalizedStringsFile> {
        let mut files: Vec<LocalizedStringsFile> = self
            .layout
            .strings_files()
            .into_iter()
            .filter(|file| options.includes_kind(file.kind))
            .filter(|file| options.includes_module(file.module_name.as_deref()))
            .collect();
        files.sort_by(|a, b| a.folder_name.cmp(&b.folder_name).then_with(|| a.path.cmp(&b.path)));
        files
    }

    fn read_values(&self, file: &LocalizedStringsFile) -> StringValues {
        extract(&self.layout.read_text(&file.path))
    }

    /// Compute translation rows for every (locale, key) needing work
    ///
    /// # Arguments
    ///
    /// * `options` - Kind/scope filters, identical-row policy and extra locales
    /// * `cancel` - Checked before each group, each locale and each key
    ///
    /// # Returns
    ///
    /// * `Ok(ScanResult)` - Rows sorted by (locale, key) and every locale tag
    ///   found on disk
    /// * `Err(Cancelled)` - Cancellation was requested; no partial result
    pub fn scan(
        &self,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<ScanResult, Cancelled> {
        cancel.check()?;
        let files = self.filtered_files(options);
        let groups = group_files(&files);
        let requested: BTreeSet<String> = options
            .requested_locales
            .iter()
            .filter_map(|tag| canonical_locale_tag(tag))
            .collect();

        let mut detected_locales = BTreeSet::new();
        let mut rows = Vec::new();

        for (group_key, group_files) in &groups {
            cancel.check()?;
            let Some(base_file) = group_files.iter().find(|file| file.is_base()) else {
                continue;
            };
            let base_values = self.read_values(base_file);
            if base_values.is_empty() {
                continue;
            }
            let base_entries = base_values.sorted();

            let mut locale_lookup: HashMap<&str, &LocalizedStringsFile> = HashMap::new();
            for file in group_files.iter().copied() {
                if let Some(tag) = file.normalized_locale_tag.as_deref() {
                    detected_locales.insert(tag.to_string());
                    locale_lookup.insert(tag, file);
                }
            }

            let mut targets: BTreeSet<&str> = locale_lookup.keys().copied().collect();
            targets.extend(requested.iter().map(String::as_str));

            for target_locale in targets {
                cancel.check()?;
                let locale_file = locale_lookup.get(target_locale).copied();
                let localized_values = locale_file
                    .map(|file| self.read_values(file))
                    .unwrap_or_default();
                let qualifier_raw = locale_file
                    .map(|file| file.qualifier_raw.clone())
                    .unwrap_or_else(|| locale_tag_to_qualifier(target_locale));

                for &(key, base_text) in &base_entries {
                    cancel.check()?;
                    let localized_text = localized_values.get(key);
                    let status = diff_status(base_text, localized_text);
                    if status == RowStatus::UpToDate {
                        continue;
                    }
                    if status == RowStatus::Identical && !options.include_identical_to_base {
                        continue;
                    }

                    rows.push(StringEntryRow {
                        id: StringEntryRow::row_id(&group_key.resource_root_path, target_locale, key),
                        key: key.to_string(),
                        base_text: base_text.to_string(),
                        localized_text: localized_text.map(str::to_string),
                        proposed_text: None,
                        locale_tag: target_locale.to_string(),
                        locale_qualifier_raw: qualifier_raw.clone(),
                        locale_file_path: locale_file.map(|file| file.path.clone()),
                        resource_root_path: group_key.resource_root_path.clone(),
                        module_name: group_key.module_name.clone(),
                        origin_kind: group_key.kind,
                        status,
                        message: None,
                    });
                }
            }
        }

        rows.sort_by(|a, b| a.locale_tag.cmp(&b.locale_tag).then_with(|| a.key.cmp(&b.key)));
        debug!(
            "Scanned {} groups: {} rows, {} locales",
            groups.len(),
            rows.len(),
            detected_locales.len()
        );

        Ok(ScanResult {
            rows,
            detected_locales,
        })
    }

    /// Keys that are translated in at least one locale file
    ///
    /// Every locale file containing the key becomes one entry, whatever its
    /// text. Targets are sorted by (key, module, resource root).
    pub fn scan_deletion_targets(
        &self,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<TranslationDeleteTarget>, Cancelled> {
        cancel.check()?;
        let files = self.filtered_files(options);
        let groups = group_files(&files);
        let mut targets = Vec::new();

        for (group_key, group_files) in &groups {
            cancel.check()?;
            let Some(base_file) = group_files.iter().find(|file| file.is_base()) else {
                continue;
            };
            let base_values = self.read_values(base_file);
            if base_values.is_empty() {
                continue;
            }

            let locale_files: Vec<(&LocalizedStringsFile, &str, StringValues)> = group_files
                .iter()
                .filter_map(|file| {
                    let tag = file.normalized_locale_tag.as_deref()?;
                    Some((*file, tag, self.read_values(file)))
                })
                .collect();
            if locale_files.is_empty() {
                continue;
            }

            for (key, base_text) in base_values.sorted() {
                cancel.check()?;
                let mut locale_entries: Vec<TranslationDeleteLocaleEntry> = locale_files
                    .iter()
                    .filter(|(_, _, values)| values.contains_key(key))
                    .map(|(file, tag, _)| TranslationDeleteLocaleEntry {
                        locale_tag: tag.to_string(),
                        locale_qualifier_raw: file.qualifier_raw.clone(),
                        locale_file_path: file.path.clone(),
                    })
                    .collect();
                if locale_entries.is_empty() {
                    continue;
                }
                locale_entries.sort_by(|a, b| a.locale_tag.cmp(&b.locale_tag));

                targets.push(TranslationDeleteTarget {
                    id: format!(
                        "{}|{}|{}",
                        group_key.resource_root_path,
                        group_key.module_name.as_deref().unwrap_or_default(),
                        key
                    ),
                    key: key.to_string(),
                    base_text: base_text.to_string(),
                    resource_root_path: group_key.resource_root_path.clone(),
                    module_name: group_key.module_name.clone(),
                    origin_kind: group_key.kind,
                    locale_entries,
                });
            }
        }

        targets.sort_by(|a, b| {
            a.key
                .cmp(&b.key)
                .then_with(|| module_sort_key(&a.module_name).cmp(module_sort_key(&b.module_name)))
                .then_with(|| a.resource_root_path.cmp(&b.resource_root_path))
        });
        Ok(targets)
    }

    /// Resource roots that have a base file and can receive a new locale
    pub fn scan_language_add_targets(
        &self,
        options: &ScanOptions,
        cancel: &CancellationToken,
    ) -> Result<Vec<LanguageAddTarget>, Cancelled> {
        cancel.check()?;
        let files = self.filtered_files(options);
        let groups = group_files(&files);
        let mut targets = Vec::new();

        for (group_key, group_files) in &groups {
            cancel.check()?;
            if !group_files.iter().any(|file| file.is_base()) {
                continue;
            }
            let existing_locale_tags: BTreeSet<String> = group_files
                .iter()
                .filter_map(|file| file.normalized_locale_tag.clone())
                .collect();

            targets.push(LanguageAddTarget {
                id: format!(
                    "{}|{}|{}",
                    group_key.resource_root_path,
                    group_key.module_name.as_deref().unwrap_or_default(),
                    group_key.kind.name()
                ),
                resource_root_path: group_key.resource_root_path.clone(),
                module_name: group_key.module_name.clone(),
                origin_kind: group_key.kind,
                existing_locale_tags: existing_locale_tags.into_iter().collect(),
            });
        }

        targets.sort_by(|a, b| {
            module_sort_key(&a.module_name)
                .cmp(module_sort_key(&b.module_name))
                .then_with(|| a.resource_root_path.cmp(&b.resource_root_path))
        });
        Ok(targets)
    }
}

fn module_sort_key(module_name: &Option<String>) -> &str {
    module_name.as_deref().unwrap_or_default()
}

fn group_files(files: &[LocalizedStringsFile]) -> Groups<'_> {
    let mut groups: Groups<'_> = BTreeMap::new();
    for file in files {
        groups
            .entry(GroupKey {
                resource_root_path: file.resource_root_path.clone(),
                kind: file.kind,
                module_name: file.module_name.clone(),
            })
            .or_default()
            .push(file);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::FilesystemLayout;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn scanner(dir: &TempDir) -> StringsXmlScanner {
        StringsXmlScanner::new(FilesystemLayout::new(dir.path()))
    }

    fn settings_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/src/main/res/values/strings.xml",
            r#"<resources>
    <string name="title">Settings</string>
    <string name="debug" translatable="false">Debug</string>
</resources>"#,
        );
        write(
            dir.path(),
            "app/src/main/res/values-de/strings.xml",
            r#"<resources>
    <string name="title">Einstellungen</string>
</resources>"#,
        );
        dir
    }

    // ========== Diff Status Tests ==========

    #[test]
    fn test_diff_status() {
        assert_eq!(diff_status("Save", None), RowStatus::Missing);
        assert_eq!(diff_status("Save", Some("Save")), RowStatus::Identical);
        assert_eq!(diff_status("Save", Some("Speichern")), RowStatus::UpToDate);
    }

    // ========== Row Scan Tests ==========

    #[test]
    fn test_translated_and_excluded_keys_produce_no_rows() {
        let dir = settings_project();
        let result = scanner(&dir)
            .scan(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();

        assert!(result.rows.is_empty());
        assert_eq!(
            result.detected_locales.into_iter().collect::<Vec<_>>(),
            vec!["de".to_string()]
        );
    }

    #[test]
    fn test_requested_locale_without_file_yields_missing_rows() {
        let dir = settings_project();
        let options = ScanOptions {
            requested_locales: vec!["fr".to_string()],
            ..ScanOptions::default()
        };
        let result = scanner(&dir).scan(&options, &CancellationToken::new()).unwrap();

        assert_eq!(result.rows.len(), 1);
        let row = &result.rows[0];
        assert_eq!(row.key, "title");
        assert_eq!(row.locale_tag, "fr");
        assert_eq!(row.locale_qualifier_raw, "fr");
        assert_eq!(row.status, RowStatus::Missing);
        assert_eq!(row.locale_file_path, None);
        assert!(row.id.ends_with("/app/src/main/res|fr|title"));
        assert_eq!(row.module_name.as_deref(), Some("app"));
        assert!(!result.detected_locales.contains("fr"));
    }

    #[test]
    fn test_missing_and_identical_rows() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/src/main/res/values/strings.xml",
            r#"<resources><string name="b">OK</string><string name="a">Cancel</string></resources>"#,
        );
        write(
            dir.path(),
            "app/src/main/res/values-pt-rBR/strings.xml",
            r#"<resources><string name="b">OK</string></resources>"#,
        );

        let result = scanner(&dir)
            .scan(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].key, "a");
        assert_eq!(result.rows[0].locale_tag, "pt-BR");
        assert_eq!(result.rows[0].locale_qualifier_raw, "pt-rBR");
        assert!(result.rows[0].locale_file_path.is_some());

        let options = ScanOptions {
            include_identical_to_base: true,
            ..ScanOptions::default()
        };
        let result = scanner(&dir).scan(&options, &CancellationToken::new()).unwrap();
        let statuses: Vec<(&str, RowStatus)> = result
            .rows
            .iter()
            .map(|row| (row.key.as_str(), row.status))
            .collect();
        assert_eq!(
            statuses,
            vec![("a", RowStatus::Missing), ("b", RowStatus::Identical)]
        );
        assert_eq!(result.rows[1].localized_text.as_deref(), Some("OK"));
    }

    #[test]
    fn test_rows_sorted_by_locale_then_key() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/src/main/res/values/strings.xml",
            r#"<resources><string name="z">Z</string><string name="m">M</string></resources>"#,
        );
        write(dir.path(), "app/src/main/res/values-fr/strings.xml", "<resources/>");
        write(dir.path(), "app/src/main/res/values-de/strings.xml", "<resources/>");

        let result = scanner(&dir)
            .scan(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        let order: Vec<(&str, &str)> = result
            .rows
            .iter()
            .map(|row| (row.locale_tag.as_str(), row.key.as_str()))
            .collect();
        assert_eq!(order, vec![("de", "m"), ("de", "z"), ("fr", "m"), ("fr", "z")]);
    }

    #[test]
    fn test_group_without_base_is_skipped() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/src/main/res/values-de/strings.xml",
            r#"<resources><string name="a">A</string></resources>"#,
        );
        let result = scanner(&dir)
            .scan(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        assert!(result.rows.is_empty());
        assert!(result.detected_locales.is_empty());
    }

    #[test]
    fn test_kind_and_module_filters() {
        let dir = TempDir::new().unwrap();
        let base = r#"<resources><string name="a">A</string></resources>"#;
        write(dir.path(), "app/src/main/res/values/strings.xml", base);
        write(dir.path(), "app/src/main/res/values-de/strings.xml", "<resources/>");
        write(dir.path(), "shared/src/commonMain/composeResources/values/strings.xml", base);
        write(dir.path(), "shared/src/commonMain/composeResources/values-de/strings.xml", "<resources/>");

        let options = ScanOptions {
            include_compose_resources: false,
            ..ScanOptions::default()
        };
        let result = scanner(&dir).scan(&options, &CancellationToken::new()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].origin_kind, ResourceKind::AndroidRes);

        let options = ScanOptions {
            scope: crate::model::ScanScope::CurrentModule,
            current_module_name: Some("shared".to_string()),
            ..ScanOptions::default()
        };
        let result = scanner(&dir).scan(&options, &CancellationToken::new()).unwrap();
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].origin_kind, ResourceKind::ComposeResources);
    }

    #[test]
    fn test_cancelled_scan_returns_no_result() {
        let dir = settings_project();
        let token = CancellationToken::new();
        token.cancel();
        assert_eq!(scanner(&dir).scan(&ScanOptions::default(), &token), Err(Cancelled));
        assert_eq!(
            scanner(&dir).scan_deletion_targets(&ScanOptions::default(), &token),
            Err(Cancelled)
        );
    }

    /// Cancels the shared token as soon as a matching file is read
    struct CancelOnRead {
        inner: FilesystemLayout,
        token: CancellationToken,
        folder: &'static str,
    }

    impl ResourceLayout for CancelOnRead {
        fn strings_files(&self) -> Vec<LocalizedStringsFile> {
            self.inner.strings_files()
        }

        fn read_text(&self, path: &str) -> String {
            if path.contains(self.folder) {
                self.token.cancel();
            }
            self.inner.read_text(path)
        }
    }

    #[test]
    fn test_cancel_during_scan_discards_partial_rows() {
        let dir = settings_project();
        write(
            dir.path(),
            "app/src/main/res/values/strings.xml",
            r#"<resources>
    <string name="title">Settings</string>
    <string name="save">Save</string>
</resources>"#,
        );
        let options = ScanOptions {
            requested_locales: vec!["fr".to_string()],
            ..ScanOptions::default()
        };
        let uncancelled = scanner(&dir).scan(&options, &CancellationToken::new()).unwrap();
        assert_eq!(uncancelled.rows.len(), 3);

        let token = CancellationToken::new();
        let layout = CancelOnRead {
            inner: FilesystemLayout::new(dir.path()),
            token: token.clone(),
            folder: "/values-de/",
        };
        let result = StringsXmlScanner::new(layout).scan(&options, &token);
        assert_eq!(result, Err(Cancelled));
        assert!(token.is_cancelled());
    }

    // ========== Deletion Target Tests ==========

    #[test]
    fn test_deletion_targets_collect_translated_locales() {
        let dir = settings_project();
        write(
            dir.path(),
            "app/src/main/res/values-fr/strings.xml",
            r#"<resources><string name="title">Settings</string></resources>"#,
        );
        write(dir.path(), "app/src/main/res/values-es/strings.xml", "<resources/>");

        let targets = scanner(&dir)
            .scan_deletion_targets(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(targets.len(), 1);
        let target = &targets[0];
        assert_eq!(target.key, "title");
        assert_eq!(target.base_text, "Settings");
        assert!(target.id.ends_with("/app/src/main/res|app|title"));
        let locales: Vec<&str> = target
            .locale_entries
            .iter()
            .map(|entry| entry.locale_tag.as_str())
            .collect();
        assert_eq!(locales, vec!["de", "fr"]);
    }

    #[test]
    fn test_deletion_targets_need_locale_files() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "app/src/main/res/values/strings.xml",
            r#"<resources><string name="a">A</string></resources>"#,
        );
        let targets = scanner(&dir)
            .scan_deletion_targets(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        assert!(targets.is_empty());
    }

    // ========== Language Add Target Tests ==========

    #[test]
    fn test_language_add_targets() {
        let dir = settings_project();
        write(
            dir.path(),
            "core/src/commonMain/composeResources/values/strings.xml",
            r#"<resources><string name="a">A</string></resources>"#,
        );
        write(
            dir.path(),
            "orphan/src/main/res/values-it/strings.xml",
            r#"<resources><string name="a">A</string></resources>"#,
        );

        let targets = scanner(&dir)
            .scan_language_add_targets(&ScanOptions::default(), &CancellationToken::new())
            .unwrap();
        assert_eq!(targets.len(), 2);
        assert_eq!(targets[0].module_name.as_deref(), Some("app"));
        assert_eq!(targets[0].existing_locale_tags, vec!["de".to_string()]);
        assert!(targets[0].has_locale("DE"));
        assert_eq!(targets[1].module_name.as_deref(), Some("core"));
        assert!(targets[1].existing_locale_tags.is_empty());
        assert!(targets[1].id.ends_with("|core|COMPOSE_RESOURCES"));
    }
}
