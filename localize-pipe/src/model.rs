//! Data types shared by the scanner, the writer and the translation layer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Which resource grammar a `strings.xml` file belongs to
///
/// The kind decides both the path pattern used to classify a file and the
/// escaping rules applied when a translation is written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// `src/<variant>/res/values*/strings.xml`
    AndroidRes,
    /// `src/commonMain/composeResources/values*/strings.xml`
    ComposeResources,
}

impl ResourceKind {
    /// Stable identifier, also used as the primary sort key of scanned files
    pub fn name(&self) -> &'static str {
        match self {
            ResourceKind::AndroidRes => "ANDROID_RES",
            ResourceKind::ComposeResources => "COMPOSE_RESOURCES",
        }
    }

    /// Short human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ResourceKind::AndroidRes => "Android",
            ResourceKind::ComposeResources => "Compose",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanScope {
    #[default]
    WholeProject,
    CurrentModule,
}

impl ScanScope {
    pub fn label(&self) -> &'static str {
        match self {
            ScanScope::WholeProject => "Project",
            ScanScope::CurrentModule => "Module",
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            ScanScope::WholeProject => ScanScope::CurrentModule,
            ScanScope::CurrentModule => ScanScope::WholeProject,
        }
    }
}

/// Lifecycle state of a single (key, locale) row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowStatus {
    /// The target locale has no entry for the key
    Missing,
    /// The target locale repeats the base text verbatim
    Identical,
    /// A validated translation is waiting to be written
    Ready,
    /// Translation or validation failed for this row
    Error,
    /// Already translated; never surfaced by the scanner
    UpToDate,
}

impl RowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RowStatus::Missing => "MISSING",
            RowStatus::Identical => "IDENTICAL",
            RowStatus::Ready => "READY",
            RowStatus::Error => "ERROR",
            RowStatus::UpToDate => "UP_TO_DATE",
        }
    }

    /// Rows in these states are sent to the translation backend
    pub fn needs_translation(&self) -> bool {
        matches!(self, RowStatus::Missing | RowStatus::Identical)
    }
}

impl fmt::Display for RowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options controlling which files a scan looks at and which rows it keeps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOptions {
    pub scope: ScanScope,
    pub include_android_resources: bool,
    pub include_compose_resources: bool,
    pub include_identical_to_base: bool,
    /// Module used when `scope` is `CurrentModule`; `None` scans everything
    pub current_module_name: Option<String>,
    /// Locale tags to diff even in groups that have no file for them yet
    pub requested_locales: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            scope: ScanScope::WholeProject,
            include_android_resources: true,
            include_compose_resources: true,
            include_identical_to_base: false,
            current_module_name: None,
            requested_locales: Vec::new(),
        }
    }
}

impl ScanOptions {
    pub fn includes_kind(&self, kind: ResourceKind) -> bool {
        match kind {
            ResourceKind::AndroidRes => self.include_android_resources,
            ResourceKind::ComposeResources => self.include_compose_resources,
        }
    }

    pub fn includes_module(&self, module_name: Option<&str>) -> bool {
        if self.scope == ScanScope::WholeProject {
            return true;
        }
        match self.current_module_name.as_deref() {
            Some(current) => module_name == Some(current),
            None => true,
        }
    }
}

/// Result of classifying one path against the two resource grammars
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedResourcePath {
    pub resource_root_path: String,
    pub kind: ResourceKind,
    pub folder_name: String,
    pub qualifier_raw: String,
    pub normalized_locale_tag: Option<String>,
}

/// One (key, target locale) pair under consideration for translation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringEntryRow {
    /// `resource_root_path|locale_tag|key`, stable across rescans
    pub id: String,
    pub key: String,
    pub base_text: String,
    pub localized_text: Option<String>,
    pub proposed_text: Option<String>,
    pub locale_tag: String,
    pub locale_qualifier_raw: String,
    /// Absent when the locale folder does not exist yet
    pub locale_file_path: Option<String>,
    pub resource_root_path: String,
    pub module_name: Option<String>,
    pub origin_kind: ResourceKind,
    pub status: RowStatus,
    pub message: Option<String>,
}

impl StringEntryRow {
    pub fn row_id(resource_root_path: &str, locale_tag: &str, key: &str) -> String {
        format!("{}|{}|{}", resource_root_path, locale_tag, key)
    }

    /// A row carrying a proposed text that has not failed can be written as-is
    pub fn is_writable(&self) -> bool {
        self.status != RowStatus::Error
            && self
                .proposed_text
                .as_deref()
                .is_some_and(|text| !text.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    pub rows: Vec<StringEntryRow>,
    pub detected_locales: BTreeSet<String>,
}

/// One locale file that currently translates a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationDeleteLocaleEntry {
    pub locale_tag: String,
    pub locale_qualifier_raw: String,
    pub locale_file_path: String,
}

/// A key that can be removed from every locale translating it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationDeleteTarget {
    pub id: String,
    pub key: String,
    pub base_text: String,
    pub resource_root_path: String,
    pub module_name: Option<String>,
    pub origin_kind: ResourceKind,
    pub locale_entries: Vec<TranslationDeleteLocaleEntry>,
}

/// A resource root where a brand-new locale can be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageAddTarget {
    pub id: String,
    pub resource_root_path: String,
    pub module_name: Option<String>,
    pub origin_kind: ResourceKind,
    pub existing_locale_tags: Vec<String>,
}

impl LanguageAddTarget {
    pub fn has_locale(&self, locale_tag: &str) -> bool {
        self.existing_locale_tags
            .iter()
            .any(|existing| existing.eq_ignore_ascii_case(locale_tag))
    }
}

/// Outcome of a batch of file writes (apply, delete, add-language)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplyResult {
    pub applied_count: usize,
    pub errors: Vec<String>,
}
