//! Scan, diff and rewrite Android and Compose `strings.xml` resources
//!
//! This crate holds the file-side half of the localization pipeline:
//!
//! 1. **Classification** - recognise `values*/strings.xml` files of Android
//!    (`src/<variant>/res`) and Compose (`src/commonMain/composeResources`) roots
//! 2. **Scanning** - diff every locale folder against its base `values` folder
//!    and produce translation rows, delete targets and add-language targets
//! 3. **Writing** - surgically insert, replace or remove single `<string>`
//!    elements, creating locale folders on demand
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe::{CancellationToken, FilesystemLayout, ScanOptions, StringsXmlScanner};
//! use localize_pipe::writer::apply_rows;
//!
//! let token = CancellationToken::new();
//! let scanner = StringsXmlScanner::new(FilesystemLayout::new("."));
//! let mut rows = scanner.scan(&ScanOptions::default(), &token)?.rows;
//! for row in &mut rows {
//!     row.proposed_text = Some(format!("[{}] {}", row.locale_tag, row.base_text));
//! }
//! let result = apply_rows(&rows, |_, _| {}, &token)?;
//! println!("{} written", result.applied_count);
//! ```

pub mod cancel;
pub mod classify;
pub mod error;
pub mod extractor;
pub mod grouping;
pub mod layout;
pub mod locale;
pub mod model;
pub mod scanner;
pub mod writer;

// Re-export main types for convenient access
pub use cancel::{CancellationToken, Cancelled};
pub use classify::classify;
pub use error::{ResourceError, ResourceResult};
pub use extractor::{StringValues, extract};
pub use grouping::{GroupedStringRow, group_rows};
pub use layout::{FilesystemLayout, LocalizedStringsFile, ResourceLayout, module_for_path, scan_root};
pub use locale::{canonical_locale_tag, locale_tag_to_qualifier, qualifier_to_locale_tag};
pub use model::{
    ApplyResult, ClassifiedResourcePath, LanguageAddTarget, ResourceKind, RowStatus, ScanOptions,
    ScanResult, ScanScope, StringEntryRow, TranslationDeleteLocaleEntry, TranslationDeleteTarget,
};
pub use scanner::{StringsXmlScanner, diff_status};
pub use writer::{AddLanguageResult, normalize_for_write, remove_string_text, upsert_string_text};
