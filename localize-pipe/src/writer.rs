//! Surgical edits of `strings.xml` files
//!
//! Files are edited as raw text so comments and unrelated formatting survive.
//! Only the single `<string name="...">` element being written or removed is
//! touched.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe::writer::{remove_string_text, upsert_string_text};
//!
//! let xml = "<resources>\n</resources>\n";
//! let updated = upsert_string_text(xml, "title", "Einstellungen").unwrap();
//! assert!(updated.contains("<string name=\"title\">Einstellungen</string>\n</resources>"));
//!
//! let (restored, deleted) = remove_string_text(&updated, "title");
//! assert!(deleted);
//! assert_eq!(restored, xml);
//! ```

use crate::cancel::{CancellationToken, Cancelled};
use crate::classify::locale_folder_name;
use crate::error::{ResourceError, ResourceResult};
use crate::layout::STRINGS_FILE_NAME;
use crate::model::{
    ApplyResult, LanguageAddTarget, ResourceKind, StringEntryRow, TranslationDeleteTarget,
};
use quick_xml::escape::{escape, partial_escape, resolve_xml_entity};
use regex::{Captures, Regex};
use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::{debug, info, warn};

/// Content of a freshly created locale file
pub const EMPTY_RESOURCES: &str = "<resources>\n</resources>\n";

const CLOSING_TAG: &str = "</resources>";
const CLOSING_STRING: &str = "</string>";

static STRING_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<string(\s[^>]*?)?(/?)>").expect("string tag pattern"));

static NAME_ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?:^|\s)name\s*=\s*(?:"([^"]*)"|'([^']*)')"#).expect("name attribute pattern")
});

static ENTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&(?:#([0-9]+)|#[xX]([0-9a-fA-F]+)|([A-Za-z][A-Za-z0-9]*));").expect("entity pattern")
});

// ========== Text Normalization ==========

/// Whether a character may appear in an XML 1.0 document
pub fn is_xml_legal_char(ch: char) -> bool {
    matches!(ch, '\t' | '\n' | '\r') || (ch >= ' ' && ch != '\u{FFFE}' && ch != '\u{FFFF}')
}

/// Remove characters that cannot appear in an XML 1.0 document
pub fn strip_illegal_xml_chars(text: &str) -> String {
    text.chars().filter(|&ch| is_xml_legal_char(ch)).collect()
}

/// Resolve the predefined entities and numeric character references
///
/// Unknown named entities and malformed references are left untouched.
pub fn unescape_entities(text: &str) -> String {
    ENTITY
        .replace_all(text, |caps: &Captures| {
            let resolved = if let Some(decimal) = caps.get(1) {
                decimal
                    .as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
            } else {
                caps.get(3)
                    .and_then(|name| resolve_xml_entity(name.as_str()))
                    .map(String::from)
            };
            resolved.unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn normalize_whitespace(text: &str) -> String {
    text.chars()
        .filter(|ch| {
            !matches!(
                ch,
                '\u{200B}' | '\u{200C}' | '\u{200D}' | '\u{2060}' | '\u{FEFF}'
            )
        })
        .map(|ch| match ch {
            '\u{00A0}' | '\u{2007}' | '\u{202F}' => ' ',
            other => other,
        })
        .collect()
}

/// Prepare model output for storage in a resource file of the given kind
///
/// Entities are unescaped, illegal control characters removed, the NBSP
/// family folded to plain spaces and zero-width characters dropped. Android
/// resources then get aapt2-compatible escapes: apostrophes are backslash
/// escaped, stray backslashes doubled and a leading `@` or `?` escaped.
/// Compose resources keep apostrophes literal.
///
/// # Example
///
/// ```ignore
/// assert_eq!(
///     normalize_for_write("Position de l'image NFC", ResourceKind::AndroidRes),
///     "Position de l\\'image NFC"
/// );
/// ```
pub fn normalize_for_write(text: &str, kind: ResourceKind) -> String {
    let unescaped = unescape_entities(text);
    let cleaned = normalize_whitespace(&strip_illegal_xml_chars(&unescaped));
    let trimmed = cleaned.trim_end_matches(['\r', '\n']);
    match kind {
        ResourceKind::AndroidRes => escape_android(trimmed),
        ResourceKind::ComposeResources => trimmed.to_string(),
    }
}

fn is_hex_escape(chars: &[char], backslash: usize) -> bool {
    chars.len() > backslash + 5 && chars[backslash + 2..backslash + 6].iter().all(char::is_ascii_hexdigit)
}

fn escape_android(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }

    let chars: Vec<char> = input.chars().collect();
    let mut sanitized: Vec<char> = Vec::with_capacity(chars.len() + 8);
    let mut index = 0;
    while index < chars.len() {
        let ch = chars[index];
        if ch != '\\' {
            sanitized.push(ch);
            index += 1;
            continue;
        }
        let keep_escape = match chars.get(index + 1) {
            Some('n' | 't' | 'r' | '\'' | '"' | '@' | '?' | '\\') => true,
            Some('u') => is_hex_escape(&chars, index),
            _ => false,
        };
        if keep_escape {
            sanitized.push('\\');
            sanitized.push(chars[index + 1]);
            index += 2;
        } else {
            sanitized.push('\\');
            sanitized.push('\\');
            index += 1;
        }
    }

    let mut escaped = String::with_capacity(sanitized.len() + 4);
    for (i, &ch) in sanitized.iter().enumerate() {
        if ch == '\'' && (i == 0 || sanitized[i - 1] != '\\') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }

    if escaped.starts_with('@') || escaped.starts_with('?') {
        escaped.insert(0, '\\');
    }
    escaped
}

// ========== Element Surgery ==========

struct StringElement {
    range: Range<usize>,
    attributes: String,
}

/// Byte ranges of `<!-- ... -->` comments; an unterminated comment runs to the end
fn comment_ranges(text: &str) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut offset = 0;
    while let Some(start) = text[offset..].find("<!--").map(|index| offset + index) {
        let end = text[start + 4..]
            .find("-->")
            .map(|index| start + 4 + index + 3)
            .unwrap_or(text.len());
        ranges.push(start..end);
        offset = end;
    }
    ranges
}

fn find_string_element(text: &str, key: &str) -> Option<StringElement> {
    let comments = comment_ranges(text);
    for caps in STRING_OPEN_TAG.captures_iter(text) {
        let whole = caps.get(0)?;
        if comments.iter().any(|comment| comment.contains(&whole.start())) {
            continue;
        }
        let attributes = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
        let name = NAME_ATTRIBUTE
            .captures(attributes)
            .and_then(|name| name.get(1).or_else(|| name.get(2)))
            .map(|value| unescape_entities(value.as_str()));
        if name.as_deref() != Some(key) {
            continue;
        }

        let self_closing = caps.get(2).is_some_and(|slash| !slash.as_str().is_empty());
        let end = if self_closing {
            whole.end()
        } else {
            whole.end() + text[whole.end()..].find(CLOSING_STRING)? + CLOSING_STRING.len()
        };
        return Some(StringElement {
            range: whole.start()..end,
            attributes: attributes.to_string(),
        });
    }
    None
}

/// Insert or replace the `<string>` element for `key`
///
/// An existing element keeps its attributes and only its content changes. A
/// new element is indented and placed just before the last `</resources>`.
/// Only `&`, `<` and `>` are escaped in the value.
///
/// # Returns
///
/// * `Some(text)` - The updated document
/// * `None` - The text is not blank but has no `</resources>` to insert into
pub fn upsert_string_text(current_text: &str, key: &str, translated_text: &str) -> Option<String> {
    let escaped_value = partial_escape(translated_text);

    if let Some(element) = find_string_element(current_text, key) {
        let mut updated = String::with_capacity(current_text.len() + escaped_value.len());
        updated.push_str(&current_text[..element.range.start]);
        updated.push_str(&format!(
            "<string{}>{}</string>",
            element.attributes, escaped_value
        ));
        updated.push_str(&current_text[element.range.end..]);
        return Some(updated);
    }

    let insert = format!(
        "    <string name=\"{}\">{}</string>\n",
        escape(key),
        escaped_value
    );
    match current_text.rfind(CLOSING_TAG) {
        Some(closing_index) => {
            let prefix = &current_text[..closing_index];
            let mut updated = String::with_capacity(current_text.len() + insert.len() + 1);
            updated.push_str(prefix);
            if !prefix.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(&insert);
            updated.push_str(&current_text[closing_index..]);
            Some(updated)
        }
        None if current_text.trim().is_empty() => Some(format!("<resources>\n{}</resources>\n", insert)),
        None => None,
    }
}

/// Delete the `<string>` element for `key` together with its line
///
/// Returns the updated text and whether an element was removed. A missing
/// key returns the input unchanged.
pub fn remove_string_text(current_text: &str, key: &str) -> (String, bool) {
    let Some(element) = find_string_element(current_text, key) else {
        return (current_text.to_string(), false);
    };

    let line_start = current_text[..element.range.start]
        .rfind('\n')
        .map(|index| index + 1)
        .unwrap_or(0);
    let leading = &current_text[line_start..element.range.start];
    let start = if leading.chars().all(|c| c == ' ' || c == '\t') {
        line_start
    } else {
        element.range.start
    };

    let rest = &current_text[element.range.end..];
    let trailing_spaces = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let after_spaces = &rest[trailing_spaces..];
    let end = if after_spaces.starts_with("\r\n") {
        element.range.end + trailing_spaces + 2
    } else if after_spaces.starts_with('\n') {
        element.range.end + trailing_spaces + 1
    } else {
        element.range.end
    };

    let mut updated = String::with_capacity(current_text.len());
    updated.push_str(&current_text[..start]);
    updated.push_str(&current_text[end..]);
    (updated, true)
}

// ========== File Operations ==========

fn read_file(path: &Path) -> ResourceResult<String> {
    fs::read_to_string(path).map_err(|e| ResourceError::io(path, e))
}

fn write_file(path: &Path, content: &str) -> ResourceResult<()> {
    fs::write(path, content).map_err(|e| ResourceError::io(path, e))
}

/// Create `values-<qualifier>/strings.xml` under a resource root
///
/// # Returns
///
/// The file path and whether anything had to be created. Existing non-empty
/// files are left alone; empty ones are seeded with [`EMPTY_RESOURCES`].
pub fn create_locale_file(resource_root_path: &str, qualifier_raw: &str) -> ResourceResult<(PathBuf, bool)> {
    let root = Path::new(resource_root_path);
    if !root.is_dir() {
        return Err(ResourceError::ResourceRootMissing(resource_root_path.to_string()));
    }

    let folder = root.join(locale_folder_name(qualifier_raw));
    fs::create_dir_all(&folder).map_err(|e| ResourceError::io(&folder, e))?;

    let file = folder.join(STRINGS_FILE_NAME);
    let is_empty = match fs::metadata(&file) {
        Ok(metadata) => metadata.len() == 0,
        Err(_) => true,
    };
    if is_empty {
        write_file(&file, EMPTY_RESOURCES)?;
        debug!("Created locale file {}", file.display());
    }
    Ok((file, is_empty))
}

/// File a row's translation should be written to, created on demand
pub fn ensure_locale_file(row: &StringEntryRow) -> ResourceResult<PathBuf> {
    match row.locale_file_path.as_deref() {
        Some(path) => {
            let path = PathBuf::from(path);
            if path.is_file() {
                Ok(path)
            } else {
                Err(ResourceError::LocaleFileMissing(path.display().to_string()))
            }
        }
        None => create_locale_file(&row.resource_root_path, &row.locale_qualifier_raw).map(|(path, _)| path),
    }
}

/// Normalize `translated_text` for `kind` and upsert it into the file at `path`
pub fn upsert_string_in_file(
    path: &Path,
    key: &str,
    translated_text: &str,
    kind: ResourceKind,
) -> ResourceResult<()> {
    let normalized = normalize_for_write(translated_text, kind);
    let current = read_file(path)?;
    let updated = upsert_string_text(&current, key, &normalized)
        .ok_or_else(|| ResourceError::InvalidResources(path.display().to_string()))?;
    write_file(path, &updated)
}

/// Write the proposed text of every row into its locale file
///
/// Rows with a blank proposal are skipped but still counted as processed.
/// A failing row is recorded as `"{key} ({locale}): {error}"` and does not
/// stop the batch.
///
/// # Arguments
///
/// * `rows` - Rows to persist, in write order
/// * `on_progress` - Called with (processed, applied) after every row
/// * `cancel` - Checked before every row
pub fn apply_rows(
    rows: &[StringEntryRow],
    mut on_progress: impl FnMut(usize, usize),
    cancel: &CancellationToken,
) -> Result<ApplyResult, Cancelled> {
    info!("Apply operation started (rows={})", rows.len());
    let mut result = ApplyResult::default();
    let mut processed = 0;

    for row in rows {
        cancel.check()?;
        let proposed = row.proposed_text.as_deref().unwrap_or_default();
        if !proposed.trim().is_empty() {
            let outcome = ensure_locale_file(row)
                .and_then(|path| upsert_string_in_file(&path, &row.key, proposed, row.origin_kind));
            match outcome {
                Ok(()) => result.applied_count += 1,
                Err(e) => {
                    warn!(
                        "Failed to apply translation for key='{}' locale='{}': {}",
                        row.key, row.locale_tag, e
                    );
                    result.errors.push(format!("{} ({}): {}", row.key, row.locale_tag, e));
                }
            }
        }
        processed += 1;
        on_progress(processed, result.applied_count);
    }

    info!(
        "Apply operation completed (processed={}, applied={}, errors={})",
        processed,
        result.applied_count,
        result.errors.len()
    );
    Ok(result)
}

/// Remove a key from every locale file listed in a delete target
///
/// Each file is handled independently; `applied_count` counts files that
/// actually changed.
pub fn delete_translations(
    target: &TranslationDeleteTarget,
    mut on_progress: impl FnMut(usize, usize),
    cancel: &CancellationToken,
) -> Result<ApplyResult, Cancelled> {
    let mut result = ApplyResult::default();

    for (index, entry) in target.locale_entries.iter().enumerate() {
        cancel.check()?;
        let path = Path::new(&entry.locale_file_path);
        let outcome = read_file(path).and_then(|current| {
            let (updated, deleted) = remove_string_text(&current, &target.key);
            if deleted {
                write_file(path, &updated)?;
            }
            Ok(deleted)
        });
        match outcome {
            Ok(true) => result.applied_count += 1,
            Ok(false) => debug!(
                "Key '{}' already absent from {}",
                target.key, entry.locale_file_path
            ),
            Err(e) => {
                warn!(
                    "Failed to delete key='{}' locale='{}': {}",
                    target.key, entry.locale_tag, e
                );
                result.errors.push(format!("{} ({}): {}", target.key, entry.locale_tag, e));
            }
        }
        on_progress(index + 1, result.applied_count);
    }

    Ok(result)
}

/// Outcome of creating a locale in several resource roots
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddLanguageResult {
    pub created_paths: Vec<PathBuf>,
    pub skipped_count: usize,
    pub errors: Vec<String>,
}

/// Create empty locale files for `locale_tag` in each target lacking it
///
/// Targets that already have the locale are skipped, not reported as errors.
pub fn create_locale_files(
    targets: &[LanguageAddTarget],
    locale_tag: &str,
    qualifier_raw: &str,
    cancel: &CancellationToken,
) -> Result<AddLanguageResult, Cancelled> {
    let mut result = AddLanguageResult::default();

    for target in targets {
        cancel.check()?;
        if target.has_locale(locale_tag) {
            result.skipped_count += 1;
            continue;
        }
        match create_locale_file(&target.resource_root_path, qualifier_raw) {
            Ok((path, true)) => result.created_paths.push(path),
            Ok((_, false)) => result.skipped_count += 1,
            Err(e) => {
                warn!(
                    "Failed to add locale '{}' to {}: {}",
                    locale_tag, target.resource_root_path, e
                );
                result
                    .errors
                    .push(format!("{} ({}): {}", target.resource_root_path, locale_tag, e));
            }
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RowStatus, TranslationDeleteLocaleEntry};
    use tempfile::TempDir;

    // ========== Normalization Tests ==========

    #[test]
    fn test_android_apostrophe_is_escaped() {
        assert_eq!(
            normalize_for_write("Position de l'image NFC", ResourceKind::AndroidRes),
            "Position de l\\'image NFC"
        );
    }

    #[test]
    fn test_compose_apostrophe_stays_literal() {
        assert_eq!(
            normalize_for_write("Position de l'image NFC", ResourceKind::ComposeResources),
            "Position de l'image NFC"
        );
    }

    #[test]
    fn test_control_characters_are_stripped() {
        assert_eq!(
            normalize_for_write("Bon\u{0000}jour\u{0007} !", ResourceKind::AndroidRes),
            "Bonjour !"
        );
    }

    #[test]
    fn test_nbsp_family_becomes_space() {
        assert_eq!(
            normalize_for_write("a\u{00A0}b\u{202F}c\u{2007}d", ResourceKind::ComposeResources),
            "a b c d"
        );
        assert_eq!(
            normalize_for_write("\u{FEFF}zero\u{200B}width", ResourceKind::ComposeResources),
            "zerowidth"
        );
    }

    #[test]
    fn test_entities_are_unescaped_then_trimmed() {
        assert_eq!(
            normalize_for_write("Fish &amp; chips &#233;t&#xE9;\r\n", ResourceKind::ComposeResources),
            "Fish & chips été"
        );
        assert_eq!(unescape_entities("&unknown; & &lt;"), "&unknown; & <");
    }

    #[test]
    fn test_android_backslash_rules() {
        let android = |text: &str| normalize_for_write(text, ResourceKind::AndroidRes);
        assert_eq!(android(r"Line\nBreak"), r"Line\nBreak");
        assert_eq!(android(r"C:\path"), r"C:\\path");
        assert_eq!(android(r"trailing\"), r"trailing\\");
        assert_eq!(android(r"\u00e9"), r"\u00e9");
        assert_eq!(android(r"\u00zz"), r"\\u00zz");
        assert_eq!(android(r"already \' escaped"), r"already \' escaped");
    }

    #[test]
    fn test_android_reference_sigils() {
        assert_eq!(normalize_for_write("@string/x", ResourceKind::AndroidRes), r"\@string/x");
        assert_eq!(normalize_for_write("?attr", ResourceKind::AndroidRes), r"\?attr");
        assert_eq!(normalize_for_write("@home", ResourceKind::ComposeResources), "@home");
    }

    // ========== Upsert Tests ==========

    #[test]
    fn test_upsert_into_empty_resources() {
        let updated = upsert_string_text("<resources>\n</resources>\n", "settings_title", "Einstellungen").unwrap();
        assert!(updated.contains("<string name=\"settings_title\">Einstellungen</string>\n</resources>"));
        assert!(!updated.contains("\\n"));
        assert_eq!(
            updated,
            "<resources>\n    <string name=\"settings_title\">Einstellungen</string>\n</resources>\n"
        );
    }

    #[test]
    fn test_upsert_appends_on_new_line() {
        let updated = upsert_string_text("<resources><string name=\"a\">A</string></resources>", "b", "B").unwrap();
        assert!(updated.contains("</string>\n    <string name=\"b\">B</string>\n</resources>"));
    }

    #[test]
    fn test_upsert_replaces_existing_and_keeps_attributes() {
        let xml = "<resources>\n    <string formatted=\"false\" name=\"greet\">Hi <b>you</b></string>\n    <string name=\"greeting\">Hey</string>\n</resources>\n";
        let updated = upsert_string_text(xml, "greet", "Hallo").unwrap();
        assert!(updated.contains("<string formatted=\"false\" name=\"greet\">Hallo</string>"));
        assert!(updated.contains("<string name=\"greeting\">Hey</string>"));
    }

    #[test]
    fn test_upsert_self_closing_element() {
        let xml = "<resources>\n    <string name=\"empty\"/>\n    <string name=\"next\">N</string>\n</resources>\n";
        let updated = upsert_string_text(xml, "empty", "Leer").unwrap();
        assert!(updated.contains("<string name=\"empty\">Leer</string>\n    <string name=\"next\">N</string>"));
    }

    #[test]
    fn test_upsert_escapes_only_markup_characters() {
        let updated = upsert_string_text(EMPTY_RESOURCES, "q", "\"Fish\" & 'chips' <3").unwrap();
        assert!(updated.contains(">\"Fish\" &amp; 'chips' &lt;3<"));
        assert!(!updated.contains("&quot;"));
        assert!(!updated.contains("&apos;"));
        assert!(!updated.contains("&#39;"));
    }

    #[test]
    fn test_upsert_blank_and_broken_documents() {
        assert_eq!(
            upsert_string_text("", "a", "A").unwrap(),
            "<resources>\n    <string name=\"a\">A</string>\n</resources>\n"
        );
        assert_eq!(upsert_string_text("<resources>", "a", "A"), None);
    }

    #[test]
    fn test_upsert_skips_commented_out_duplicate() {
        let xml = "<resources>\n    <!-- <string name=\"title\">Old</string> -->\n    <string name=\"title\">Titel</string>\n</resources>\n";
        let updated = upsert_string_text(xml, "title", "Neu").unwrap();
        assert_eq!(
            updated,
            "<resources>\n    <!-- <string name=\"title\">Old</string> -->\n    <string name=\"title\">Neu</string>\n</resources>\n"
        );
    }

    #[test]
    fn test_upsert_ignores_key_only_present_in_comment() {
        let xml = "<resources>\n    <!-- <string name=\"title\">Old</string> -->\n</resources>\n";
        let updated = upsert_string_text(xml, "title", "Neu").unwrap();
        assert!(updated.contains("<!-- <string name=\"title\">Old</string> -->"));
        assert!(updated.ends_with("    <string name=\"title\">Neu</string>\n</resources>\n"));
    }

    #[test]
    fn test_comment_ranges() {
        let text = "a<!--x-->b<!--y";
        assert_eq!(comment_ranges(text), vec![1..9, 10..15]);
        assert!(comment_ranges("<resources/>").is_empty());
    }

    // ========== Remove Tests ==========

    #[test]
    fn test_remove_skips_commented_out_duplicate() {
        let xml = "<resources>\n    <!-- <string name=\"title\">Old</string> -->\n    <string name=\"title\">Titel</string>\n</resources>\n";
        let (text, deleted) = remove_string_text(xml, "title");
        assert!(deleted);
        assert_eq!(
            text,
            "<resources>\n    <!-- <string name=\"title\">Old</string> -->\n</resources>\n"
        );

        let (unchanged, deleted) = remove_string_text(&text, "title");
        assert!(!deleted);
        assert_eq!(unchanged, text);
    }

    #[test]
    fn test_remove_after_upsert_restores_original() {
        let original = "<resources>\n    <!-- keep me -->\n    <string name=\"a\">A</string>\n</resources>\n";
        let updated = upsert_string_text(original, "b", "B").unwrap();
        let (restored, deleted) = remove_string_text(&updated, "b");
        assert!(deleted);
        assert_eq!(restored, original);
    }

    #[test]
    fn test_remove_missing_key_is_noop() {
        let original = "<resources>\n    <string name=\"a\">A</string>\n</resources>\n";
        let (text, deleted) = remove_string_text(original, "ab");
        assert!(!deleted);
        assert_eq!(text, original);
    }

    #[test]
    fn test_remove_inline_element() {
        let (text, deleted) = remove_string_text("<resources><string name=\"a\">A</string></resources>", "a");
        assert!(deleted);
        assert_eq!(text, "<resources></resources>");
    }

    // ========== File Operation Tests ==========

    fn row(root: &Path, locale_file: Option<String>, proposed: Option<&str>) -> StringEntryRow {
        let root = root.to_string_lossy().to_string();
        StringEntryRow {
            id: StringEntryRow::row_id(&root, "fr", "title"),
            key: "title".to_string(),
            base_text: "Settings".to_string(),
            localized_text: None,
            proposed_text: proposed.map(str::to_string),
            locale_tag: "fr".to_string(),
            locale_qualifier_raw: "fr".to_string(),
            locale_file_path: locale_file,
            resource_root_path: root,
            module_name: None,
            origin_kind: ResourceKind::AndroidRes,
            status: RowStatus::Ready,
            message: None,
        }
    }

    #[test]
    fn test_apply_creates_missing_locale_file() {
        let dir = TempDir::new().unwrap();
        let rows = vec![row(dir.path(), None, Some("Paramètres de l'app"))];
        let mut progress = Vec::new();
        let result = apply_rows(&rows, |p, a| progress.push((p, a)), &CancellationToken::new()).unwrap();

        assert_eq!(result.applied_count, 1);
        assert!(result.errors.is_empty());
        assert_eq!(progress, vec![(1, 1)]);
        let written = fs::read_to_string(dir.path().join("values-fr/strings.xml")).unwrap();
        assert_eq!(
            written,
            "<resources>\n    <string name=\"title\">Paramètres de l\\'app</string>\n</resources>\n"
        );
    }

    #[test]
    fn test_apply_records_errors_and_continues() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("values-de/strings.xml").to_string_lossy().to_string();
        let rows = vec![
            row(dir.path(), Some(missing), Some("Einstellungen")),
            row(dir.path(), None, Some("  ")),
            row(dir.path(), None, Some("Paramètres")),
        ];
        let result = apply_rows(&rows, |_, _| {}, &CancellationToken::new()).unwrap();
        assert_eq!(result.applied_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("title (fr): Locale file not found"));
    }

    #[test]
    fn test_apply_honours_cancellation() {
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();
        let rows = vec![row(dir.path(), None, Some("Paramètres"))];
        assert_eq!(apply_rows(&rows, |_, _| {}, &token), Err(Cancelled));
        assert!(!dir.path().join("values-fr").exists());
    }

    #[test]
    fn test_delete_translations_per_file() {
        let dir = TempDir::new().unwrap();
        let (de, _) = create_locale_file(&dir.path().to_string_lossy(), "de").unwrap();
        fs::write(&de, "<resources>\n    <string name=\"title\">Titel</string>\n</resources>\n").unwrap();
        let (fr, _) = create_locale_file(&dir.path().to_string_lossy(), "fr").unwrap();

        let entry = |tag: &str, path: &Path| TranslationDeleteLocaleEntry {
            locale_tag: tag.to_string(),
            locale_qualifier_raw: tag.to_string(),
            locale_file_path: path.to_string_lossy().to_string(),
        };
        let target = TranslationDeleteTarget {
            id: "t".to_string(),
            key: "title".to_string(),
            base_text: "Title".to_string(),
            resource_root_path: dir.path().to_string_lossy().to_string(),
            module_name: None,
            origin_kind: ResourceKind::AndroidRes,
            locale_entries: vec![
                entry("de", &de),
                entry("fr", &fr),
                entry("it", &dir.path().join("values-it/strings.xml")),
            ],
        };

        let result = delete_translations(&target, |_, _| {}, &CancellationToken::new()).unwrap();
        assert_eq!(result.applied_count, 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].starts_with("title (it)"));
        assert_eq!(fs::read_to_string(&de).unwrap(), EMPTY_RESOURCES);
    }

    #[test]
    fn test_create_locale_files_skips_existing() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().to_string_lossy().to_string();
        let targets = vec![
            LanguageAddTarget {
                id: "a".to_string(),
                resource_root_path: root.clone(),
                module_name: None,
                origin_kind: ResourceKind::AndroidRes,
                existing_locale_tags: vec!["de".to_string()],
            },
            LanguageAddTarget {
                id: "b".to_string(),
                resource_root_path: dir.path().join("missing").to_string_lossy().to_string(),
                module_name: None,
                origin_kind: ResourceKind::AndroidRes,
                existing_locale_tags: vec![],
            },
        ];

        let result = create_locale_files(&targets, "de", "de", &CancellationToken::new()).unwrap();
        assert_eq!(result.skipped_count, 1);
        assert!(result.created_paths.is_empty());
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].contains("Resource root not found"));

        let result = create_locale_files(&targets[..1], "pt-BR", "pt-rBR", &CancellationToken::new()).unwrap();
        assert_eq!(result.created_paths, vec![dir.path().join("values-pt-rBR/strings.xml")]);
        assert_eq!(
            fs::read_to_string(&result.created_paths[0]).unwrap(),
            EMPTY_RESOURCES
        );
    }
}
