//! Conversion between Android folder qualifiers and locale tags
//!
//! Android encodes a locale in the resource folder name (`values-pt-rBR`),
//! while the rest of the pipeline works with BCP-47 style tags (`pt-BR`).
//! Tags with a script or a numeric region use the `b+` form
//! (`values-b+sr+Latn`, `values-b+es+419`).
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe::locale::{locale_tag_to_qualifier, qualifier_to_locale_tag};
//!
//! assert_eq!(qualifier_to_locale_tag("pt-rBR").as_deref(), Some("pt-BR"));
//! assert_eq!(locale_tag_to_qualifier("pt-BR"), "pt-rBR");
//! ```

use icu_locale::LanguageIdentifier;

fn is_language_chunk(chunk: &str) -> bool {
    (2..=3).contains(&chunk.len()) && chunk.chars().all(|c| c.is_ascii_lowercase())
}

fn is_region_chunk(chunk: &str) -> bool {
    chunk.len() == 3
        && chunk.starts_with('r')
        && chunk[1..].chars().all(|c| c.is_ascii_alphabetic())
}

fn is_script_subtag(subtag: &str) -> bool {
    subtag.len() == 4 && subtag.chars().all(|c| c.is_ascii_alphabetic())
}

fn is_region_subtag(subtag: &str) -> bool {
    (subtag.len() == 2 && subtag.chars().all(|c| c.is_ascii_alphabetic()))
        || (subtag.len() == 3 && subtag.chars().all(|c| c.is_ascii_digit()))
}

fn title_case(subtag: &str) -> String {
    let lower = subtag.to_ascii_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// `b+sr+Latn` → `sr-Latn`, `b+zh+Hant+TW` → `zh-Hant-TW`
fn bcp47_qualifier_to_tag(qualifier: &str) -> Option<String> {
    let mut subtags = qualifier.strip_prefix("b+")?.split('+');
    let language = subtags.next()?.to_lowercase();
    if !is_language_chunk(&language) {
        return None;
    }

    let mut tag = language;
    let mut next = subtags.next();
    if let Some(script) = next.filter(|subtag| is_script_subtag(subtag)) {
        tag.push('-');
        tag.push_str(&title_case(script));
        next = subtags.next();
    }
    if let Some(region) = next.filter(|subtag| is_region_subtag(subtag)) {
        tag.push('-');
        tag.push_str(&region.to_uppercase());
    }
    Some(tag)
}

/// Convert a folder qualifier (the part after `values-`) to a locale tag
///
/// # Arguments
///
/// * `qualifier_raw` - Qualifier such as `"de"`, `"pt-rBR"` or `"night"`
///
/// # Returns
///
/// * `Some(tag)` - `"lang"`, `"lang-REGION"` or, for `b+` qualifiers,
///   `"lang-Script-REGION"`
/// * `None` - For the base folder (blank qualifier) or qualifiers that do not
///   start with a language chunk
pub fn qualifier_to_locale_tag(qualifier_raw: &str) -> Option<String> {
    if qualifier_raw.trim().is_empty() {
        return None;
    }
    if qualifier_raw.starts_with("b+") {
        let locale_part = qualifier_raw.split('-').next().unwrap_or_default();
        return bcp47_qualifier_to_tag(locale_part);
    }

    let mut chunks = qualifier_raw.split('-');
    let language = chunks.next()?.to_lowercase();
    if !is_language_chunk(&language) {
        return None;
    }

    match chunks.find(|chunk| is_region_chunk(chunk)) {
        Some(region) => Some(format!("{}-{}", language, region[1..].to_uppercase())),
        None => Some(language),
    }
}

/// Convert a locale tag back to the folder qualifier Android expects
///
/// Underscores are accepted as separators. A plain two-letter region gives
/// the `lang-rREGION` form; a script or numeric region switches to the
/// `b+lang+Script+REGION` form aapt2 expects.
///
/// ```ignore
/// assert_eq!(locale_tag_to_qualifier("pt_br"), "pt-rBR");
/// assert_eq!(locale_tag_to_qualifier("tr"), "tr");
/// assert_eq!(locale_tag_to_qualifier("zh-Hant"), "b+zh+Hant");
/// ```
pub fn locale_tag_to_qualifier(locale_tag: &str) -> String {
    let normalized = locale_tag.replace('_', "-");
    let normalized = normalized.trim();
    let parts: Vec<&str> = normalized
        .split('-')
        .filter(|part| !part.trim().is_empty())
        .collect();

    let language = parts
        .first()
        .map(|part| part.to_lowercase())
        .unwrap_or_else(|| normalized.to_lowercase());

    match parts.get(1..).unwrap_or_default() {
        [] => language,
        [region] if region.len() == 2 => format!("{}-r{}", language, region.to_uppercase()),
        rest => {
            let mut qualifier = format!("b+{}", language);
            for subtag in rest {
                qualifier.push('+');
                if is_script_subtag(subtag) {
                    qualifier.push_str(&title_case(subtag));
                } else {
                    qualifier.push_str(&subtag.to_uppercase());
                }
            }
            qualifier
        }
    }
}

/// Canonicalize user supplied locale input (`"PT_br"` → `"pt-BR"`)
///
/// Returns `None` when the input is not a syntactically valid language
/// identifier.
pub fn canonical_locale_tag(input: &str) -> Option<String> {
    let candidate = input.trim().replace('_', "-");
    if candidate.is_empty() {
        return None;
    }
    candidate
        .parse::<LanguageIdentifier>()
        .ok()
        .map(|langid| langid.to_string())
}
