//! Structural checks on model output
//!
//! A translation is accepted only when it keeps the printf placeholders and
//! simple markup tags of the source in the same order, is not blank, and can
//! be embedded in a resource file without breaking the XML.

use localize_pipe::writer::strip_illegal_xml_chars;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"%(?:\d+\$)?[#+ 0,(<]*\d*(?:\.\d+)?[a-zA-Z]").expect("placeholder pattern")
});

static SIMPLE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][A-Za-z0-9]*>").expect("tag pattern"));

static REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:#[0-9]+|#[xX][0-9a-fA-F]+|amp|lt|gt|quot|apos);").expect("reference pattern")
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationError {
    EmptyOutput,
    PlaceholdersChanged,
    TagsChanged,
    XmlUnsafe,
}

impl ValidationError {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationError::EmptyOutput => "EMPTY_OUTPUT",
            ValidationError::PlaceholdersChanged => "PLACEHOLDERS_CHANGED",
            ValidationError::TagsChanged => "TAGS_CHANGED",
            ValidationError::XmlUnsafe => "XML_UNSAFE",
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    /// Violations in check order, without duplicates
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn contains(&self, error: ValidationError) -> bool {
        self.errors.contains(&error)
    }

    /// `"PLACEHOLDERS_CHANGED, XML_UNSAFE"`
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(ValidationError::as_str)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Ordered printf-style placeholders (`%1$s`, `%d`, `%.2f`, ...)
pub fn extract_placeholders(text: &str) -> Vec<&str> {
    PLACEHOLDER.find_iter(text).map(|m| m.as_str()).collect()
}

/// Ordered simple open/close tags (`<b>`, `</i>`, ...)
pub fn extract_tags(text: &str) -> Vec<&str> {
    SIMPLE_TAG.find_iter(text).map(|m| m.as_str()).collect()
}

/// Escape `&` characters that do not start a predefined entity or a
/// character reference
pub fn escape_bare_ampersands(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    for (index, ch) in text.char_indices() {
        if ch == '&' && !REFERENCE.is_match(&text[index + 1..]) {
            escaped.push_str("&amp;");
        } else {
            escaped.push(ch);
        }
    }
    escaped
}

fn parses_as_string_content(text: &str) -> bool {
    let wrapped = format!("<resources><string name=\"x\">{}</string></resources>", text);
    roxmltree::Document::parse(&wrapped).is_ok()
}

/// Whether `text` can be embedded as the content of a `<string>` element
///
/// Illegal control characters are ignored. Bare ampersands in prose are
/// tolerated; broken markup is not.
pub fn is_xml_safe(text: &str) -> bool {
    let cleaned = strip_illegal_xml_chars(text);
    parses_as_string_content(&cleaned) || parses_as_string_content(&escape_bare_ampersands(&cleaned))
}

/// Run every check against a candidate translation
///
/// All checks run; none short-circuits the others.
///
/// # Example
///
/// ```ignore
/// let result = validate("Welcome, %1$s!", "Willkommen!");
/// assert!(!result.is_valid);
/// assert!(result.contains(ValidationError::PlaceholdersChanged));
/// ```
pub fn validate(base_text: &str, translated_text: &str) -> ValidationResult {
    let mut errors = Vec::new();

    if translated_text.trim().is_empty() {
        errors.push(ValidationError::EmptyOutput);
    }
    if extract_placeholders(base_text) != extract_placeholders(translated_text) {
        errors.push(ValidationError::PlaceholdersChanged);
    }
    if extract_tags(base_text) != extract_tags(translated_text) {
        errors.push(ValidationError::TagsChanged);
    }
    if !is_xml_safe(translated_text) {
        errors.push(ValidationError::XmlUnsafe);
    }

    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
    }
}
