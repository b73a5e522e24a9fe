//! Key/value extraction from `strings.xml` content.

use std::collections::HashMap;
use tracing::debug;

/// Ordered `name → text` mapping of one resource file
///
/// Insertion order follows the document; a repeated key keeps its first
/// position but takes the later value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringValues {
    entries: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl StringValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: String, value: String) {
        match self.index.get(&key) {
            Some(&position) => self.entries[position].1 = value,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push((key, value));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .map(|&position| self.entries[position].1.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Entries ordered by key
    pub fn sorted(&self) -> Vec<(&str, &str)> {
        let mut sorted: Vec<(&str, &str)> = self.iter().collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));
        sorted
    }
}

/// Parse resource XML into its translatable strings
///
/// DTDs are rejected, so external entities are never resolved. Blank or
/// malformed input yields an empty mapping instead of an error.
///
/// # Arguments
///
/// * `xml_text` - Raw content of a `strings.xml` file
///
/// # Returns
///
/// Every `<string>` element with a non-blank `name` whose `translatable`
/// attribute is not `false` (any case), mapped to its text content.
pub fn extract(xml_text: &str) -> StringValues {
    let mut values = StringValues::new();
    if xml_text.trim().is_empty() {
        return values;
    }

    let document = match roxmltree::Document::parse(xml_text) {
        Ok(document) => document,
        Err(e) => {
            debug!("Ignoring malformed strings resource: {}", e);
            return values;
        }
    };

    for element in document
        .descendants()
        .filter(|node| node.is_element() && node.has_tag_name("string"))
    {
        let key = element.attribute("name").unwrap_or_default().trim();
        if key.is_empty() {
            continue;
        }
        if element
            .attribute("translatable")
            .is_some_and(|flag| flag.eq_ignore_ascii_case("false"))
        {
            continue;
        }

        let text: String = element
            .descendants()
            .filter(|node| node.is_text())
            .filter_map(|node| node.text())
            .collect();
        values.insert(key.to_string(), text);
    }

    values
}
