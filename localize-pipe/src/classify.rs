//! Path classification for `strings.xml` resource files.

use crate::locale::qualifier_to_locale_tag;
use crate::model::{ClassifiedResourcePath, ResourceKind};
use regex::Regex;
use std::sync::LazyLock;

static ANDROID_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*/src/[^/]+/res)/(values(?:-[^/]+)?)/strings\.xml$").expect("android path pattern")
});

static COMPOSE_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*/src/commonMain/composeResources)/(values(?:-[^/]+)?)/strings\.xml$")
        .expect("compose path pattern")
});

/// Classify a `/`-separated path as an Android or Compose string resource
///
/// The Android grammar is tried first. Paths matching neither grammar are not
/// localization files and yield `None`.
///
/// # Example
///
/// ```ignore
/// let classified = classify("/p/app/src/main/res/values-de/strings.xml").unwrap();
/// assert_eq!(classified.resource_root_path, "/p/app/src/main/res");
/// assert_eq!(classified.normalized_locale_tag.as_deref(), Some("de"));
/// ```
pub fn classify(path: &str) -> Option<ClassifiedResourcePath> {
    [
        (&*ANDROID_PATH, ResourceKind::AndroidRes),
        (&*COMPOSE_PATH, ResourceKind::ComposeResources),
    ]
    .into_iter()
    .find_map(|(pattern, kind)| {
        let captures = pattern.captures(path)?;
        let resource_root_path = captures.get(1)?.as_str().to_string();
        let folder_name = captures.get(2)?.as_str().to_string();
        let qualifier_raw = qualifier_of(&folder_name).to_string();
        Some(ClassifiedResourcePath {
            normalized_locale_tag: qualifier_to_locale_tag(&qualifier_raw),
            resource_root_path,
            kind,
            folder_name,
            qualifier_raw,
        })
    })
}

/// `values` → `""`, `values-pt-rBR` → `"pt-rBR"`
pub fn qualifier_of(folder_name: &str) -> &str {
    let rest = folder_name.strip_prefix("values").unwrap_or(folder_name);
    rest.strip_prefix('-').unwrap_or(rest)
}

/// Folder name for a locale qualifier inside a resource root
pub fn locale_folder_name(qualifier_raw: &str) -> String {
    let folder = format!("values-{}", qualifier_raw);
    folder.trim_end_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_android_base_file() {
        let classified = classify("/p/app/src/main/res/values/strings.xml").unwrap();
        assert_eq!(classified.resource_root_path, "/p/app/src/main/res");
        assert_eq!(classified.kind, ResourceKind::AndroidRes);
        assert_eq!(classified.folder_name, "values");
        assert_eq!(classified.qualifier_raw, "");
        assert_eq!(classified.normalized_locale_tag, None);
    }

    #[test]
    fn test_android_locale_file() {
        let classified = classify("/p/app/src/debug/res/values-pt-rBR/strings.xml").unwrap();
        assert_eq!(classified.resource_root_path, "/p/app/src/debug/res");
        assert_eq!(classified.folder_name, "values-pt-rBR");
        assert_eq!(classified.qualifier_raw, "pt-rBR");
        assert_eq!(classified.normalized_locale_tag.as_deref(), Some("pt-BR"));
    }

    #[test]
    fn test_compose_file() {
        let classified =
            classify("/p/shared/src/commonMain/composeResources/values-de/strings.xml").unwrap();
        assert_eq!(
            classified.resource_root_path,
            "/p/shared/src/commonMain/composeResources"
        );
        assert_eq!(classified.kind, ResourceKind::ComposeResources);
        assert_eq!(classified.normalized_locale_tag.as_deref(), Some("de"));
    }

    #[test]
    fn test_bcp47_locale_folder() {
        let classified = classify("/p/app/src/main/res/values-b+zh+Hant/strings.xml").unwrap();
        assert_eq!(classified.qualifier_raw, "b+zh+Hant");
        assert_eq!(classified.normalized_locale_tag.as_deref(), Some("zh-Hant"));
    }

    #[test]
    fn test_non_locale_qualifier_keeps_raw() {
        let classified = classify("/p/app/src/main/res/values-night/strings.xml").unwrap();
        assert_eq!(classified.qualifier_raw, "night");
        assert_eq!(classified.normalized_locale_tag, None);
    }

    #[test]
    fn test_unrelated_paths() {
        assert!(classify("/p/app/src/main/res/values/colors.xml").is_none());
        assert!(classify("/p/app/res/values/strings.xml").is_none());
        assert!(classify("/p/app/src/main/res/layout/strings.xml").is_none());
        assert!(classify("/p/app/src/main/res/values/strings.xml.bak").is_none());
    }

    #[test]
    fn test_folder_helpers() {
        assert_eq!(qualifier_of("values"), "");
        assert_eq!(qualifier_of("values-fr"), "fr");
        assert_eq!(locale_folder_name("fr-rCA"), "values-fr-rCA");
        assert_eq!(locale_folder_name(""), "values");
    }
}
