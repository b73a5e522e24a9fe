//! Locale tag to TranslateGemma language code mapping
//!
//! TranslateGemma accepts bare ISO 639 languages plus a fixed table of
//! script/region variants. Resolution keeps the most specific supported
//! form and otherwise falls back to the bare language.
//!
//! # Example
//!
//! ```ignore
//! use localize_pipe_mt::language::to_backend_code;
//!
//! assert_eq!(to_backend_code("pt_BR").as_deref(), Some("pt-BR"));
//! assert_eq!(to_backend_code("zh-Hant").as_deref(), Some("zh-TW"));
//! assert_eq!(to_backend_code("fr-FR").as_deref(), Some("fr"));
//! assert_eq!(to_backend_code("xx-ZZ"), None);
//! ```

use icu_locale::LanguageIdentifier;
use regex::Regex;
use std::sync::LazyLock;

/// Script and region variants the model knows by their full tag
const SUPPORTED_EXACT_TAGS: &[&str] = &[
    "ar-EG", "ar-MA", "ber-Latn", "bjn-Arab", "bm-Nkoo", "ccp-Latn", "crh-Latn", "fa-AF", "fr-CA",
    "grt-Latn", "hoc-Wara", "iu-Latn", "ks-Deva", "lif-Limb", "mni-Mtei", "ms-Arab", "ndc-ZW",
    "pa-Arab", "pt-BR", "pt-PT", "rhg-Latn", "sat-Latn", "sd-Deva", "sr-Cyrl", "sr-Latn", "sw-KE",
    "sw-TZ", "unr-Deva", "xsr-Tibt", "zh-CN", "zh-TW",
];

/// Common Chinese tags folded onto the two supported variants
const ALIASES: &[(&str, &str)] = &[
    ("zh-SG", "zh-CN"),
    ("zh-Hans", "zh-CN"),
    ("zh-HK", "zh-TW"),
    ("zh-MO", "zh-TW"),
    ("zh-Hant", "zh-TW"),
];

/// ISO 639-1 two-letter language codes
const ISO_639_1: &[&str] = &[
    "aa", "ab", "ae", "af", "ak", "am", "an", "ar", "as", "av", "ay", "az", "ba", "be", "bg", "bh",
    "bi", "bm", "bn", "bo", "br", "bs", "ca", "ce", "ch", "co", "cr", "cs", "cu", "cv", "cy", "da",
    "de", "dv", "dz", "ee", "el", "en", "eo", "es", "et", "eu", "fa", "ff", "fi", "fj", "fo", "fr",
    "fy", "ga", "gd", "gl", "gn", "gu", "gv", "ha", "he", "hi", "ho", "hr", "ht", "hu", "hy", "hz",
    "ia", "id", "ie", "ig", "ii", "ik", "io", "is", "it", "iu", "ja", "jv", "ka", "kg", "ki", "kj",
    "kk", "kl", "km", "kn", "ko", "kr", "ks", "ku", "kv", "kw", "ky", "la", "lb", "lg", "li", "ln",
    "lo", "lt", "lu", "lv", "mg", "mh", "mi", "mk", "ml", "mn", "mr", "ms", "mt", "my", "na", "nb",
    "nd", "ne", "ng", "nl", "nn", "no", "nr", "nv", "ny", "oc", "oj", "om", "or", "os", "pa", "pi",
    "pl", "ps", "pt", "qu", "rm", "rn", "ro", "ru", "rw", "sa", "sc", "sd", "se", "sg", "si", "sk",
    "sl", "sm", "sn", "so", "sq", "sr", "ss", "st", "su", "sv", "sw", "ta", "te", "tg", "th", "ti",
    "tk", "tl", "tn", "to", "tr", "ts", "tt", "tw", "ty", "ug", "uk", "ur", "uz", "ve", "vi", "vo",
    "wa", "wo", "xh", "yi", "yo", "za", "zh", "zu",
];

static NLLB_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z]{3}_[A-Za-z]{4}$").expect("nllb code pattern"));

pub fn is_iso639_1(code: &str) -> bool {
    ISO_639_1.binary_search(&code).is_ok()
}

fn lookup(tag: &str) -> Option<String> {
    if let Some((_, target)) = ALIASES.iter().find(|(alias, _)| *alias == tag) {
        return Some((*target).to_string());
    }
    SUPPORTED_EXACT_TAGS
        .contains(&tag)
        .then(|| tag.to_string())
}

/// `pt_br` → `pt-BR`, `zh-hant` → `zh-Hant`
fn normalize_tag(tag: &str) -> String {
    tag.replace('_', "-")
        .trim()
        .split('-')
        .filter(|part| !part.trim().is_empty())
        .enumerate()
        .map(|(index, part)| {
            let alphabetic = part.chars().all(|c| c.is_alphabetic());
            if index == 0 {
                part.to_lowercase()
            } else if part.chars().count() == 4 && alphabetic {
                let lower = part.to_lowercase();
                let mut chars = lower.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => lower,
                }
            } else if part.chars().count() == 2 && alphabetic {
                part.to_uppercase()
            } else {
                part.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Map a locale tag to the language code sent to the backend
///
/// Resolution order:
/// 1. NLLB-style codes (`eng_Latn`) pass through unchanged
/// 2. Aliases and exact supported tags after normalization
/// 3. language-Script-Region, language-Script, language-Region candidates
/// 4. Chinese falls back to `zh-TW` for Hant/TW/HK/MO and `zh-CN` otherwise
/// 5. Bare ISO 639-1 language, or any three-letter language
///
/// # Returns
///
/// `None` when the tag does not parse or the language is unknown.
pub fn to_backend_code(locale_tag: &str) -> Option<String> {
    let trimmed = locale_tag.trim();
    if NLLB_CODE.is_match(trimmed) {
        return Some(trimmed.to_string());
    }

    let normalized = normalize_tag(trimmed);
    if normalized.is_empty() {
        return None;
    }
    if let Some(code) = lookup(&normalized) {
        return Some(code);
    }

    let identifier: LanguageIdentifier = normalized.parse().ok()?;
    let language = identifier.language.as_str().to_string();
    if language == "und" {
        return None;
    }
    let script = identifier.script.map(|s| s.as_str().to_string());
    let region = identifier.region.map(|r| r.as_str().to_string());

    let mut candidates = Vec::new();
    if let (Some(script), Some(region)) = (&script, &region) {
        candidates.push(format!("{}-{}-{}", language, script, region));
    }
    if let Some(script) = &script {
        candidates.push(format!("{}-{}", language, script));
    }
    if let Some(region) = &region {
        candidates.push(format!("{}-{}", language, region));
    }
    if let Some(code) = candidates.iter().find_map(|candidate| lookup(candidate)) {
        return Some(code);
    }

    if language == "zh" {
        let traditional = script.as_deref().is_some_and(|s| s.eq_ignore_ascii_case("Hant"))
            || matches!(region.as_deref(), Some("TW" | "HK" | "MO"));
        return Some(if traditional { "zh-TW" } else { "zh-CN" }.to_string());
    }

    match language.len() {
        2 if is_iso639_1(&language) => Some(language),
        3 => Some(language),
        _ => None,
    }
}

/// Every tag offered when choosing a new target language, sorted
pub fn supported_locale_tags() -> Vec<String> {
    let mut tags: Vec<String> = ISO_639_1
        .iter()
        .chain(SUPPORTED_EXACT_TAGS.iter())
        .map(|tag| tag.to_string())
        .collect();
    tags.sort();
    tags.dedup();
    tags
}
