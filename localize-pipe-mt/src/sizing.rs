//! TranslateGemma size guidance
//!
//! Download sizes follow the Ollama `translategemma` tags; runtime memory is
//! the Q4 figure from the Gemma 3 model card.

use crate::settings::ProviderType;
use regex::Regex;
use std::sync::LazyLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ModelSize {
    Size4B,
    Size12B,
    Size27B,
}

pub const ALL_SIZES: [ModelSize; 3] = [ModelSize::Size4B, ModelSize::Size12B, ModelSize::Size27B];

static SIZE_27B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[-:])27b($|[-:_])").expect("27b pattern"));
static SIZE_12B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[-:])12b($|[-:_])").expect("12b pattern"));
static SIZE_4B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(^|[-:])4b($|[-:_])").expect("4b pattern"));

impl ModelSize {
    pub fn short_label(&self) -> &'static str {
        match self {
            ModelSize::Size4B => "4B",
            ModelSize::Size12B => "12B",
            ModelSize::Size27B => "27B",
        }
    }

    /// Download size in GB
    pub fn download_gb(&self) -> f64 {
        match self {
            ModelSize::Size4B => 3.3,
            ModelSize::Size12B => 8.1,
            ModelSize::Size27B => 17.0,
        }
    }

    /// Q4 runtime memory in GB
    pub fn q4_memory_gb(&self) -> f64 {
        match self {
            ModelSize::Size4B => 3.4,
            ModelSize::Size12B => 8.7,
            ModelSize::Size27B => 21.0,
        }
    }

    pub fn recommended_ram_gb(&self) -> u64 {
        match self {
            ModelSize::Size4B => 8,
            ModelSize::Size12B => 16,
            ModelSize::Size27B => 32,
        }
    }
}

/// Largest size whose RAM recommendation fits, 4B when unknown
pub fn recommended_size(total_ram_gb: Option<u64>) -> ModelSize {
    let Some(ram) = total_ram_gb else {
        return ModelSize::Size4B;
    };
    ALL_SIZES
        .iter()
        .rev()
        .copied()
        .find(|size| ram >= size.recommended_ram_gb())
        .unwrap_or(ModelSize::Size4B)
}

/// Size encoded in a model id such as `translategemma:12b`
pub fn size_for_model_id(model_id: &str) -> Option<ModelSize> {
    let normalized = model_id.trim();
    if normalized.is_empty() {
        return None;
    }
    if SIZE_27B.is_match(normalized) {
        Some(ModelSize::Size27B)
    } else if SIZE_12B.is_match(normalized) {
        Some(ModelSize::Size12B)
    } else if SIZE_4B.is_match(normalized) {
        Some(ModelSize::Size4B)
    } else {
        None
    }
}

pub fn recommended_model_id(provider: ProviderType, size: ModelSize) -> String {
    let label = size.short_label().to_lowercase();
    match provider {
        ProviderType::Ollama => format!("translategemma:{}", label),
        ProviderType::HuggingFace => format!("google/translategemma-{}-it", label),
    }
}

fn trim_gb(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{}", value)
    }
}

/// One line per size: storage, runtime memory and recommended RAM
pub fn guide_lines() -> Vec<String> {
    ALL_SIZES
        .iter()
        .map(|size| {
            format!(
                "{}: model storage ~{} GB, runtime memory ~{} GB (Q4), recommended system RAM >= {} GB",
                size.short_label(),
                trim_gb(size.download_gb()),
                trim_gb(size.q4_memory_gb()),
                size.recommended_ram_gb()
            )
        })
        .collect()
}

/// Warning when the disk cannot hold the selected model
pub fn storage_warning(model_id: &str, available_storage_gb: Option<u64>) -> Option<String> {
    let storage = available_storage_gb?;
    let size = size_for_model_id(model_id)?;
    let required = size.download_gb().ceil() as u64;
    (storage < required).then(|| {
        format!(
            "Model '{}' needs about {} GB, but only {} GB is available.",
            model_id,
            trim_gb(size.download_gb()),
            storage
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommended_size_by_ram() {
        assert_eq!(recommended_size(None), ModelSize::Size4B);
        assert_eq!(recommended_size(Some(4)), ModelSize::Size4B);
        assert_eq!(recommended_size(Some(16)), ModelSize::Size12B);
        assert_eq!(recommended_size(Some(31)), ModelSize::Size12B);
        assert_eq!(recommended_size(Some(64)), ModelSize::Size27B);
    }

    #[test]
    fn test_size_for_model_id() {
        assert_eq!(size_for_model_id("translategemma:27b"), Some(ModelSize::Size27B));
        assert_eq!(size_for_model_id("google/translategemma-12B-it"), Some(ModelSize::Size12B));
        assert_eq!(size_for_model_id("translategemma:4b-q8_0"), Some(ModelSize::Size4B));
        assert_eq!(size_for_model_id("translategemma:latest"), None);
        assert_eq!(size_for_model_id("model:14b"), None);
        assert_eq!(size_for_model_id(""), None);
    }

    #[test]
    fn test_recommended_model_ids() {
        assert_eq!(recommended_model_id(ProviderType::Ollama, ModelSize::Size12B), "translategemma:12b");
        assert_eq!(
            recommended_model_id(ProviderType::HuggingFace, ModelSize::Size4B),
            "google/translategemma-4b-it"
        );
    }

    #[test]
    fn test_guide_lines() {
        let lines = guide_lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[2],
            "27B: model storage ~17 GB, runtime memory ~21 GB (Q4), recommended system RAM >= 32 GB"
        );
    }

    #[test]
    fn test_storage_warning() {
        assert_eq!(
            storage_warning("translategemma:12b", Some(5)).as_deref(),
            Some("Model 'translategemma:12b' needs about 8.1 GB, but only 5 GB is available.")
        );
        assert_eq!(storage_warning("translategemma:12b", Some(50)), None);
        assert_eq!(storage_warning("translategemma:12b", None), None);
    }
}
