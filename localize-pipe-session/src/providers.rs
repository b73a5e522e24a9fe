//! Collaborators the controller reads on every operation
//!
//! Settings and the current-module lookup are injected so a host (the CLI, a
//! test, an editor integration) decides where they come from.

use crate::config::{LocalizePipeConfig, ProjectScanSettings};
use localize_pipe_mt::{MtResult, TranslationBackend, TranslationSettings};
use std::sync::Arc;

/// Source of translation and scan settings
pub trait SettingsProvider: Send + Sync {
    fn translation_settings(&self) -> TranslationSettings;

    fn scan_settings(&self) -> ProjectScanSettings;

    /// Backend for the next translation batch
    fn create_backend(&self) -> MtResult<Arc<dyn TranslationBackend>> {
        self.translation_settings().build_backend()
    }
}

/// Resolves the module the user is working in, for module-scoped scans
pub trait ScopeResolver: Send + Sync {
    fn current_module(&self) -> Option<String>;
}

/// Settings fixed at construction, optionally with a pinned backend
#[derive(Clone)]
pub struct StaticSettings {
    config: LocalizePipeConfig,
    backend: Option<Arc<dyn TranslationBackend>>,
}

impl StaticSettings {
    pub fn new(config: LocalizePipeConfig) -> Self {
        Self {
            config,
            backend: None,
        }
    }

    /// Always hand out `backend` instead of building one from settings
    pub fn with_backend(mut self, backend: Arc<dyn TranslationBackend>) -> Self {
        self.backend = Some(backend);
        self
    }
}

impl SettingsProvider for StaticSettings {
    fn translation_settings(&self) -> TranslationSettings {
        self.config.translation.clone()
    }

    fn scan_settings(&self) -> ProjectScanSettings {
        self.config.scan
    }

    fn create_backend(&self) -> MtResult<Arc<dyn TranslationBackend>> {
        match &self.backend {
            Some(backend) => Ok(backend.clone()),
            None => self.config.translation.build_backend(),
        }
    }
}

/// A module name chosen up front, e.g. from `--module`
#[derive(Debug, Clone, Default)]
pub struct FixedScope(pub Option<String>);

impl ScopeResolver for FixedScope {
    fn current_module(&self) -> Option<String> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use localize_pipe_mt::{MockBackend, MockMode};

    #[test]
    fn test_static_settings_pinned_backend() {
        let settings = StaticSettings::new(LocalizePipeConfig::default())
            .with_backend(Arc::new(MockBackend::new(MockMode::Suffix)));
        let backend = settings.create_backend().unwrap();
        assert_eq!(backend.provider_name(), "Mock Backend");
    }

    #[test]
    fn test_static_settings_builds_from_config() {
        let settings = StaticSettings::new(LocalizePipeConfig::default());
        let backend = settings.create_backend().unwrap();
        assert_eq!(backend.provider_name(), "Ollama");
        assert_eq!(backend.model(), "translategemma:4b");
        assert!(settings.scan_settings().include_compose_resources);
    }

    #[test]
    fn test_fixed_scope() {
        assert_eq!(FixedScope::default().current_module(), None);
        assert_eq!(
            FixedScope(Some("app".to_string())).current_module().as_deref(),
            Some("app")
        );
    }
}
