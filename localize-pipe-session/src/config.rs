//! Project configuration loaded from `localize-pipe.toml`
//!
//! ```toml
//! [translation]
//! provider = "ollama"
//! ollama_model = "translategemma:12b"
//!
//! [scan]
//! include_identical_to_base = true
//! ```
//!
//! Every table and key is optional. A missing file yields the defaults.

use localize_pipe_mt::TranslationSettings;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const CONFIG_FILE_NAME: &str = "localize-pipe.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Per-project scan flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectScanSettings {
    pub include_android_resources: bool,
    pub include_compose_resources: bool,
    pub include_identical_to_base: bool,
}

impl Default for ProjectScanSettings {
    fn default() -> Self {
        Self {
            include_android_resources: true,
            include_compose_resources: true,
            include_identical_to_base: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizePipeConfig {
    pub translation: TranslationSettings,
    pub scan: ProjectScanSettings,
}

impl LocalizePipeConfig {
    /// Parse a config document; `path` is only used for error messages
    pub fn from_toml(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Load `path`, falling back to defaults when the file does not exist
    ///
    /// The Hugging Face token is taken from `LOCALIZE_PIPE_HF_TOKEN` when
    /// the file leaves it blank.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml(&text, path)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No config at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Ok(config.with_env_overrides())
    }

    /// Load `localize-pipe.toml` from a project root
    pub fn load_from_project(project_root: &Path) -> Result<Self, ConfigError> {
        Self::load(&project_root.join(CONFIG_FILE_NAME))
    }

    pub fn with_env_overrides(mut self) -> Self {
        self.translation = self.translation.with_token_from_env();
        self
    }
}
