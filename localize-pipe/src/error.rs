use std::path::PathBuf;

/// Errors raised while reading or rewriting resource files
#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    /// Filesystem access failed for a specific path
    #[error("Failed to access '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A non-empty file has no `</resources>` element to insert into
    #[error("Invalid XML resources file: {0}")]
    InvalidResources(String),
    #[error("Resource root not found: {0}")]
    ResourceRootMissing(String),
    #[error("Locale file not found: {0}")]
    LocaleFileMissing(String),
}

impl ResourceError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ResourceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type for resource file operations
pub type ResourceResult<T> = Result<T, ResourceError>;
