/// Error types for translation backends
///
/// Every variant carries the operator-facing message verbatim; `Display`
/// prints it unchanged so it can be copied straight into a row message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MtError {
    /// The backend could not be reached at all
    #[error("{0}")]
    Unreachable(String),
    /// The backend answered with an error status or error payload
    #[error("{0}")]
    Provider(String),
    /// The backend answered with a body that could not be understood
    #[error("{0}")]
    InvalidResponse(String),
    /// Local configuration prevents building a backend
    #[error("{0}")]
    Config(String),
    /// No backend language code exists for this locale tag
    #[error("Unsupported locale mapping for {0}")]
    UnsupportedLocale(String),
}

/// Result type for MT operations
pub type MtResult<T> = Result<T, MtError>;
