//! Error types for `tfc-response-filter`.

use thiserror::Error;

/// Main error type for response filtering.
///
/// Document errors never escape the public `filter*` entry points: the engine logs them and
/// returns the original document. Only configuration loading surfaces errors to callers.
#[derive(Error, Debug)]
pub enum FilterError {
    /// The document has no top-level `data` member (or is not an object at all).
    #[error("Malformed document: missing top-level `data` member")]
    MissingData,

    /// A node inside the document has an unexpected JSON type.
    #[error("Malformed document at '{pointer}': {reason}")]
    MalformedDocument { pointer: String, reason: String },

    /// Configuration errors (invalid overrides, audit-critical removals, unknown names).
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration error: failed to read overrides file '{path}': {source}")]
    OverridesReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON parsing errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl FilterError {
    pub(crate) fn malformed(pointer: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            pointer: pointer.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for filtering operations.
pub type Result<T> = std::result::Result<T, FilterError>;
