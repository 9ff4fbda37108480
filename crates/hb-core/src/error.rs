//! Error types for histbook

use thiserror::Error;

/// histbook error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error (booking files)
    #[error("YAML error: {0}")]
    Yaml(String),

    /// Validation error (bad axis, mismatched creation arrays, malformed config)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Number of fill values differs from the dimension recorded at creation.
    #[error("arity mismatch for '{key}': expected {expected} values, got {got}")]
    ArityMismatch {
        /// Container key.
        key: String,
        /// Dimension recorded at creation.
        expected: usize,
        /// Number of values passed to the fill.
        got: usize,
    },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arity_message_names_key() {
        let err = Error::ArityMismatch { key: "hn_met".into(), expected: 3, got: 2 };
        let msg = err.to_string();
        assert!(msg.contains("hn_met"));
        assert!(msg.contains("expected 3"));
    }
}
