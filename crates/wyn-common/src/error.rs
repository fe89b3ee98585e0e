//! Error types for Wyn.

use thiserror::Error;

/// Top-level error type for Wyn operations.
#[derive(Debug, Error)]
pub enum WynError {
    /// Configuration errors
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading or validating tuning data.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The text could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(String),

    /// A field is outside its allowed range
    #[error("invalid value for `{field}`: {reason}")]
    Invalid {
        /// Dotted field path (e.g. `jump.max_jumps`)
        field: &'static str,
        /// Human-readable constraint
        reason: String,
    },
}

impl ConfigError {
    /// Shorthand for an [`ConfigError::Invalid`] error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Result type alias for Wyn operations.
pub type WynResult<T> = Result<T, WynError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_message() {
        let err = ConfigError::invalid("jump.max_jumps", "must be between 1 and 5");
        assert_eq!(
            err.to_string(),
            "invalid value for `jump.max_jumps`: must be between 1 and 5"
        );
    }

    #[test]
    fn test_wraps_config_error() {
        let err: WynError = ConfigError::Parse("bad".into()).into();
        assert!(matches!(err, WynError::Config(_)));
    }
}
