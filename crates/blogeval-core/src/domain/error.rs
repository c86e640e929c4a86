//! Domain-level error taxonomy for blogeval.
//!
//! Evaluators never return these: a failing sub-metric is folded into its
//! axis as a fallback score. Errors only come from configuration loading and
//! report persistence.

/// blogeval domain errors.
#[derive(Debug, thiserror::Error)]
pub enum EvalError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for blogeval domain operations.
pub type Result<T> = std::result::Result<T, EvalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_display() {
        let err = EvalError::InvalidConfig("MIN_QUALITY_SCORE must be a number".to_string());
        assert!(err.to_string().contains("invalid configuration"));
        assert!(err.to_string().contains("MIN_QUALITY_SCORE"));
    }

    #[test]
    fn test_digest_mismatch_error() {
        let err = EvalError::DigestMismatch {
            expected: "abc123".to_string(),
            actual: "def456".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("abc123"));
        assert!(msg.contains("def456"));
    }

    #[test]
    fn test_io_error_converts() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only");
        let err: EvalError = io.into();
        assert!(err.to_string().starts_with("io error"));
    }
}
