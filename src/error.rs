//! Error types for Trellis

use thiserror::Error;

/// Result type alias for Trellis operations
pub type Result<T> = std::result::Result<T, TrellisError>;

/// Main error type for Trellis
#[derive(Error, Debug)]
pub enum TrellisError {
    /// Malformed input, raised before any backend call is made
    #[error("Validation error: {0}")]
    Validation(String),

    /// A hard safety bound was exceeded mid-operation (iteration or memory cap)
    #[error("Resource limit exceeded: {0}")]
    ResourceLimit(String),

    /// Failure reported by the key-value backend, preserving its identifying name
    #[error("Backend error [{name}]: {message}")]
    Backend { name: String, message: String },

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    #[cfg(feature = "openai")]
    Http(#[from] reqwest::Error),
}

impl TrellisError {
    /// Shorthand for a backend failure with an identifying error name
    pub fn backend(name: impl Into<String>, message: impl Into<String>) -> Self {
        TrellisError::Backend {
            name: name.into(),
            message: message.into(),
        }
    }

    /// The backend's identifying error name, if this is a backend failure.
    /// The retry policy matches this against its retryable-name list.
    pub fn backend_name(&self) -> Option<&str> {
        match self {
            TrellisError::Backend { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Check if error is retryable under the default retryable-name set
    pub fn is_retryable(&self) -> bool {
        match self {
            TrellisError::Backend { name, .. } => crate::retry::DEFAULT_RETRYABLE_ERRORS
                .iter()
                .any(|r| name.contains(r)),
            #[cfg(feature = "openai")]
            TrellisError::Http(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_name_preserved() {
        let err = TrellisError::backend("ThrottlingException", "slow down");
        assert_eq!(err.backend_name(), Some("ThrottlingException"));
        assert!(err.is_retryable());
    }

    #[test]
    fn test_validation_not_retryable() {
        let err = TrellisError::Validation("bad key".into());
        assert!(!err.is_retryable());
        assert!(err.backend_name().is_none());
    }
}
