//! Error types for the agentic domain.
//!
//! Uses `thiserror` for ergonomic error definitions.

use thiserror::Error;

/// The top-level error type for all agent operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider returned no completion choices")]
    EmptyResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 429,
            message: "Too many requests".into(),
        });
        assert!(err.to_string().contains("429"));
        assert!(err.to_string().contains("Too many requests"));
    }

    #[test]
    fn provider_error_converts_into_top_level() {
        fn fails() -> Result<()> {
            let attempt: std::result::Result<(), ProviderError> = Err(ProviderError::EmptyResponse);
            attempt?;
            Ok(())
        }
        let err = fails().unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::EmptyResponse)));
        assert!(err.to_string().contains("no completion choices"));
    }

    #[test]
    fn config_error_displays_message() {
        let err = Error::Config {
            message: "history_length must be at least 2".into(),
        };
        assert_eq!(
            err.to_string(),
            "Configuration error: history_length must be at least 2"
        );
    }
}
