//! Error types for Kalshi exchange integration.
//!
//! Provides typed errors for authentication, API communication,
//! validation, and execution failures.

use thiserror::Error;

/// Errors that can occur when interacting with Kalshi.
#[derive(Debug, Error)]
pub enum KalshiError {
    /// Authentication failed.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// RSA signing error.
    #[error("RSA signing error: {0}")]
    Signing(String),

    /// API request failed.
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Error message from API.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limit exceeded, retry after {retry_after_secs}s")]
    RateLimit {
        /// Seconds to wait before retry.
        retry_after_secs: u64,
    },

    /// Network error.
    #[error("network error: {0}")]
    Network(String),

    /// Request timeout.
    #[error("request timeout: {0}")]
    Timeout(String),

    /// Invalid order parameters.
    #[error("invalid order: {0}")]
    InvalidOrder(String),

    /// Order rejected by exchange.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl KalshiError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    #[must_use]
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Returns true if the error is transient and the request may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimit { .. }
                | Self::Network(_)
                | Self::Timeout(_)
                | Self::Api {
                    status_code: 500..=599,
                    ..
                }
        )
    }
}

impl From<reqwest::Error> for KalshiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(err.to_string())
        } else if err.is_connect() {
            Self::Network(format!("connection failed: {err}"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for KalshiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for Kalshi operations.
pub type Result<T> = std::result::Result<T, KalshiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = KalshiError::api(404, "market not found");
        assert_eq!(err.to_string(), "API error: 404 - market not found");
    }

    #[test]
    fn test_rate_limit_display() {
        let err = KalshiError::rate_limit(30);
        assert_eq!(err.to_string(), "rate limit exceeded, retry after 30s");
    }

    #[test]
    fn test_transient_errors() {
        assert!(KalshiError::rate_limit(10).is_transient());
        assert!(KalshiError::Network("reset".to_string()).is_transient());
        assert!(KalshiError::Timeout("10s".to_string()).is_transient());
        assert!(KalshiError::api(503, "unavailable").is_transient());
    }

    #[test]
    fn test_non_transient_errors() {
        assert!(!KalshiError::api(400, "bad request").is_transient());
        assert!(!KalshiError::InvalidOrder("count".to_string()).is_transient());
        assert!(!KalshiError::Signing("bad key".to_string()).is_transient());
    }

    #[test]
    fn test_from_serde_json() {
        let err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let kalshi_err: KalshiError = err.into();
        assert!(matches!(kalshi_err, KalshiError::Serialization(_)));
    }
}
