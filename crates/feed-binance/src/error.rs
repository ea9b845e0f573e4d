//! Error types for the Binance reference-price client.

use thiserror::Error;

/// Errors that can occur when fetching reference prices from Binance.
#[derive(Debug, Error)]
pub enum BinanceError {
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

    /// The response did not contain the expected field.
    #[error("missing data: {0}")]
    MissingData(String),

    /// A price field could not be parsed as a decimal.
    #[error("invalid price {value}: {reason}")]
    InvalidPrice {
        /// The raw string that failed to parse.
        value: String,
        /// Parse failure detail.
        reason: String,
    },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl BinanceError {
    /// Creates an API error from status code and message.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a rate limit error.
    pub fn rate_limit(retry_after_secs: u64) -> Self {
        Self::RateLimit { retry_after_secs }
    }

    /// Creates an invalid price error.
    pub fn invalid_price(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPrice {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Returns true if the error indicates the request should be retried later.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) | Self::RateLimit { .. } => true,
            Self::Api { status_code, .. } => *status_code >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for BinanceError {
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

impl From<serde_json::Error> for BinanceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Binance operations.
pub type Result<T> = std::result::Result<T, BinanceError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Error Construction Tests ====================

    #[test]
    fn test_api_error_construction() {
        let err = BinanceError::api(418, "banned");
        assert!(matches!(err, BinanceError::Api { status_code: 418, .. }));
        assert!(err.to_string().contains("418"));
        assert!(err.to_string().contains("banned"));
    }

    #[test]
    fn test_invalid_price_error() {
        let err = BinanceError::invalid_price("not-a-number", "invalid digit");
        assert!(err.to_string().contains("not-a-number"));
    }

    // ==================== Transient Tests ====================

    #[test]
    fn test_network_error_is_transient() {
        let err = BinanceError::Network("connection refused".to_string());
        assert!(err.is_transient());
    }

    #[test]
    fn test_rate_limit_is_transient() {
        let err = BinanceError::rate_limit(30);
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_error_is_transient() {
        let err = BinanceError::api(503, "service unavailable");
        assert!(err.is_transient());
    }

    #[test]
    fn test_client_error_is_not_transient() {
        let err = BinanceError::api(400, "bad request");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_missing_data_is_not_transient() {
        let err = BinanceError::MissingData("no klines returned".to_string());
        assert!(!err.is_transient());
    }
}
