//! Error types for Polymarket integration.

use thiserror::Error;

/// Errors that can occur when interacting with Polymarket.
#[derive(Debug, Error)]
pub enum PolymarketError {
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

    /// No event found for the requested slug.
    #[error("event not found: {slug}")]
    EventNotFound {
        /// The slug that returned no events.
        slug: String,
    },

    /// The market payload did not have the expected shape.
    #[error("malformed market: {0}")]
    MarketStructure(String),

    /// The order book has no resting asks.
    #[error("no asks in book for token {token_id}")]
    NoLiquidity {
        /// The token id with an empty ask side.
        token_id: String,
    },

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Authentication failed.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Order rejected by the CLOB.
    #[error("order rejected: {0}")]
    OrderRejected(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl PolymarketError {
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

    /// Creates an event not found error.
    pub fn event_not_found(slug: impl Into<String>) -> Self {
        Self::EventNotFound { slug: slug.into() }
    }

    /// Creates a malformed market error.
    pub fn market_structure(detail: impl Into<String>) -> Self {
        Self::MarketStructure(detail.into())
    }

    /// Creates a no liquidity error.
    pub fn no_liquidity(token_id: impl Into<String>) -> Self {
        Self::NoLiquidity {
            token_id: token_id.into(),
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

impl From<reqwest::Error> for PolymarketError {
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

impl From<serde_json::Error> for PolymarketError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type alias for Polymarket operations.
pub type Result<T> = std::result::Result<T, PolymarketError>;

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Error Construction Tests ====================

    #[test]
    fn test_api_error_construction() {
        let err = PolymarketError::api(404, "not found");
        assert!(matches!(err, PolymarketError::Api { status_code: 404, .. }));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_event_not_found_error() {
        let err = PolymarketError::event_not_found("bitcoin-up-or-down-august-6-3pm-et");
        assert!(err.to_string().contains("bitcoin-up-or-down-august-6-3pm-et"));
    }

    #[test]
    fn test_no_liquidity_error() {
        let err = PolymarketError::no_liquidity("123456789");
        assert!(err.to_string().contains("123456789"));
    }

    // ==================== Transient Tests ====================

    #[test]
    fn test_network_error_is_transient() {
        let err = PolymarketError::Network("connection refused".to_string());
        assert!(err.is_transient());
    }

    #[test]
    fn test_server_error_is_transient() {
        let err = PolymarketError::api(502, "bad gateway");
        assert!(err.is_transient());
    }

    #[test]
    fn test_market_structure_is_not_transient() {
        let err = PolymarketError::market_structure("expected 2 tokens, got 3");
        assert!(!err.is_transient());
    }

    #[test]
    fn test_event_not_found_is_not_transient() {
        let err = PolymarketError::event_not_found("some-slug");
        assert!(!err.is_transient());
    }
}
