//! CLOB order book client.
//!
//! Fetches the resting book for a token and reduces it to the one
//! number the cycle cares about: the best (lowest) ask.

use crate::egress::{ProxiedHttp, Route};
use crate::error::{PolymarketError, Result};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

/// CLOB API base URL.
pub const CLOB_API_URL: &str = "https://clob.polymarket.com";

// =============================================================================
// API Response Types
// =============================================================================

/// Raw book response from the CLOB API.
#[derive(Debug, Clone, Deserialize)]
struct RawBook {
    #[serde(default)]
    asks: Vec<RawLevel>,
    #[serde(default)]
    #[allow(dead_code)]
    bids: Vec<RawLevel>,
}

/// One price level in the book.
#[derive(Debug, Clone, Deserialize)]
struct RawLevel {
    price: String,
    #[allow(dead_code)]
    size: String,
}

// =============================================================================
// ClobClient
// =============================================================================

/// CLOB REST client for order book queries.
pub struct ClobClient {
    /// Proxy-aware HTTP egress.
    http: Arc<ProxiedHttp>,
    /// Base URL for API.
    base_url: String,
    /// Rate limiter (requests per minute).
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for ClobClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClobClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ClobClient {
    /// Creates a new client over the given egress.
    ///
    /// Rate limited to 60 requests per minute by default.
    #[must_use]
    pub fn new(http: Arc<ProxiedHttp>) -> Self {
        Self::with_rate_limit(http, nonzero!(60u32))
    }

    /// Creates a new client with custom rate limit.
    #[must_use]
    pub fn with_rate_limit(http: Arc<ProxiedHttp>, requests_per_minute: NonZeroU32) -> Self {
        let quota = Quota::per_minute(requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http,
            base_url: CLOB_API_URL.to_string(),
            rate_limiter,
        }
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Validates a token id before it is spliced into a URL.
    fn validate_token_id(token_id: &str) -> Result<&str> {
        if token_id.is_empty() {
            return Err(PolymarketError::InvalidRequest(
                "token id cannot be empty".to_string(),
            ));
        }

        if !token_id.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PolymarketError::InvalidRequest(format!(
                "invalid token id: must contain only alphanumerics: {token_id}"
            )));
        }

        if token_id.len() > 128 {
            return Err(PolymarketError::InvalidRequest(format!(
                "invalid token id: exceeds maximum length of 128: {}",
                token_id.len()
            )));
        }

        Ok(token_id)
    }

    /// Gets the best (lowest) ask for a token.
    ///
    /// # Errors
    /// Returns error if the API call fails, the book has no asks, or a
    /// price cannot be parsed.
    pub async fn get_best_ask(&self, token_id: &str) -> Result<(Decimal, Route)> {
        let token_id = Self::validate_token_id(token_id)?;
        self.rate_limiter.until_ready().await;

        let url = format!("{}/book?token_id={}", self.base_url, token_id);
        tracing::debug!("GET {}", url);

        let (response, route) = self.http.get(&url).await?;
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(PolymarketError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(PolymarketError::api(status.as_u16(), text));
        }

        let book: RawBook = response.json().await?;

        let mut best: Option<Decimal> = None;
        for level in &book.asks {
            let price = level.price.parse::<Decimal>().map_err(|e| {
                PolymarketError::Serialization(format!("bad ask price {}: {e}", level.price))
            })?;
            best = Some(match best {
                Some(current) if current <= price => current,
                _ => price,
            });
        }

        let best = best.ok_or_else(|| PolymarketError::no_liquidity(token_id))?;

        tracing::debug!(token_id = %token_id, best_ask = %best, route = %route, "best ask");

        Ok((best, route))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> ClobClient {
        let http = Arc::new(ProxiedHttp::direct_only(10).unwrap());
        ClobClient::new(http).with_base_url(base_url)
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_validate_token_id_valid() {
        assert!(ClobClient::validate_token_id("10203040506070").is_ok());
    }

    #[test]
    fn test_validate_token_id_rejects_specials() {
        assert!(ClobClient::validate_token_id("../book").is_err());
        assert!(ClobClient::validate_token_id("abc?x=1").is_err());
        assert!(ClobClient::validate_token_id("").is_err());
    }

    // ==================== Endpoint Tests ====================

    #[tokio::test]
    async fn test_best_ask_is_lowest() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/book"))
            .and(query_param("token_id", "12345"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "asks": [
                    { "price": "0.55", "size": "100" },
                    { "price": "0.48", "size": "40" },
                    { "price": "0.52", "size": "250" }
                ],
                "bids": [
                    { "price": "0.44", "size": "90" }
                ]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let (best, route) = client.get_best_ask("12345").await.unwrap();

        assert_eq!(best, dec!(0.48));
        assert_eq!(route, Route::Direct);
    }

    #[tokio::test]
    async fn test_best_ask_empty_book() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "asks": [],
                "bids": []
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.get_best_ask("12345").await.unwrap_err();
        assert!(matches!(err, PolymarketError::NoLiquidity { .. }));
    }

    #[tokio::test]
    async fn test_best_ask_missing_sides() {
        let mock_server = MockServer::start().await;

        // Some books omit empty sides entirely.
        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.get_best_ask("12345").await.unwrap_err();
        assert!(matches!(err, PolymarketError::NoLiquidity { .. }));
    }

    #[tokio::test]
    async fn test_best_ask_bad_price() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/book"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "asks": [ { "price": "not-a-number", "size": "1" } ]
            })))
            .mount(&mock_server)
            .await;

        let client = test_client(&mock_server.uri());
        let err = client.get_best_ask("12345").await.unwrap_err();
        assert!(matches!(err, PolymarketError::Serialization(_)));
    }
}
