//! Binance REST client for spot reference prices.
//!
//! Provides the two quotes the arbitrage cycle needs: the current spot
//! price and the open of the current hourly candle.
//!
//! # Example
//!
//! ```ignore
//! use hourly_edge_binance::{BinanceClient, BinanceClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BinanceClient::new(BinanceClientConfig::default())?;
//!
//!     let spot = client.get_spot_price().await?;
//!     println!("BTCUSDT spot: {spot}");
//!
//!     Ok(())
//! }
//! ```

use crate::error::{BinanceError, Result};
use chrono::{DateTime, Timelike, Utc};
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// Binance.US spot API base URL.
pub const BINANCE_US_URL: &str = "https://api.binance.us/api/v3";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Binance client.
#[derive(Debug, Clone)]
pub struct BinanceClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Spot symbol to quote.
    pub symbol: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for BinanceClientConfig {
    fn default() -> Self {
        Self {
            base_url: BINANCE_US_URL.to_string(),
            symbol: "BTCUSDT".to_string(),
            requests_per_minute: nonzero!(600u32),
            timeout_secs: 10,
        }
    }
}

impl BinanceClientConfig {
    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the spot symbol.
    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = symbol.into();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// Raw ticker response from the spot API.
#[derive(Debug, Clone, Deserialize)]
struct RawTickerPrice {
    #[allow(dead_code)]
    symbol: String,
    price: String,
}

// =============================================================================
// BinanceClient
// =============================================================================

/// Binance spot REST client.
///
/// All requests are rate-limited. Both endpoints used here are public,
/// so no authentication is attached.
pub struct BinanceClient {
    /// Configuration.
    config: BinanceClientConfig,

    /// HTTP client.
    http: Client,

    /// Rate limiter.
    rate_limiter: Arc<
        RateLimiter<
            governor::state::NotKeyed,
            governor::state::InMemoryState,
            governor::clock::DefaultClock,
        >,
    >,
}

impl std::fmt::Debug for BinanceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BinanceClient")
            .field("base_url", &self.config.base_url)
            .field("symbol", &self.config.symbol)
            .finish_non_exhaustive()
    }
}

impl BinanceClient {
    /// Creates a new client with the given configuration.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built or the symbol is invalid.
    pub fn new(config: BinanceClientConfig) -> Result<Self> {
        Self::validate_symbol(&config.symbol)?;

        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| BinanceError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Ok(Self {
            config,
            http,
            rate_limiter,
        })
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Returns the configured symbol.
    #[must_use]
    pub fn symbol(&self) -> &str {
        &self.config.symbol
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Validates a symbol string before it is spliced into a URL.
    ///
    /// Valid symbols are uppercase alphanumerics, e.g. "BTCUSDT".
    fn validate_symbol(symbol: &str) -> Result<&str> {
        if symbol.is_empty() {
            return Err(BinanceError::InvalidRequest(
                "symbol cannot be empty".to_string(),
            ));
        }

        if !symbol.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()) {
            return Err(BinanceError::InvalidRequest(format!(
                "invalid symbol: must contain only uppercase alphanumerics: {symbol}"
            )));
        }

        if symbol.len() > 20 {
            return Err(BinanceError::InvalidRequest(format!(
                "invalid symbol: exceeds maximum length of 20: {}",
                symbol.len()
            )));
        }

        Ok(symbol)
    }

    /// Waits for rate limiter and makes a GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);

        tracing::debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handles API response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 || status.as_u16() == 418 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(BinanceError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(BinanceError::api(status.as_u16(), text));
        }

        let body = response.json::<T>().await?;
        Ok(body)
    }

    // =========================================================================
    // Quote Endpoints
    // =========================================================================

    /// Gets the current spot price for the configured symbol.
    ///
    /// # Errors
    /// Returns error if the API call fails or the price cannot be parsed.
    pub async fn get_spot_price(&self) -> Result<Decimal> {
        let path = format!("/ticker/price?symbol={}", self.config.symbol);
        let ticker: RawTickerPrice = self.get(&path).await?;

        parse_price(&ticker.price)
    }

    /// Gets the open of the hourly candle containing `at`.
    ///
    /// Asks for exactly one 1h kline starting at the top of that hour.
    /// The open sits at index 1 of the kline row.
    ///
    /// # Errors
    /// Returns error if the API call fails, no candle exists yet, or the
    /// open cannot be parsed.
    pub async fn get_hourly_open(&self, at: DateTime<Utc>) -> Result<Decimal> {
        let hour_start = hour_floor(at);
        let start_ms = hour_start.timestamp_millis();
        let path = format!(
            "/klines?symbol={}&interval=1h&startTime={}&limit=1",
            self.config.symbol, start_ms
        );

        let rows: Vec<Vec<serde_json::Value>> = self.get(&path).await?;

        let open = rows
            .first()
            .and_then(|row| row.get(1))
            .and_then(|v| v.as_str())
            .ok_or_else(|| {
                BinanceError::MissingData(format!(
                    "no hourly candle for {} at {}",
                    self.config.symbol, hour_start
                ))
            })?;

        parse_price(open)
    }
}

/// Truncates a timestamp to the top of its hour.
fn hour_floor(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive()
        .and_hms_opt(at.hour(), 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(at)
}

fn parse_price(raw: &str) -> Result<Decimal> {
    raw.parse::<Decimal>()
        .map_err(|e| BinanceError::invalid_price(raw, e.to_string()))
}
