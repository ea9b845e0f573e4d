//! Kalshi REST API client with rate limiting.
//!
//! Provides typed access to the Kalshi markets and order endpoints
//! with automatic rate limiting using the governor crate. Market
//! listing works unauthenticated; order submission requires an RSA
//! signer.
//!
//! # Example
//!
//! ```ignore
//! use hourly_edge_kalshi::{KalshiClient, KalshiClientConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = KalshiClient::new(KalshiClientConfig::demo())?;
//!
//!     let event = KalshiClient::hourly_event_ticker(chrono::Utc::now());
//!     let ladder = client.get_strike_ladder(&event).await?;
//!     println!("{} strikes in {}", ladder.len(), event);
//!
//!     Ok(())
//! }
//! ```

use crate::auth::KalshiAuth;
use crate::error::{KalshiError, Result};
use crate::types::{Order, OrderRequest, StrikeMarket};
use chrono::{DateTime, Datelike, Timelike, TimeZone, Utc};
use chrono_tz::US::Eastern;
use governor::{Quota, RateLimiter};
use nonzero_ext::nonzero;
use regex::Regex;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;

// =============================================================================
// Constants
// =============================================================================

/// Kalshi production API base URL.
pub const KALSHI_PROD_URL: &str = "https://api.elections.kalshi.com/trade-api/v2";

/// Kalshi demo API base URL.
pub const KALSHI_DEMO_URL: &str = "https://demo-api.kalshi.co/trade-api/v2";

/// Event ticker series for the hourly BTC settlement markets.
pub const HOURLY_BTC_SERIES: &str = "KXBTCD";

// =============================================================================
// Configuration
// =============================================================================

/// Configuration for the Kalshi client.
#[derive(Debug, Clone)]
pub struct KalshiClientConfig {
    /// Base URL for the API.
    pub base_url: String,

    /// Requests per minute limit.
    pub requests_per_minute: NonZeroU32,

    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for KalshiClientConfig {
    fn default() -> Self {
        Self {
            base_url: KALSHI_PROD_URL.to_string(),
            requests_per_minute: nonzero!(60u32),
            timeout_secs: 30,
        }
    }
}

impl KalshiClientConfig {
    /// Creates a configuration for production.
    #[must_use]
    pub fn production() -> Self {
        Self::default()
    }

    /// Creates a configuration for the demo environment.
    #[must_use]
    pub fn demo() -> Self {
        Self {
            base_url: KALSHI_DEMO_URL.to_string(),
            ..Default::default()
        }
    }

    /// Sets the base URL.
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Sets the rate limit.
    #[must_use]
    pub fn with_rate_limit(mut self, requests_per_minute: NonZeroU32) -> Self {
        self.requests_per_minute = requests_per_minute;
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

/// Raw markets response from the Kalshi API.
#[derive(Debug, Clone, Deserialize)]
struct RawMarketsResponse {
    markets: Option<Vec<RawMarket>>,
}

/// Raw market data from the API. Prices are in cents.
#[derive(Debug, Clone, Deserialize)]
struct RawMarket {
    ticker: String,
    subtitle: Option<String>,
    yes_ask: Option<i64>,
    no_ask: Option<i64>,
}

/// Raw order response from the Kalshi API.
#[derive(Debug, Clone, Deserialize)]
struct RawOrderResponse {
    order: Option<Order>,
}

fn cents_to_dollars(cents: Option<i64>) -> Decimal {
    Decimal::new(cents.unwrap_or(0), 2)
}

// =============================================================================
// KalshiClient
// =============================================================================

/// Kalshi REST API client.
pub struct KalshiClient {
    /// Configuration.
    config: KalshiClientConfig,

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

    /// Optional request signer. Order endpoints require it.
    auth: Option<KalshiAuth>,

    /// Matches the dollar strike in a market subtitle.
    strike_re: Regex,
}

impl std::fmt::Debug for KalshiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiClient")
            .field("base_url", &self.config.base_url)
            .field("authenticated", &self.auth.is_some())
            .finish_non_exhaustive()
    }
}

impl KalshiClient {
    /// Creates a new unauthenticated client.
    ///
    /// # Errors
    /// Returns error if the HTTP client cannot be built.
    pub fn new(config: KalshiClientConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| KalshiError::Network(format!("failed to build HTTP client: {e}")))?;

        let quota = Quota::per_minute(config.requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let strike_re = Regex::new(r"\$([\d,]+)")
            .map_err(|e| KalshiError::Configuration(format!("bad strike pattern: {e}")))?;

        Ok(Self {
            config,
            http,
            rate_limiter,
            auth: None,
            strike_re,
        })
    }

    /// Attaches a request signer for authenticated endpoints.
    #[must_use]
    pub fn with_auth(mut self, auth: KalshiAuth) -> Self {
        self.auth = Some(auth);
        self
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// True when a request signer is configured.
    #[must_use]
    pub fn has_auth(&self) -> bool {
        self.auth.is_some()
    }

    /// Derives the hourly BTC event ticker for the hour containing
    /// `time`, e.g. "KXBTCD-25AUG0616" for the hour settling at 4pm ET.
    ///
    /// The date and hour components are the Eastern-time settlement
    /// instant, which is the top of the hour after `time`.
    #[must_use]
    pub fn hourly_event_ticker(time: DateTime<Utc>) -> String {
        let hour_start = time.timestamp() - time.timestamp().rem_euclid(3600);
        let settle_utc = match Utc.timestamp_opt(hour_start + 3600, 0) {
            chrono::LocalResult::Single(t) => t,
            _ => time,
        };
        let settle = settle_utc.with_timezone(&Eastern);

        let month = match settle.month() {
            1 => "JAN",
            2 => "FEB",
            3 => "MAR",
            4 => "APR",
            5 => "MAY",
            6 => "JUN",
            7 => "JUL",
            8 => "AUG",
            9 => "SEP",
            10 => "OCT",
            11 => "NOV",
            _ => "DEC",
        };

        format!(
            "{}-{:02}{}{:02}{:02}",
            HOURLY_BTC_SERIES,
            settle.year() % 100,
            month,
            settle.day(),
            settle.hour()
        )
    }

    /// Validates an event ticker before it is spliced into a URL.
    fn validate_event_ticker(event_ticker: &str) -> Result<&str> {
        if event_ticker.is_empty() {
            return Err(KalshiError::InvalidRequest(
                "event ticker cannot be empty".to_string(),
            ));
        }

        if !event_ticker
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(KalshiError::InvalidRequest(format!(
                "invalid event ticker: must contain only alphanumeric, hyphen, or underscore: {event_ticker}"
            )));
        }

        if event_ticker.len() > 64 {
            return Err(KalshiError::InvalidRequest(format!(
                "invalid event ticker: exceeds maximum length of 64: {}",
                event_ticker.len()
            )));
        }

        Ok(event_ticker)
    }

    /// Parses the dollar strike out of a market subtitle.
    ///
    /// Subtitles look like "$93,250 or above". Markets whose subtitle
    /// carries no dollar figure are not part of the strike ladder.
    fn parse_strike(&self, subtitle: &str) -> Option<Decimal> {
        let captures = self.strike_re.captures(subtitle)?;
        let digits = captures.get(1)?.as_str().replace(',', "");
        digits.parse::<Decimal>().ok()
    }

    /// Lists the strike ladder for an hourly event, sorted ascending
    /// by strike.
    ///
    /// Markets without a parseable strike are skipped. An event with
    /// no markets yields an empty ladder; deciding whether that is an
    /// error belongs to the caller.
    ///
    /// # Errors
    /// Returns error if the API call fails.
    pub async fn get_strike_ladder(&self, event_ticker: &str) -> Result<Vec<StrikeMarket>> {
        let event_ticker = Self::validate_event_ticker(event_ticker)?;

        let path = format!("/markets?limit=100&event_ticker={event_ticker}");
        let response: RawMarketsResponse = self.get(&path).await?;

        let mut ladder: Vec<StrikeMarket> = response
            .markets
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| {
                let subtitle = raw.subtitle.unwrap_or_default();
                let strike = self.parse_strike(&subtitle)?;
                Some(StrikeMarket {
                    ticker: raw.ticker,
                    strike,
                    yes_ask: cents_to_dollars(raw.yes_ask),
                    no_ask: cents_to_dollars(raw.no_ask),
                    subtitle,
                })
            })
            .collect();

        ladder.sort_by(|a, b| a.strike.cmp(&b.strike));

        tracing::debug!(
            event_ticker = %event_ticker,
            strikes = ladder.len(),
            "strike ladder fetched"
        );

        Ok(ladder)
    }

    /// Submits an order.
    ///
    /// # Errors
    /// Returns error if no signer is configured, the order is rejected,
    /// or the API call fails.
    pub async fn submit_order(&self, order: &OrderRequest) -> Result<Order> {
        let response: RawOrderResponse = self.post("/portfolio/orders", order).await?;

        response.order.ok_or_else(|| {
            KalshiError::Serialization("order response missing order object".to_string())
        })
    }

    /// Waits for the rate limiter and makes a GET request, signed when
    /// a signer is configured.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        tracing::debug!("GET {}", url);

        let mut request = self.http.get(&url).header("Accept", "application/json");

        if let Some(auth) = &self.auth {
            let sign_path = path.split('?').next().unwrap_or(path);
            let headers = auth.sign_request("GET", sign_path, "")?;
            for (name, value) in headers.as_tuples() {
                request = request.header(name, value);
            }
        }

        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Waits for the rate limiter and makes a signed POST request.
    async fn post<T: serde::de::DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let auth = self.auth.as_ref().ok_or_else(|| {
            KalshiError::Authentication("no API credentials configured".to_string())
        })?;

        self.rate_limiter.until_ready().await;

        let url = format!("{}{}", self.config.base_url, path);
        let body_json = serde_json::to_string(body)?;
        let headers = auth.sign_request("POST", path, &body_json)?;

        tracing::debug!("POST {} body_len={}", url, body_json.len());

        let mut request = self
            .http
            .post(&url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json");
        for (name, value) in headers.as_tuples() {
            request = request.header(name, value);
        }

        let response = request.body(body_json).send().await?;
        self.handle_response(response).await
    }

    /// Handles an API response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        let status = response.status();

        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);
            return Err(KalshiError::rate_limit(retry_after));
        }

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(KalshiError::api(status.as_u16(), text));
        }

        Ok(response.json().await?)
    }
}
