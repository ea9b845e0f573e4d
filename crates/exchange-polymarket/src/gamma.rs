//! Gamma API client for hourly market discovery.
//!
//! Resolves an event slug like `bitcoin-up-or-down-august-6-3pm-et` to
//! the market's outcome labels and CLOB token ids. The book itself is
//! fetched separately through [`crate::clob::ClobClient`].

use crate::egress::{ProxiedHttp, Route};
use crate::error::{PolymarketError, Result};
use chrono::{DateTime, Datelike, Timelike, Utc};
use chrono_tz::US::Eastern;
use governor::{Quota, RateLimiter};
use hourly_edge_core::Outcome;
use nonzero_ext::nonzero;
use serde::Deserialize;
use std::num::NonZeroU32;
use std::sync::Arc;

/// Gamma API base URL.
pub const GAMMA_API_URL: &str = "https://gamma-api.polymarket.com";

// =============================================================================
// Domain Types
// =============================================================================

/// An hourly Up/Down market resolved from the Gamma API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourlyMarket {
    /// Event slug the market was resolved from.
    pub slug: String,
    /// Market question text.
    pub question: String,
    /// Condition id on the CLOB.
    pub condition_id: String,
    /// CLOB token id settling on Up.
    pub up_token_id: String,
    /// CLOB token id settling on Down.
    pub down_token_id: String,
}

impl HourlyMarket {
    /// Returns the CLOB token id for an outcome.
    #[must_use]
    pub fn token_id(&self, outcome: Outcome) -> &str {
        match outcome {
            Outcome::Up => &self.up_token_id,
            Outcome::Down => &self.down_token_id,
        }
    }
}

// =============================================================================
// API Response Types
// =============================================================================

/// Raw event from the Gamma API.
#[derive(Debug, Clone, Deserialize)]
struct RawGammaEvent {
    slug: Option<String>,
    #[serde(default)]
    markets: Vec<RawGammaMarket>,
}

/// Raw market inside an event.
///
/// `outcomes` and `clobTokenIds` arrive as JSON-encoded strings, not
/// arrays, and need a second parse.
#[derive(Debug, Clone, Deserialize)]
struct RawGammaMarket {
    #[serde(rename = "conditionId")]
    condition_id: Option<String>,
    question: Option<String>,
    outcomes: Option<String>,
    #[serde(rename = "clobTokenIds")]
    clob_token_ids: Option<String>,
}

impl RawGammaMarket {
    fn into_hourly_market(self, slug: &str) -> Result<HourlyMarket> {
        let outcomes_json = self
            .outcomes
            .ok_or_else(|| PolymarketError::market_structure("missing outcomes field"))?;
        let tokens_json = self
            .clob_token_ids
            .ok_or_else(|| PolymarketError::market_structure("missing clobTokenIds field"))?;

        let outcomes: Vec<String> = serde_json::from_str(&outcomes_json)
            .map_err(|e| PolymarketError::market_structure(format!("bad outcomes JSON: {e}")))?;
        let tokens: Vec<String> = serde_json::from_str(&tokens_json)
            .map_err(|e| PolymarketError::market_structure(format!("bad clobTokenIds JSON: {e}")))?;

        if tokens.len() != 2 || outcomes.len() != 2 {
            return Err(PolymarketError::market_structure(format!(
                "expected 2 outcomes and 2 tokens, got {} outcomes and {} tokens",
                outcomes.len(),
                tokens.len()
            )));
        }

        let mut up_token_id = None;
        let mut down_token_id = None;

        for (label, token) in outcomes.iter().zip(tokens.iter()) {
            match label.to_ascii_lowercase().as_str() {
                "up" => up_token_id = Some(token.clone()),
                "down" => down_token_id = Some(token.clone()),
                other => {
                    return Err(PolymarketError::market_structure(format!(
                        "unexpected outcome label: {other}"
                    )));
                }
            }
        }

        match (up_token_id, down_token_id) {
            (Some(up), Some(down)) => Ok(HourlyMarket {
                slug: slug.to_string(),
                question: self.question.unwrap_or_default(),
                condition_id: self.condition_id.unwrap_or_default(),
                up_token_id: up,
                down_token_id: down,
            }),
            _ => Err(PolymarketError::market_structure(
                "outcomes did not contain both Up and Down".to_string(),
            )),
        }
    }
}

// =============================================================================
// GammaClient
// =============================================================================

/// Gamma API client for hourly market discovery.
pub struct GammaClient {
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

impl std::fmt::Debug for GammaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GammaClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GammaClient {
    /// Creates a new client over the given egress.
    ///
    /// Rate limited to 30 requests per minute by default.
    #[must_use]
    pub fn new(http: Arc<ProxiedHttp>) -> Self {
        Self::with_rate_limit(http, nonzero!(30u32))
    }

    /// Creates a new client with custom rate limit.
    #[must_use]
    pub fn with_rate_limit(http: Arc<ProxiedHttp>, requests_per_minute: NonZeroU32) -> Self {
        let quota = Quota::per_minute(requests_per_minute);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        Self {
            http,
            base_url: GAMMA_API_URL.to_string(),
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

    /// Generates the event slug for the hourly BTC market containing `time`.
    ///
    /// Hourly markets are named after their settlement hour in Eastern
    /// time: `bitcoin-up-or-down-august-6-3pm-et`.
    #[must_use]
    pub fn hourly_slug(time: DateTime<Utc>) -> String {
        let eastern = time.with_timezone(&Eastern);
        let month = [
            "january",
            "february",
            "march",
            "april",
            "may",
            "june",
            "july",
            "august",
            "september",
            "october",
            "november",
            "december",
        ][eastern.month0() as usize];

        let (hour12, meridiem) = match eastern.hour() {
            0 => (12, "am"),
            h @ 1..=11 => (h, "am"),
            12 => (12, "pm"),
            h => (h - 12, "pm"),
        };

        format!(
            "bitcoin-up-or-down-{}-{}-{}{}-et",
            month,
            eastern.day(),
            hour12,
            meridiem
        )
    }

    /// Validates a slug string before it is spliced into a URL.
    fn validate_slug(slug: &str) -> Result<&str> {
        if slug.is_empty() {
            return Err(PolymarketError::InvalidRequest(
                "slug cannot be empty".to_string(),
            ));
        }

        if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(PolymarketError::InvalidRequest(format!(
                "invalid slug: must contain only lowercase alphanumerics and hyphens: {slug}"
            )));
        }

        if slug.len() > 128 {
            return Err(PolymarketError::InvalidRequest(format!(
                "invalid slug: exceeds maximum length of 128: {}",
                slug.len()
            )));
        }

        Ok(slug)
    }

    /// Resolves the hourly market behind an event slug.
    ///
    /// # Errors
    /// Returns error if no event exists for the slug, the event has no
    /// markets, or the market payload is malformed.
    pub async fn get_hourly_market(&self, slug: &str) -> Result<(HourlyMarket, Route)> {
        let slug = Self::validate_slug(slug)?;
        self.rate_limiter.until_ready().await;

        let url = format!("{}/events?slug={}", self.base_url, slug);
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

        let events: Vec<RawGammaEvent> = response.json().await?;

        let event = events
            .into_iter()
            .next()
            .ok_or_else(|| PolymarketError::event_not_found(slug))?;

        let market = event
            .markets
            .into_iter()
            .next()
            .ok_or_else(|| PolymarketError::market_structure("event has no markets"))?;

        let resolved_slug = event.slug.unwrap_or_else(|| slug.to_string());
        let hourly = market.into_hourly_market(&resolved_slug)?;

        tracing::debug!(
            slug = %hourly.slug,
            condition_id = %hourly.condition_id,
            route = %route,
            "resolved hourly market"
        );

        Ok((hourly, route))
    }
}
