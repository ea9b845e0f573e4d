//! Two-phase quote acquisition across all three upstream sources.
//!
//! Phase 1 fetches continuous-market metadata, spot price, hourly open,
//! and the discrete ladder concurrently. Phase 2 fetches per-outcome
//! best asks, which need the token ids metadata resolves. Every
//! sub-fetch has its own timeout and its own error capture; a failed
//! fetch becomes a [`FetchFailure`] in the snapshot rather than an
//! early return, so the validator can judge the partial result.
//!
//! Metadata is cached per settlement hour. Crossing an hour boundary
//! changes the cache key, which invalidates the entry without any
//! expiry timer.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hourly_edge_binance::BinanceClient;
use hourly_edge_kalshi::KalshiClient;
use hourly_edge_polymarket::{ClobClient, GammaClient, HourlyMarket};

use crate::types::{FetchFailure, LadderEntry, MarketSnapshot, PhaseTiming, ReferenceQuote};

/// Per-sub-fetch timeout.
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

const SOURCE_GAMMA: &str = "gamma-metadata";
const SOURCE_BINANCE_SPOT: &str = "binance-spot";
const SOURCE_BINANCE_OPEN: &str = "binance-open";
const SOURCE_KALSHI_LADDER: &str = "kalshi-ladder";
const SOURCE_CLOB_UP: &str = "clob-up";
const SOURCE_CLOB_DOWN: &str = "clob-down";

struct CachedMetadata {
    hour_key: String,
    market: HourlyMarket,
}

/// Fetches one [`MarketSnapshot`] per request cycle.
pub struct QuoteAcquirer {
    binance: Arc<BinanceClient>,
    gamma: Arc<GammaClient>,
    clob: Arc<ClobClient>,
    kalshi: Arc<KalshiClient>,
    metadata_cache: Mutex<Option<CachedMetadata>>,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for QuoteAcquirer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuoteAcquirer")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl QuoteAcquirer {
    #[must_use]
    pub fn new(
        binance: Arc<BinanceClient>,
        gamma: Arc<GammaClient>,
        clob: Arc<ClobClient>,
        kalshi: Arc<KalshiClient>,
    ) -> Self {
        Self {
            binance,
            gamma,
            clob,
            kalshi,
            metadata_cache: Mutex::new(None),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
        }
    }

    /// Overrides the per-sub-fetch timeout.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Fetches everything needed for one cycle targeting the given
    /// settlement hour. Never fails; missing data shows up as `None`
    /// fields plus entries in `errors`.
    pub async fn fetch_snapshot(&self, target_time: DateTime<Utc>) -> MarketSnapshot {
        let slug = GammaClient::hourly_slug(target_time);
        let event_ticker = KalshiClient::hourly_event_ticker(target_time);
        let hour_key = target_time.format("%Y-%m-%d-%H").to_string();

        let mut errors = Vec::new();
        let mut routes = BTreeMap::new();
        let mut reference = ReferenceQuote::empty(slug.clone(), target_time);

        let phase1_start = Instant::now();
        let (metadata, spot, open, ladder) = tokio::join!(
            self.fetch_metadata(&slug, &hour_key),
            timed(
                self.fetch_timeout,
                SOURCE_BINANCE_SPOT,
                self.binance.get_spot_price(),
            ),
            timed(
                self.fetch_timeout,
                SOURCE_BINANCE_OPEN,
                self.binance.get_hourly_open(target_time),
            ),
            timed(
                self.fetch_timeout,
                SOURCE_KALSHI_LADDER,
                self.kalshi.get_strike_ladder(&event_ticker),
            ),
        );
        let phase1_ms = phase1_start.elapsed().as_millis() as u64;

        match spot {
            Ok(price) => reference.current_price = Some(price),
            Err(failure) => errors.push(failure),
        }
        match open {
            Ok(price) => reference.open_reference_price = Some(price),
            Err(failure) => errors.push(failure),
        }

        let ladder = match ladder {
            Ok(markets) => markets.into_iter().map(LadderEntry::from).collect(),
            Err(failure) => {
                errors.push(failure);
                Vec::new()
            }
        };

        let phase2_start = Instant::now();
        match metadata {
            Ok((market, route)) => {
                routes.insert(SOURCE_GAMMA.to_string(), route);
                reference.up_token_id = Some(market.up_token_id.clone());
                reference.down_token_id = Some(market.down_token_id.clone());

                let (up, down) = tokio::join!(
                    timed(
                        self.fetch_timeout,
                        SOURCE_CLOB_UP,
                        self.clob.get_best_ask(&market.up_token_id),
                    ),
                    timed(
                        self.fetch_timeout,
                        SOURCE_CLOB_DOWN,
                        self.clob.get_best_ask(&market.down_token_id),
                    ),
                );

                match up {
                    Ok((price, route)) => {
                        reference.up_cost = Some(price);
                        routes.insert(SOURCE_CLOB_UP.to_string(), route.to_string());
                    }
                    Err(failure) => errors.push(failure),
                }
                match down {
                    Ok((price, route)) => {
                        reference.down_cost = Some(price);
                        routes.insert(SOURCE_CLOB_DOWN.to_string(), route.to_string());
                    }
                    Err(failure) => errors.push(failure),
                }
            }
            Err(failure) => {
                // Without token ids there is nothing to price in
                // phase 2. The validator rejects the cycle downstream.
                errors.push(failure);
            }
        }
        let phase2_ms = phase2_start.elapsed().as_millis() as u64;

        let timing = PhaseTiming {
            phase1_ms,
            phase2_ms,
            total_ms: phase1_ms + phase2_ms,
        };

        tracing::debug!(
            slug = %slug,
            event = %event_ticker,
            ladder_len = ladder.len(),
            errors = errors.len(),
            phase1_ms,
            phase2_ms,
            "snapshot fetched"
        );

        MarketSnapshot {
            reference,
            ladder,
            errors,
            routes,
            timing,
            fetched_at: Utc::now(),
        }
    }

    /// Resolves continuous-market metadata, from cache when the hour
    /// key matches, otherwise from the metadata API.
    async fn fetch_metadata(
        &self,
        slug: &str,
        hour_key: &str,
    ) -> Result<(HourlyMarket, String), FetchFailure> {
        if let Some(cached) = self.cached_market(hour_key) {
            return Ok((cached, "cache".to_string()));
        }

        match tokio::time::timeout(self.fetch_timeout, self.gamma.get_hourly_market(slug)).await {
            Ok(Ok((market, route))) => {
                *self.metadata_cache.lock() = Some(CachedMetadata {
                    hour_key: hour_key.to_string(),
                    market: market.clone(),
                });
                Ok((market, route.to_string()))
            }
            Ok(Err(e)) => Err(FetchFailure::new(SOURCE_GAMMA, e.to_string())),
            Err(_) => Err(FetchFailure::new(
                SOURCE_GAMMA,
                format!("timed out after {}s", self.fetch_timeout.as_secs()),
            )),
        }
    }

    fn cached_market(&self, hour_key: &str) -> Option<HourlyMarket> {
        let guard = self.metadata_cache.lock();
        guard
            .as_ref()
            .filter(|cached| cached.hour_key == hour_key)
            .map(|cached| cached.market.clone())
    }
}

async fn timed<T, E>(
    timeout: Duration,
    source: &str,
    fut: impl std::future::Future<Output = Result<T, E>>,
) -> Result<T, FetchFailure>
where
    E: std::fmt::Display,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => Err(FetchFailure::new(source, e.to_string())),
        Err(_) => Err(FetchFailure::new(
            source,
            format!("timed out after {}s", timeout.as_secs()),
        )),
    }
}
