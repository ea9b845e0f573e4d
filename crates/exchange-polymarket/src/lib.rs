//! Polymarket Gamma and CLOB integration.
//!
//! This crate provides:
//! - Gamma API client for hourly market discovery by slug
//! - CLOB REST client for order book best-ask queries
//! - L2 HMAC authentication for order endpoints
//! - Proxy-aware HTTP egress with direct fallback
//! - Order executor with paper and live modes
//!
//! # Example
//!
//! ```no_run
//! use hourly_edge_polymarket::{ClobClient, GammaClient, ProxiedHttp};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let http = Arc::new(ProxiedHttp::direct_only(10)?);
//!     let gamma = GammaClient::new(Arc::clone(&http));
//!     let clob = ClobClient::new(http);
//!
//!     let slug = GammaClient::hourly_slug(chrono::Utc::now());
//!     let (market, _) = gamma.get_hourly_market(&slug).await?;
//!     let (best_ask, _) = clob.get_best_ask(&market.up_token_id).await?;
//!     println!("{}: up asks {}", market.slug, best_ask);
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod clob;
pub mod egress;
pub mod error;
pub mod executor;
pub mod gamma;

// Re-export main types
pub use auth::{ApiCredentials, L2Auth, L2Headers};
pub use clob::{ClobClient, CLOB_API_URL};
pub use egress::{ProxiedHttp, Route};
pub use error::{PolymarketError, Result};
pub use executor::PolymarketExecutor;
pub use gamma::{GammaClient, HourlyMarket, GAMMA_API_URL};
