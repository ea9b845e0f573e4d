//! Kalshi exchange integration for the hourly edge engine.
//!
//! This crate provides:
//! - REST client with rate limiting for the Kalshi trading API
//! - Strike-ladder discovery keyed by hourly event ticker
//! - RSA-PSS request signing
//! - Order executor with paper and live modes
//!
//! # Example
//!
//! ```ignore
//! use hourly_edge_kalshi::{KalshiClient, KalshiClientConfig, KalshiExecutor};
//! use chrono::Utc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Public market data needs no credentials
//!     let client = KalshiClient::new(KalshiClientConfig::production())?;
//!
//!     let event = client.hourly_event_ticker(Utc::now());
//!     let ladder = client.get_strike_ladder(&event).await?;
//!     println!("{} strikes in {event}", ladder.len());
//!
//!     // Paper executor fills locally without touching the venue
//!     let executor = KalshiExecutor::paper(KalshiClientConfig::demo())?;
//!     assert!(executor.is_paper());
//!
//!     Ok(())
//! }
//! ```
//!
//! # Authentication
//!
//! Kalshi authenticates requests with RSA-PSS (SHA-256) signatures over
//! `timestamp + method + path + body`. Live trading requires an API key
//! id and a PEM-encoded private key file; see [`KalshiAuth`].

pub mod auth;
pub mod client;
pub mod error;
pub mod executor;
pub mod types;

pub use auth::{KalshiAuth, SignedHeaders};
pub use client::{
    KalshiClient, KalshiClientConfig, HOURLY_BTC_SERIES, KALSHI_DEMO_URL, KALSHI_PROD_URL,
};
pub use error::{KalshiError, Result};
pub use executor::KalshiExecutor;
pub use types::{Action, Order, OrderRequest, OrderStatus, OrderType, Side, StrikeMarket};
