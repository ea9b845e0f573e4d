//! Binance reference-price feed.
//!
//! Thin client over the public spot endpoints used to anchor the hourly
//! arbitrage cycle: the live ticker price and the 1h candle open.

pub mod client;
pub mod error;

pub use client::{BinanceClient, BinanceClientConfig, BINANCE_US_URL};
pub use error::{BinanceError, Result};
