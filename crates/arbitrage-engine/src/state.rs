//! Process-wide trading state.
//!
//! Shared between concurrent request cycles and the HTTP surface, so
//! all access goes through an `Arc<RwLock<TradingState>>`. Locks are
//! held only for the duration of a read or a single mutation, never
//! across an await point.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

use crate::types::TradeRecord;

/// Oldest records are evicted once the history reaches this size.
pub const TRADE_HISTORY_CAPACITY: usize = 100;

/// Shared handle to the trading state.
pub type SharedTradingState = Arc<RwLock<TradingState>>;

/// Mutable trading state for the whole process.
#[derive(Debug)]
pub struct TradingState {
    auto_trade_enabled: bool,
    last_trade_at: Option<DateTime<Utc>>,
    history: VecDeque<TradeRecord>,
    continuous_ready: bool,
    discrete_ready: bool,
}

impl Default for TradingState {
    fn default() -> Self {
        Self::new()
    }
}

impl TradingState {
    /// Fresh state: auto-trade off, empty history, executors assumed
    /// not ready until a readiness probe says otherwise.
    #[must_use]
    pub fn new() -> Self {
        Self {
            auto_trade_enabled: false,
            last_trade_at: None,
            history: VecDeque::with_capacity(TRADE_HISTORY_CAPACITY),
            continuous_ready: false,
            discrete_ready: false,
        }
    }

    /// Wraps fresh state in a shared handle.
    #[must_use]
    pub fn shared() -> SharedTradingState {
        Arc::new(RwLock::new(Self::new()))
    }

    #[must_use]
    pub fn auto_trade_enabled(&self) -> bool {
        self.auto_trade_enabled
    }

    pub fn set_auto_trade(&mut self, enabled: bool) {
        self.auto_trade_enabled = enabled;
    }

    #[must_use]
    pub fn last_trade_at(&self) -> Option<DateTime<Utc>> {
        self.last_trade_at
    }

    pub fn set_readiness(&mut self, continuous: bool, discrete: bool) {
        self.continuous_ready = continuous;
        self.discrete_ready = discrete;
    }

    #[must_use]
    pub fn continuous_ready(&self) -> bool {
        self.continuous_ready
    }

    #[must_use]
    pub fn discrete_ready(&self) -> bool {
        self.discrete_ready
    }

    /// Appends a finalized record, evicting the oldest past capacity.
    pub fn record_trade(&mut self, record: TradeRecord) {
        self.last_trade_at = Some(record.executed_at);
        if self.history.len() == TRADE_HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(record);
    }

    /// Returns up to `limit` records, newest first.
    #[must_use]
    pub fn recent_trades(&self, limit: usize) -> Vec<TradeRecord> {
        self.history.iter().rev().take(limit).cloned().collect()
    }

    #[must_use]
    pub fn trades_recorded(&self) -> usize {
        self.history.len()
    }

    /// Immutable snapshot for serialization into HTTP responses.
    #[must_use]
    pub fn view(&self) -> TradingStateView {
        TradingStateView {
            auto_trade_enabled: self.auto_trade_enabled,
            last_trade_at: self.last_trade_at,
            continuous_ready: self.continuous_ready,
            discrete_ready: self.discrete_ready,
            trades_recorded: self.history.len(),
        }
    }
}

/// Read-only copy of the trading state at one instant.
#[derive(Debug, Clone, Serialize)]
pub struct TradingStateView {
    pub auto_trade_enabled: bool,
    pub last_trade_at: Option<DateTime<Utc>>,
    pub continuous_ready: bool,
    pub discrete_ready: bool,
    pub trades_recorded: usize,
}
