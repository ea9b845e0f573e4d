use crate::types::{OrderReceipt, OrderTicket, Venue};
use async_trait::async_trait;
use thiserror::Error;

/// Errors surfaced by order executors.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("{venue} executor is not ready: {reason}")]
    NotReady { venue: Venue, reason: String },

    #[error("invalid order: {0}")]
    InvalidOrder(String),

    #[error("order rejected by venue: {0}")]
    Rejected(String),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Places single-leg orders on one venue.
///
/// Implementations decide internally whether an order is simulated
/// (paper mode) or routed to the venue. Callers treat both the same.
#[async_trait]
pub trait OrderExecutor: Send + Sync {
    /// The venue this executor routes to.
    fn venue(&self) -> Venue;

    /// True when orders are simulated locally.
    fn is_paper(&self) -> bool;

    /// Whether the executor is configured well enough to accept orders.
    async fn is_ready(&self) -> bool;

    /// Places a single order and returns a receipt on acceptance.
    async fn place_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError>;
}
