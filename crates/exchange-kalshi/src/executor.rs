//! Order execution against Kalshi.
//!
//! Implements the venue-neutral `OrderExecutor` trait. Paper mode
//! simulates fills locally; live mode submits RSA-signed limit orders
//! through the portfolio endpoint.

use crate::auth::KalshiAuth;
use crate::client::{KalshiClient, KalshiClientConfig};
use crate::error::KalshiError;
use crate::types::{OrderRequest, OrderStatus};
use async_trait::async_trait;
use hourly_edge_core::{ExecutionError, OrderExecutor, OrderReceipt, OrderSide, OrderTicket, Venue};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use uuid::Uuid;

// =============================================================================
// Executor
// =============================================================================

/// Order executor for Kalshi strike markets.
pub struct KalshiExecutor {
    client: KalshiClient,
    paper: bool,
}

impl std::fmt::Debug for KalshiExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KalshiExecutor")
            .field("base_url", &self.client.base_url())
            .field("paper", &self.paper)
            .finish_non_exhaustive()
    }
}

impl KalshiExecutor {
    /// Creates a paper-trading executor. Orders are logged and filled
    /// locally without touching the venue.
    ///
    /// # Errors
    /// Returns error if the client cannot be built.
    pub fn paper(config: KalshiClientConfig) -> Result<Self, ExecutionError> {
        let client = KalshiClient::new(config).map_err(map_kalshi_err)?;
        Ok(Self {
            client,
            paper: true,
        })
    }

    /// Creates a live executor with an RSA signer.
    ///
    /// # Errors
    /// Returns error if the client cannot be built.
    pub fn live(config: KalshiClientConfig, auth: KalshiAuth) -> Result<Self, ExecutionError> {
        let client = KalshiClient::new(config)
            .map_err(map_kalshi_err)?
            .with_auth(auth);
        Ok(Self {
            client,
            paper: false,
        })
    }

    /// Sets a custom base URL (useful for testing).
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.client = self.client.with_base_url(url);
        self
    }

    /// Converts a dollar limit price into venue cents.
    ///
    /// Rounds up, so the limit still crosses the ask it was derived
    /// from. Kalshi only accepts 1-99.
    fn price_cents(price: Decimal) -> Result<u32, ExecutionError> {
        let cents = (price * Decimal::from(100)).ceil();
        let cents = cents.to_u32().ok_or_else(|| {
            ExecutionError::InvalidOrder(format!("limit price {price} does not map to cents"))
        })?;

        if !(1..=99).contains(&cents) {
            return Err(ExecutionError::InvalidOrder(format!(
                "limit price {price} maps to {cents} cents, outside 1-99"
            )));
        }

        Ok(cents)
    }

    /// Rejects tickets this venue cannot express.
    ///
    /// Strike markets trade Yes and No contracts. Up/Down sides belong
    /// to the continuous venue and indicate a routing bug upstream.
    fn validate_ticket(ticket: &OrderTicket) -> Result<u32, ExecutionError> {
        match ticket.side {
            OrderSide::Yes | OrderSide::No => {}
            OrderSide::Up | OrderSide::Down => {
                return Err(ExecutionError::InvalidOrder(format!(
                    "side {:?} is not tradeable on kalshi",
                    ticket.side
                )));
            }
        }

        if ticket.quantity == 0 {
            return Err(ExecutionError::InvalidOrder(
                "quantity must be positive".to_string(),
            ));
        }

        if ticket.market_id.is_empty() {
            return Err(ExecutionError::InvalidOrder(
                "market ticker cannot be empty".to_string(),
            ));
        }

        Self::price_cents(ticket.limit_price)
    }

    fn paper_fill(&self, ticket: &OrderTicket, cents: u32) -> OrderReceipt {
        let receipt = OrderReceipt {
            order_id: format!("paper-{}", Uuid::new_v4()),
            venue: Venue::Kalshi,
            paper: true,
            placed_at: chrono::Utc::now(),
        };

        tracing::info!(
            ticker = %ticket.market_id,
            side = ?ticket.side,
            quantity = ticket.quantity,
            price_cents = cents,
            order_id = %receipt.order_id,
            "paper order filled"
        );

        receipt
    }

    async fn submit_live(
        &self,
        ticket: &OrderTicket,
        cents: u32,
    ) -> Result<OrderReceipt, ExecutionError> {
        let request = match ticket.side {
            OrderSide::Yes => OrderRequest::buy_yes(&ticket.market_id, cents, ticket.quantity),
            _ => OrderRequest::buy_no(&ticket.market_id, cents, ticket.quantity),
        }
        .with_client_order_id(Uuid::new_v4().to_string());

        let order = self
            .client
            .submit_order(&request)
            .await
            .map_err(map_kalshi_err)?;

        if order.status == OrderStatus::Rejected {
            return Err(ExecutionError::Rejected(format!(
                "order {} rejected by venue",
                order.order_id
            )));
        }

        tracing::info!(
            ticker = %ticket.market_id,
            order_id = %order.order_id,
            status = ?order.status,
            "order submitted"
        );

        Ok(OrderReceipt {
            order_id: order.order_id,
            venue: Venue::Kalshi,
            paper: false,
            placed_at: chrono::Utc::now(),
        })
    }
}

fn map_kalshi_err(err: KalshiError) -> ExecutionError {
    match err {
        KalshiError::Authentication(m) | KalshiError::Signing(m) | KalshiError::Configuration(m) => {
            ExecutionError::Auth(m)
        }
        KalshiError::InvalidOrder(m) | KalshiError::InvalidRequest(m) => {
            ExecutionError::InvalidOrder(m)
        }
        KalshiError::OrderRejected(m) => ExecutionError::Rejected(m),
        KalshiError::Api {
            status_code,
            message,
        } => ExecutionError::Rejected(format!("HTTP {status_code}: {message}")),
        other => ExecutionError::Network(other.to_string()),
    }
}

#[async_trait]
impl OrderExecutor for KalshiExecutor {
    fn venue(&self) -> Venue {
        Venue::Kalshi
    }

    fn is_paper(&self) -> bool {
        self.paper
    }

    async fn is_ready(&self) -> bool {
        self.paper || self.client.has_auth()
    }

    async fn place_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError> {
        let cents = Self::validate_ticket(ticket)?;

        if self.paper {
            return Ok(self.paper_fill(ticket, cents));
        }

        self.submit_live(ticket, cents).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ticket(side: OrderSide) -> OrderTicket {
        OrderTicket {
            market_id: "KXBTCD-25AUG0616-B93000".to_string(),
            side,
            quantity: 100,
            limit_price: dec!(0.45),
        }
    }

    // ==================== Price Conversion Tests ====================

    #[test]
    fn test_price_cents_exact() {
        assert_eq!(KalshiExecutor::price_cents(dec!(0.45)).unwrap(), 45);
        assert_eq!(KalshiExecutor::price_cents(dec!(0.01)).unwrap(), 1);
        assert_eq!(KalshiExecutor::price_cents(dec!(0.99)).unwrap(), 99);
    }

    #[test]
    fn test_price_cents_rounds_up() {
        assert_eq!(KalshiExecutor::price_cents(dec!(0.451)).unwrap(), 46);
        assert_eq!(KalshiExecutor::price_cents(dec!(0.005)).unwrap(), 1);
    }

    #[test]
    fn test_price_cents_out_of_range() {
        assert!(KalshiExecutor::price_cents(dec!(0)).is_err());
        assert!(KalshiExecutor::price_cents(dec!(1)).is_err());
        assert!(KalshiExecutor::price_cents(dec!(0.995)).is_err());
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_rejects_up_down_sides() {
        assert!(matches!(
            KalshiExecutor::validate_ticket(&ticket(OrderSide::Up)),
            Err(ExecutionError::InvalidOrder(_))
        ));
        assert!(matches!(
            KalshiExecutor::validate_ticket(&ticket(OrderSide::Down)),
            Err(ExecutionError::InvalidOrder(_))
        ));
    }

    #[test]
    fn test_accepts_yes_no_sides() {
        assert_eq!(
            KalshiExecutor::validate_ticket(&ticket(OrderSide::Yes)).unwrap(),
            45
        );
        assert_eq!(
            KalshiExecutor::validate_ticket(&ticket(OrderSide::No)).unwrap(),
            45
        );
    }

    #[test]
    fn test_rejects_zero_quantity() {
        let mut t = ticket(OrderSide::Yes);
        t.quantity = 0;
        assert!(KalshiExecutor::validate_ticket(&t).is_err());
    }

    #[test]
    fn test_rejects_empty_ticker() {
        let mut t = ticket(OrderSide::Yes);
        t.market_id = String::new();
        assert!(KalshiExecutor::validate_ticket(&t).is_err());
    }

    // ==================== Paper Mode Tests ====================

    #[tokio::test]
    async fn test_paper_order_fills_locally() {
        let executor = KalshiExecutor::paper(KalshiClientConfig::demo()).unwrap();
        assert!(executor.is_paper());
        assert!(executor.is_ready().await);
        assert_eq!(executor.venue(), Venue::Kalshi);

        let receipt = executor.place_order(&ticket(OrderSide::Yes)).await.unwrap();

        assert!(receipt.paper);
        assert_eq!(receipt.venue, Venue::Kalshi);
        assert!(receipt.order_id.starts_with("paper-"));
    }

    #[tokio::test]
    async fn test_paper_order_still_validates() {
        let executor = KalshiExecutor::paper(KalshiClientConfig::demo()).unwrap();
        let err = executor
            .place_order(&ticket(OrderSide::Up))
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionError::InvalidOrder(_)));
    }

    // ==================== Error Mapping Tests ====================

    #[test]
    fn test_map_auth_errors() {
        assert!(matches!(
            map_kalshi_err(KalshiError::Authentication("x".to_string())),
            ExecutionError::Auth(_)
        ));
        assert!(matches!(
            map_kalshi_err(KalshiError::Signing("x".to_string())),
            ExecutionError::Auth(_)
        ));
    }

    #[test]
    fn test_map_rejection_errors() {
        assert!(matches!(
            map_kalshi_err(KalshiError::api(400, "bad")),
            ExecutionError::Rejected(_)
        ));
        assert!(matches!(
            map_kalshi_err(KalshiError::OrderRejected("no".to_string())),
            ExecutionError::Rejected(_)
        ));
    }

    #[test]
    fn test_map_transport_errors() {
        assert!(matches!(
            map_kalshi_err(KalshiError::Timeout("10s".to_string())),
            ExecutionError::Network(_)
        ));
        assert!(matches!(
            map_kalshi_err(KalshiError::rate_limit(30)),
            ExecutionError::Network(_)
        ));
    }
}
