//! Data models for Kalshi exchange integration.
//!
//! All financial values use `rust_decimal::Decimal` for precision.
//! Kalshi quotes prices in cents (1-99) on the wire; conversion to
//! dollar probabilities happens at the response boundary.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// =============================================================================
// Strike Markets
// =============================================================================

/// One strike-indexed market from an hourly event ladder.
///
/// Prices are dollar probabilities in [0, 1], already converted from
/// the venue's cent quotes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrikeMarket {
    /// Market ticker (e.g., "KXBTCD-25AUG0616-B93250").
    pub ticker: String,

    /// Strike threshold parsed from the market subtitle.
    pub strike: Decimal,

    /// Cost of a YES contract in dollars.
    pub yes_ask: Decimal,

    /// Cost of a NO contract in dollars.
    pub no_ask: Decimal,

    /// Raw subtitle the strike was parsed from.
    pub subtitle: String,
}

// =============================================================================
// Order Types
// =============================================================================

/// Side of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Buy YES contracts.
    Yes,
    /// Buy NO contracts.
    No,
}

impl Side {
    /// Returns the API string representation.
    #[must_use]
    pub fn as_api_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

/// Order action (buy or sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Buy contracts.
    Buy,
    /// Sell contracts.
    Sell,
}

/// Order type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order (fill at best available).
    Market,
    /// Limit order (fill at specified price or better).
    Limit,
}

/// Request to submit an order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderRequest {
    /// Market ticker.
    pub ticker: String,

    /// Side (yes/no).
    pub side: Side,

    /// Action (buy/sell).
    pub action: Action,

    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,

    /// Number of contracts.
    pub count: u32,

    /// Price in cents (1-99) when buying YES.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yes_price: Option<u32>,

    /// Price in cents (1-99) when buying NO.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_price: Option<u32>,

    /// Client-specified order ID.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
}

impl OrderRequest {
    /// Creates a limit buy order for YES contracts.
    pub fn buy_yes(ticker: impl Into<String>, price_cents: u32, count: u32) -> Self {
        Self {
            ticker: ticker.into(),
            side: Side::Yes,
            action: Action::Buy,
            order_type: OrderType::Limit,
            count,
            yes_price: Some(price_cents),
            no_price: None,
            client_order_id: None,
        }
    }

    /// Creates a limit buy order for NO contracts.
    pub fn buy_no(ticker: impl Into<String>, price_cents: u32, count: u32) -> Self {
        Self {
            ticker: ticker.into(),
            side: Side::No,
            action: Action::Buy,
            order_type: OrderType::Limit,
            count,
            yes_price: None,
            no_price: Some(price_cents),
            client_order_id: None,
        }
    }

    /// Sets a client order ID.
    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Returns the order value in cents.
    #[must_use]
    pub fn order_value_cents(&self) -> u64 {
        let price = u64::from(self.yes_price.or(self.no_price).unwrap_or(50));
        price * u64::from(self.count)
    }
}

/// Status of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order is pending (not yet on book).
    Pending,
    /// Order is resting on the book.
    Resting,
    /// Order was fully filled.
    Filled,
    /// Order was cancelled.
    Cancelled,
    /// Order was rejected.
    Rejected,
}

impl OrderStatus {
    /// Returns true if the order is in a terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Filled | Self::Cancelled | Self::Rejected)
    }
}

/// Response from order submission.
#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    /// Order ID assigned by the venue.
    pub order_id: String,

    /// Client order ID if provided.
    #[serde(default)]
    pub client_order_id: Option<String>,

    /// Market ticker.
    pub ticker: String,

    /// Side (yes/no).
    pub side: Side,

    /// Order status.
    pub status: OrderStatus,

    /// Order creation time.
    #[serde(default)]
    pub created_time: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ==================== StrikeMarket Tests ====================

    #[test]
    fn test_strike_market_serde_round_trip() {
        let market = StrikeMarket {
            ticker: "KXBTCD-25AUG0616-B93250".to_string(),
            strike: dec!(93250),
            yes_ask: dec!(0.45),
            no_ask: dec!(0.56),
            subtitle: "$93,250 or above".to_string(),
        };

        let json = serde_json::to_string(&market).unwrap();
        let back: StrikeMarket = serde_json::from_str(&json).unwrap();
        assert_eq!(back.strike, dec!(93250));
        assert_eq!(back.yes_ask, dec!(0.45));
    }

    // ==================== Side Tests ====================

    #[test]
    fn test_side_api_str() {
        assert_eq!(Side::Yes.as_api_str(), "yes");
        assert_eq!(Side::No.as_api_str(), "no");
    }

    #[test]
    fn test_side_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Side::Yes).unwrap(), "\"yes\"");
        assert_eq!(serde_json::to_string(&Side::No).unwrap(), "\"no\"");
    }

    // ==================== OrderRequest Tests ====================

    #[test]
    fn test_order_request_buy_yes() {
        let order = OrderRequest::buy_yes("KXBTCD-TEST", 45, 100);

        assert_eq!(order.ticker, "KXBTCD-TEST");
        assert_eq!(order.side, Side::Yes);
        assert_eq!(order.action, Action::Buy);
        assert_eq!(order.order_type, OrderType::Limit);
        assert_eq!(order.count, 100);
        assert_eq!(order.yes_price, Some(45));
        assert!(order.no_price.is_none());
    }

    #[test]
    fn test_order_request_buy_no() {
        let order = OrderRequest::buy_no("KXBTCD-TEST", 55, 50);

        assert_eq!(order.side, Side::No);
        assert!(order.yes_price.is_none());
        assert_eq!(order.no_price, Some(55));
    }

    #[test]
    fn test_order_request_serializes_type_field() {
        let order = OrderRequest::buy_yes("KXBTCD-TEST", 45, 100);
        let json = serde_json::to_value(&order).unwrap();

        assert_eq!(json["type"], "limit");
        assert_eq!(json["action"], "buy");
        assert_eq!(json["yes_price"], 45);
        assert!(json.get("no_price").is_none());
    }

    #[test]
    fn test_order_request_with_client_id() {
        let order =
            OrderRequest::buy_yes("KXBTCD-TEST", 45, 100).with_client_order_id("my-order-123");

        assert_eq!(order.client_order_id, Some("my-order-123".to_string()));
    }

    #[test]
    fn test_order_request_value_cents() {
        let order = OrderRequest::buy_yes("KXBTCD-TEST", 45, 100);
        assert_eq!(order.order_value_cents(), 4500);
    }

    // ==================== OrderStatus Tests ====================

    #[test]
    fn test_order_status_terminal() {
        assert!(OrderStatus::Filled.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(OrderStatus::Rejected.is_terminal());
        assert!(!OrderStatus::Pending.is_terminal());
        assert!(!OrderStatus::Resting.is_terminal());
    }

    // ==================== Order Tests ====================

    #[test]
    fn test_order_deserializes() {
        let json = serde_json::json!({
            "order_id": "order-123",
            "ticker": "KXBTCD-TEST",
            "side": "yes",
            "status": "resting"
        });

        let order: Order = serde_json::from_value(json).unwrap();
        assert_eq!(order.order_id, "order-123");
        assert_eq!(order.side, Side::Yes);
        assert_eq!(order.status, OrderStatus::Resting);
        assert!(order.client_order_id.is_none());
    }
}
