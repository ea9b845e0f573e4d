//! Shared vocabulary for venues, market sides, and order tickets.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==================== Venues ====================

/// The two execution venues this system trades across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Kalshi,
    Polymarket,
}

impl Venue {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Kalshi => "kalshi",
            Self::Polymarket => "polymarket",
        }
    }
}

impl std::fmt::Display for Venue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Market Sides ====================

/// Direction leg on the continuous hourly market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum Outcome {
    Up,
    Down,
}

impl Outcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Up => "Up",
            Self::Down => "Down",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Contract side on a discrete strike market.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractSide {
    Yes,
    No,
}

impl ContractSide {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
        }
    }
}

impl std::fmt::Display for ContractSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Order side across both venue vocabularies.
///
/// Discrete venues accept `Yes`/`No`, the continuous venue accepts
/// `Up`/`Down`. Executors reject sides outside their own vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderSide {
    Yes,
    No,
    Up,
    Down,
}

impl From<Outcome> for OrderSide {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Up => Self::Up,
            Outcome::Down => Self::Down,
        }
    }
}

impl From<ContractSide> for OrderSide {
    fn from(side: ContractSide) -> Self {
        match side {
            ContractSide::Yes => Self::Yes,
            ContractSide::No => Self::No,
        }
    }
}

impl OrderSide {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Up => "up",
            Self::Down => "down",
        }
    }
}

impl std::fmt::Display for OrderSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==================== Orders ====================

/// A single-leg order request handed to an executor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderTicket {
    /// Venue-native market identifier (event ticker or token id).
    pub market_id: String,
    pub side: OrderSide,
    pub quantity: u32,
    /// Worst acceptable price per contract, in dollars.
    pub limit_price: Decimal,
}

/// Confirmation returned by an executor after an order is accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderReceipt {
    pub order_id: String,
    pub venue: Venue,
    /// True when the order was simulated rather than routed to the venue.
    pub paper: bool,
    pub placed_at: DateTime<Utc>,
}

/// Outcome of one leg of a two-leg dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegResult {
    pub venue: Venue,
    pub success: bool,
    pub order_id: Option<String>,
    pub error: Option<String>,
}

impl LegResult {
    #[must_use]
    pub fn filled(receipt: &OrderReceipt) -> Self {
        Self {
            venue: receipt.venue,
            success: true,
            order_id: Some(receipt.order_id.clone()),
            error: None,
        }
    }

    #[must_use]
    pub fn failed(venue: Venue, error: impl Into<String>) -> Self {
        Self {
            venue,
            success: false,
            order_id: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    // ==================== Serde Tests ====================

    #[test]
    fn venue_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Venue::Kalshi).unwrap(), "\"kalshi\"");
        assert_eq!(
            serde_json::to_string(&Venue::Polymarket).unwrap(),
            "\"polymarket\""
        );
    }

    #[test]
    fn outcome_serializes_pascal_case() {
        assert_eq!(serde_json::to_string(&Outcome::Up).unwrap(), "\"Up\"");
        assert_eq!(serde_json::to_string(&Outcome::Down).unwrap(), "\"Down\"");
    }

    #[test]
    fn order_ticket_round_trips() {
        let ticket = OrderTicket {
            market_id: "KXBTCD-25AUG0614-T93000".to_string(),
            side: OrderSide::Yes,
            quantity: 100,
            limit_price: dec!(0.45),
        };
        let json = serde_json::to_string(&ticket).unwrap();
        let back: OrderTicket = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ticket);
    }

    // ==================== Conversion Tests ====================

    #[test]
    fn outcome_maps_to_order_side() {
        assert_eq!(OrderSide::from(Outcome::Up), OrderSide::Up);
        assert_eq!(OrderSide::from(Outcome::Down), OrderSide::Down);
    }

    #[test]
    fn contract_side_maps_to_order_side() {
        assert_eq!(OrderSide::from(ContractSide::Yes), OrderSide::Yes);
        assert_eq!(OrderSide::from(ContractSide::No), OrderSide::No);
    }

    // ==================== Leg Result Tests ====================

    #[test]
    fn leg_result_from_receipt() {
        let receipt = OrderReceipt {
            order_id: "abc-123".to_string(),
            venue: Venue::Kalshi,
            paper: true,
            placed_at: Utc::now(),
        };
        let leg = LegResult::filled(&receipt);
        assert!(leg.success);
        assert_eq!(leg.order_id.as_deref(), Some("abc-123"));
        assert!(leg.error.is_none());
    }

    #[test]
    fn leg_result_failed_carries_error() {
        let leg = LegResult::failed(Venue::Polymarket, "not ready");
        assert!(!leg.success);
        assert_eq!(leg.error.as_deref(), Some("not ready"));
    }
}
