//! Core types for the arbitrage decision engine.
//!
//! One request cycle flows through these types in order: a
//! [`MarketSnapshot`] out of acquisition, [`Check`]s out of the aligner
//! and fee model, a [`SyncVerdict`] out of the validator, and
//! [`TradeRecord`]s out of the dispatcher.

use chrono::{DateTime, Utc};
use hourly_edge_core::{ContractSide, LegResult, Outcome};
use hourly_edge_kalshi::StrikeMarket;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::fees::FeeBreakdown;

// =============================================================================
// Reference Quote
// =============================================================================

/// Continuous-market snapshot for one settlement hour.
///
/// Built once per request cycle and never mutated afterwards. Prices
/// are dollar probabilities in [0, 1]. `open_reference_price` stays
/// `None` until the underlying hourly candle has posted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceQuote {
    /// Event slug the quote was resolved from.
    pub slug: String,

    /// Settlement hour this quote targets.
    pub target_time: DateTime<Utc>,

    /// Open of the underlying hourly candle, i.e. the reference strike.
    pub open_reference_price: Option<Decimal>,

    /// Current spot price of the underlying.
    pub current_price: Option<Decimal>,

    /// Best ask for the Up outcome.
    pub up_cost: Option<Decimal>,

    /// Best ask for the Down outcome.
    pub down_cost: Option<Decimal>,

    /// CLOB token id settling on Up.
    pub up_token_id: Option<String>,

    /// CLOB token id settling on Down.
    pub down_token_id: Option<String>,
}

impl ReferenceQuote {
    /// Returns an empty quote targeting the given hour. Fields fill in
    /// as acquisition sub-fetches land.
    #[must_use]
    pub fn empty(slug: impl Into<String>, target_time: DateTime<Utc>) -> Self {
        Self {
            slug: slug.into(),
            target_time,
            open_reference_price: None,
            current_price: None,
            up_cost: None,
            down_cost: None,
            up_token_id: None,
            down_token_id: None,
        }
    }

    /// Returns the best-ask cost for an outcome, if fetched.
    #[must_use]
    pub fn cost(&self, outcome: Outcome) -> Option<Decimal> {
        match outcome {
            Outcome::Up => self.up_cost,
            Outcome::Down => self.down_cost,
        }
    }

    /// Returns the settlement token id for an outcome, if known.
    #[must_use]
    pub fn token_id(&self, outcome: Outcome) -> Option<&str> {
        match outcome {
            Outcome::Up => self.up_token_id.as_deref(),
            Outcome::Down => self.down_token_id.as_deref(),
        }
    }
}

// =============================================================================
// Ladder
// =============================================================================

/// One discrete strike market in the hourly ladder.
///
/// A ladder is a `Vec<LadderEntry>` sorted ascending by strike; window
/// selection in the aligner depends on that ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LadderEntry {
    /// Venue-native market ticker, used only for dispatch.
    pub ticker: String,

    /// Strike threshold.
    pub strike: Decimal,

    /// Cost of a YES contract in dollars.
    pub yes_ask: Decimal,

    /// Cost of a NO contract in dollars.
    pub no_ask: Decimal,
}

impl From<StrikeMarket> for LadderEntry {
    fn from(market: StrikeMarket) -> Self {
        Self {
            ticker: market.ticker,
            strike: market.strike,
            yes_ask: market.yes_ask,
            no_ask: market.no_ask,
        }
    }
}

// =============================================================================
// Acquisition Output
// =============================================================================

/// One failed sub-fetch, captured as data rather than aborting the cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchFailure {
    /// Which source failed (e.g. "binance-spot", "kalshi-ladder").
    pub source: String,

    /// Human-readable failure description.
    pub message: String,
}

impl FetchFailure {
    #[must_use]
    pub fn new(source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            message: message.into(),
        }
    }
}

/// Wall-clock duration of each acquisition phase, in milliseconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase1_ms: u64,
    pub phase2_ms: u64,
    pub total_ms: u64,
}

/// Everything one request cycle fetched, including what failed.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSnapshot {
    /// Continuous-market quote.
    pub reference: ReferenceQuote,

    /// Discrete ladder, sorted ascending by strike.
    pub ladder: Vec<LadderEntry>,

    /// Sub-fetch failures. Empty on full success.
    pub errors: Vec<FetchFailure>,

    /// Egress route used per source, for diagnosability.
    pub routes: BTreeMap<String, String>,

    /// Per-phase fetch timing.
    pub timing: PhaseTiming,

    /// When the snapshot was taken.
    pub fetched_at: DateTime<Utc>,
}

// =============================================================================
// Checks and Opportunities
// =============================================================================

/// How the reference strike relates to a ladder entry's strike.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Relation {
    /// Reference below the entry strike: pair Up with No.
    Above,
    /// Reference above the entry strike: pair Down with Yes.
    Below,
    /// Exact match: both pairings are valid.
    Equal,
}

/// One evaluated strike-pairing.
///
/// The pairing is constructed so that exactly one leg pays $1 when the
/// discrete outcome realizes. `Equal` relations produce two checks,
/// `Above` and `Below` exactly one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    pub relation: Relation,

    /// Strike of the ladder entry this check pairs against.
    pub strike: Decimal,

    /// Ladder ticker for the discrete leg, used for dispatch.
    pub ladder_ticker: String,

    /// Chosen continuous leg.
    pub continuous_leg: Outcome,

    /// Best-ask cost of the continuous leg.
    pub continuous_cost: Decimal,

    /// CLOB token id for the continuous leg, used for dispatch.
    pub continuous_token_id: String,

    /// Chosen discrete leg.
    pub contract_leg: ContractSide,

    /// Best-ask cost of the discrete leg.
    pub contract_cost: Decimal,

    /// `continuous_cost + contract_cost`.
    pub total_cost: Decimal,

    /// `1.0 - total_cost`, per contract, before fees.
    pub gross_margin: Decimal,

    /// Fee breakdown at the evaluated contract count.
    pub fees: FeeBreakdown,

    /// Gross margin minus all fees, per contract.
    pub net_margin: Decimal,

    /// True when the net margin is positive.
    pub profitable_after_fees: bool,

    /// True when this check's leg costs sit in the suspicious range
    /// near an hour boundary. Suppressed checks never auto-trade.
    pub suppressed: bool,
}

impl Check {
    /// Returns a copy with monetary fields rounded to 4 decimal places
    /// for presentation. Comparisons always use the unrounded values.
    #[must_use]
    pub fn rounded(&self) -> Self {
        let mut check = self.clone();
        check.total_cost = check.total_cost.round_dp(4);
        check.gross_margin = check.gross_margin.round_dp(4);
        check.net_margin = check.net_margin.round_dp(4);
        check.fees = check.fees.rounded();
        check
    }
}

/// A check that cleared every gate: positive gross margin, fees
/// computed, not suppressed, cycle not transition-blocked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Opportunity {
    pub check: Check,
}

impl Opportunity {
    #[must_use]
    pub fn net_margin(&self) -> Decimal {
        self.check.net_margin
    }
}

// =============================================================================
// Validator Verdict
// =============================================================================

/// Result of the transition-safety validator for one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncVerdict {
    /// True when every sync check passed.
    pub synced: bool,

    /// Ordered descriptions of failed sync checks.
    pub issues: Vec<String>,

    /// Non-blocking observations (e.g. outcome costs summing oddly).
    pub warnings: Vec<String>,

    /// True when anomaly detection fired.
    pub anomaly_detected: bool,

    /// Why the anomaly fired, when it did.
    pub anomaly_reason: Option<String>,

    /// `!synced || anomaly_detected`. Blocked cycles produce zero
    /// opportunities and never auto-trade.
    pub transition_blocked: bool,
}

impl SyncVerdict {
    /// A passing verdict with no issues.
    #[must_use]
    pub fn clean() -> Self {
        Self {
            synced: true,
            issues: Vec::new(),
            warnings: Vec::new(),
            anomaly_detected: false,
            anomaly_reason: None,
            transition_blocked: false,
        }
    }
}

/// Where the cycle sits relative to the settlement-hour boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BoundaryStatus {
    /// Wall-clock minute of the cycle.
    pub minute: u32,

    /// True when within the hard-block window (minute <= 2 or >= 58).
    pub near_boundary: bool,
}

// =============================================================================
// Trade Records
// =============================================================================

/// Terminal status of a two-leg dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeStatus {
    Pending,
    /// Both legs placed.
    Executed,
    /// Exactly one leg placed.
    Partial,
    /// Neither leg placed.
    Failed,
}

/// One dispatch attempt, success or not. Append-only once finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeRecord {
    pub id: Uuid,

    /// Strike the opportunity paired against.
    pub strike: Decimal,

    pub continuous_leg: Outcome,
    pub continuous_cost: Decimal,
    pub contract_leg: ContractSide,
    pub contract_cost: Decimal,

    /// Net margin of the opportunity at dispatch time.
    pub net_margin: Decimal,

    /// Requested contracts per leg.
    pub quantity: u32,

    /// Continuous-venue leg outcome.
    pub continuous_result: LegResult,

    /// Discrete-venue leg outcome.
    pub contract_result: LegResult,

    pub status: TradeStatus,

    pub executed_at: DateTime<Utc>,
}

impl TradeRecord {
    /// Derives the overall status from the two leg results.
    #[must_use]
    pub fn status_from_legs(continuous: &LegResult, contract: &LegResult) -> TradeStatus {
        match (continuous.success, contract.success) {
            (true, true) => TradeStatus::Executed,
            (false, false) => TradeStatus::Failed,
            _ => TradeStatus::Partial,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hourly_edge_core::Venue;
    use rust_decimal_macros::dec;

    // ==================== ReferenceQuote Tests ====================

    #[test]
    fn test_reference_quote_empty() {
        let quote = ReferenceQuote::empty("bitcoin-up-or-down-august-6-3pm-et", Utc::now());
        assert!(quote.open_reference_price.is_none());
        assert!(quote.cost(Outcome::Up).is_none());
        assert!(quote.token_id(Outcome::Down).is_none());
    }

    #[test]
    fn test_reference_quote_accessors() {
        let mut quote = ReferenceQuote::empty("slug", Utc::now());
        quote.up_cost = Some(dec!(0.48));
        quote.down_cost = Some(dec!(0.53));
        quote.up_token_id = Some("111".to_string());
        quote.down_token_id = Some("222".to_string());

        assert_eq!(quote.cost(Outcome::Up), Some(dec!(0.48)));
        assert_eq!(quote.cost(Outcome::Down), Some(dec!(0.53)));
        assert_eq!(quote.token_id(Outcome::Up), Some("111"));
        assert_eq!(quote.token_id(Outcome::Down), Some("222"));
    }

    // ==================== LadderEntry Tests ====================

    #[test]
    fn test_ladder_entry_from_strike_market() {
        let market = StrikeMarket {
            ticker: "KXBTCD-25AUG0616-B93000".to_string(),
            strike: dec!(93000),
            yes_ask: dec!(0.45),
            no_ask: dec!(0.56),
            subtitle: "$93,000 or above".to_string(),
        };

        let entry = LadderEntry::from(market);
        assert_eq!(entry.strike, dec!(93000));
        assert_eq!(entry.yes_ask, dec!(0.45));
        assert_eq!(entry.no_ask, dec!(0.56));
    }

    // ==================== Verdict Tests ====================

    #[test]
    fn test_clean_verdict_not_blocked() {
        let verdict = SyncVerdict::clean();
        assert!(verdict.synced);
        assert!(!verdict.transition_blocked);
        assert!(verdict.issues.is_empty());
    }

    // ==================== TradeRecord Tests ====================

    #[test]
    fn test_status_from_legs() {
        let ok = LegResult {
            venue: Venue::Kalshi,
            success: true,
            order_id: Some("x".to_string()),
            error: None,
        };
        let bad = LegResult::failed(Venue::Polymarket, "boom");

        assert_eq!(TradeRecord::status_from_legs(&ok, &ok), TradeStatus::Executed);
        assert_eq!(TradeRecord::status_from_legs(&ok, &bad), TradeStatus::Partial);
        assert_eq!(TradeRecord::status_from_legs(&bad, &ok), TradeStatus::Partial);
        assert_eq!(TradeRecord::status_from_legs(&bad, &bad), TradeStatus::Failed);
    }

    #[test]
    fn test_trade_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&TradeStatus::Partial).unwrap(),
            "\"partial\""
        );
    }
}
