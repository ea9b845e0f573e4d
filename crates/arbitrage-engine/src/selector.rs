//! Opportunity selection and two-leg dispatch.
//!
//! Selection is pure: tag the best check for observability, pick the
//! auto-trade candidate among profitable unsuppressed checks, derive
//! opportunities unless the cycle is blocked. Dispatch places both
//! legs independently; neither leg waits on or rolls back the other.

use chrono::Utc;
use rust_decimal::Decimal;
use std::sync::Arc;
use uuid::Uuid;

use hourly_edge_core::{LegResult, OrderExecutor, OrderTicket};

use crate::types::{Check, Opportunity, TradeRecord};
use crate::validator::leg_suspicious;

// =============================================================================
// Selection
// =============================================================================

/// Marks checks whose leg costs sit in the suspicious range near an
/// hour boundary. Suppressed checks stay visible in the response but
/// never become opportunities or auto-trade candidates.
pub fn apply_suppression(checks: &mut [Check], minute: u32) {
    for check in checks.iter_mut() {
        check.suppressed =
            leg_suspicious(check.continuous_cost, minute) || leg_suspicious(check.contract_cost, minute);
    }
}

/// Index of the check with the highest net margin, profitable or not.
/// Purely observational.
#[must_use]
pub fn best_check_index(checks: &[Check]) -> Option<usize> {
    checks
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| a.net_margin.cmp(&b.net_margin))
        .map(|(i, _)| i)
}

/// The auto-trade candidate: highest net margin among checks that are
/// profitable after fees and not suppressed. The caller still gates on
/// the margin threshold and the cycle verdict.
#[must_use]
pub fn auto_trade_candidate(checks: &[Check]) -> Option<&Check> {
    checks
        .iter()
        .filter(|c| c.profitable_after_fees && !c.suppressed)
        .max_by(|a, b| a.net_margin.cmp(&b.net_margin))
}

/// Derives opportunities from a cycle's checks. Blocked cycles yield
/// none regardless of margins.
#[must_use]
pub fn opportunities(checks: &[Check], transition_blocked: bool) -> Vec<Opportunity> {
    if transition_blocked {
        return Vec::new();
    }

    checks
        .iter()
        .filter(|c| c.gross_margin > Decimal::ZERO && !c.suppressed)
        .map(|c| Opportunity { check: c.clone() })
        .collect()
}

// =============================================================================
// Dispatch
// =============================================================================

/// Places both legs of an opportunity through the execution
/// collaborators.
pub struct Dispatcher {
    continuous: Arc<dyn OrderExecutor>,
    discrete: Arc<dyn OrderExecutor>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("continuous_venue", &self.continuous.venue())
            .field("discrete_venue", &self.discrete.venue())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    #[must_use]
    pub fn new(continuous: Arc<dyn OrderExecutor>, discrete: Arc<dyn OrderExecutor>) -> Self {
        Self {
            continuous,
            discrete,
        }
    }

    /// True when both executors report ready.
    pub async fn readiness(&self) -> (bool, bool) {
        tokio::join!(self.continuous.is_ready(), self.discrete.is_ready())
    }

    #[must_use]
    pub fn continuous_is_paper(&self) -> bool {
        self.continuous.is_paper()
    }

    #[must_use]
    pub fn discrete_is_paper(&self) -> bool {
        self.discrete.is_paper()
    }

    /// Attempts both legs concurrently and records the outcome.
    ///
    /// A failed leg never prevents the sibling leg from being
    /// attempted, and there is no rollback; this is best-effort
    /// placement, not a transaction.
    pub async fn dispatch(&self, check: &Check, quantity: u32) -> TradeRecord {
        let continuous_ticket = OrderTicket {
            market_id: check.continuous_token_id.clone(),
            side: check.continuous_leg.into(),
            quantity,
            limit_price: check.continuous_cost,
        };
        let discrete_ticket = OrderTicket {
            market_id: check.ladder_ticker.clone(),
            side: check.contract_leg.into(),
            quantity,
            limit_price: check.contract_cost,
        };

        let (continuous_result, contract_result) = tokio::join!(
            place_leg(self.continuous.as_ref(), &continuous_ticket),
            place_leg(self.discrete.as_ref(), &discrete_ticket),
        );

        let status = TradeRecord::status_from_legs(&continuous_result, &contract_result);
        let record = TradeRecord {
            id: Uuid::new_v4(),
            strike: check.strike,
            continuous_leg: check.continuous_leg,
            continuous_cost: check.continuous_cost,
            contract_leg: check.contract_leg,
            contract_cost: check.contract_cost,
            net_margin: check.net_margin,
            quantity,
            continuous_result,
            contract_result,
            status,
            executed_at: Utc::now(),
        };

        tracing::info!(
            trade_id = %record.id,
            strike = %record.strike,
            status = ?record.status,
            quantity,
            net_margin = %record.net_margin,
            "dispatch complete"
        );

        record
    }
}

async fn place_leg(executor: &dyn OrderExecutor, ticket: &OrderTicket) -> LegResult {
    match executor.place_order(ticket).await {
        Ok(receipt) => {
            tracing::info!(
                venue = %receipt.venue,
                order_id = %receipt.order_id,
                paper = receipt.paper,
                "leg placed"
            );
            LegResult::filled(&receipt)
        }
        Err(e) => {
            tracing::warn!(venue = %executor.venue(), error = %e, "leg failed");
            LegResult::failed(executor.venue(), e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fees::FeeBreakdown;
    use crate::types::{Relation, TradeStatus};
    use async_trait::async_trait;
    use hourly_edge_core::{ContractSide, ExecutionError, OrderReceipt, Outcome, Venue};
    use parking_lot::Mutex;
    use rust_decimal_macros::dec;

    fn check(net_margin: Decimal, profitable: bool) -> Check {
        Check {
            relation: Relation::Equal,
            strike: dec!(93000),
            ladder_ticker: "KXBTCD-25AUG0616-B93000".to_string(),
            continuous_leg: Outcome::Down,
            continuous_cost: dec!(0.53),
            continuous_token_id: "222".to_string(),
            contract_leg: ContractSide::Yes,
            contract_cost: dec!(0.45),
            total_cost: dec!(0.98),
            gross_margin: dec!(0.02),
            fees: FeeBreakdown {
                continuous_trading_fee: dec!(0.0053),
                continuous_fixed_fee: dec!(0.02),
                discrete_fee: dec!(1.74),
                total_fees: dec!(1.7653),
                gross_margin: dec!(0.02),
                net_margin,
                profitable,
            },
            net_margin,
            profitable_after_fees: profitable,
            suppressed: false,
        }
    }

    struct StubExecutor {
        venue: Venue,
        fail: bool,
        tickets: Mutex<Vec<OrderTicket>>,
    }

    impl StubExecutor {
        fn new(venue: Venue, fail: bool) -> Self {
            Self {
                venue,
                fail,
                tickets: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OrderExecutor for StubExecutor {
        fn venue(&self) -> Venue {
            self.venue
        }

        fn is_paper(&self) -> bool {
            true
        }

        async fn is_ready(&self) -> bool {
            !self.fail
        }

        async fn place_order(&self, ticket: &OrderTicket) -> Result<OrderReceipt, ExecutionError> {
            self.tickets.lock().push(ticket.clone());
            if self.fail {
                return Err(ExecutionError::Rejected("stub rejection".to_string()));
            }
            Ok(OrderReceipt {
                order_id: format!("{}-1", self.venue),
                venue: self.venue,
                paper: true,
                placed_at: Utc::now(),
            })
        }
    }

    // ==================== Selection Tests ====================

    #[test]
    fn test_best_check_ignores_profitability() {
        let checks = vec![check(dec!(-0.01), false), check(dec!(-0.005), false)];
        assert_eq!(best_check_index(&checks), Some(1));
    }

    #[test]
    fn test_best_check_empty() {
        assert_eq!(best_check_index(&[]), None);
    }

    #[test]
    fn test_candidate_requires_profitable() {
        let checks = vec![check(dec!(-0.01), false), check(dec!(0.002), true)];
        let candidate = auto_trade_candidate(&checks).unwrap();
        assert_eq!(candidate.net_margin, dec!(0.002));
    }

    #[test]
    fn test_candidate_skips_suppressed() {
        let mut best = check(dec!(0.01), true);
        best.suppressed = true;
        let checks = vec![best, check(dec!(0.002), true)];

        let candidate = auto_trade_candidate(&checks).unwrap();
        assert_eq!(candidate.net_margin, dec!(0.002));
    }

    #[test]
    fn test_no_candidate_when_nothing_profitable() {
        let checks = vec![check(dec!(-0.01), false)];
        assert!(auto_trade_candidate(&checks).is_none());
    }

    #[test]
    fn test_opportunities_empty_when_blocked() {
        let checks = vec![check(dec!(0.002), true)];
        assert!(opportunities(&checks, true).is_empty());
        assert_eq!(opportunities(&checks, false).len(), 1);
    }

    #[test]
    fn test_opportunities_require_positive_gross() {
        let mut losing = check(dec!(-0.05), false);
        losing.gross_margin = dec!(-0.04);
        let checks = vec![losing, check(dec!(0.002), true)];

        let opps = opportunities(&checks, false);
        assert_eq!(opps.len(), 1);
        assert_eq!(opps[0].net_margin(), dec!(0.002));
    }

    #[test]
    fn test_suppression_near_boundary() {
        let mut cheap = check(dec!(0.01), true);
        cheap.continuous_cost = dec!(0.03);
        let mut checks = vec![cheap, check(dec!(0.002), true)];

        apply_suppression(&mut checks, 58);
        assert!(checks[0].suppressed);
        assert!(!checks[1].suppressed);

        apply_suppression(&mut checks, 30);
        assert!(!checks[0].suppressed);
    }

    // ==================== Dispatch Tests ====================

    #[tokio::test]
    async fn test_dispatch_both_legs_succeed() {
        let continuous = Arc::new(StubExecutor::new(Venue::Polymarket, false));
        let discrete = Arc::new(StubExecutor::new(Venue::Kalshi, false));
        let dispatcher = Dispatcher::new(continuous.clone(), discrete.clone());

        let record = dispatcher.dispatch(&check(dec!(0.002), true), 100).await;

        assert_eq!(record.status, TradeStatus::Executed);
        assert!(record.continuous_result.success);
        assert!(record.contract_result.success);
        assert_eq!(record.quantity, 100);

        let continuous_tickets = continuous.tickets.lock();
        assert_eq!(continuous_tickets[0].market_id, "222");
        assert_eq!(continuous_tickets[0].quantity, 100);
        assert_eq!(continuous_tickets[0].limit_price, dec!(0.53));

        let discrete_tickets = discrete.tickets.lock();
        assert_eq!(discrete_tickets[0].market_id, "KXBTCD-25AUG0616-B93000");
        assert_eq!(discrete_tickets[0].limit_price, dec!(0.45));
    }

    #[tokio::test]
    async fn test_dispatch_one_leg_fails_is_partial() {
        let continuous = Arc::new(StubExecutor::new(Venue::Polymarket, true));
        let discrete = Arc::new(StubExecutor::new(Venue::Kalshi, false));
        let dispatcher = Dispatcher::new(continuous, discrete.clone());

        let record = dispatcher.dispatch(&check(dec!(0.002), true), 10).await;

        assert_eq!(record.status, TradeStatus::Partial);
        assert!(!record.continuous_result.success);
        assert!(record.contract_result.success);

        // The discrete leg was still attempted.
        assert_eq!(discrete.tickets.lock().len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_both_legs_fail() {
        let continuous = Arc::new(StubExecutor::new(Venue::Polymarket, true));
        let discrete = Arc::new(StubExecutor::new(Venue::Kalshi, true));
        let dispatcher = Dispatcher::new(continuous, discrete);

        let record = dispatcher.dispatch(&check(dec!(0.002), true), 10).await;

        assert_eq!(record.status, TradeStatus::Failed);
        assert!(record.continuous_result.error.is_some());
        assert!(record.contract_result.error.is_some());
    }
}
