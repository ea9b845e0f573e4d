//! Cycle orchestration.
//!
//! One request cycle: fetch a snapshot, align and price checks,
//! validate the transition window, derive opportunities, and possibly
//! dispatch the auto-trade candidate. Manual executes re-run the fetch
//! and validation so a stale browser tab cannot trade on old data.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use hourly_edge_core::{ContractSide, Outcome};

use crate::acquisition::QuoteAcquirer;
use crate::aligner;
use crate::error::{EngineError, Result};
use crate::fees::{FeeConfig, FeeModel, MAX_CONTRACTS};
use crate::selector::{self, Dispatcher};
use crate::state::{SharedTradingState, TradingState, TradingStateView};
use crate::types::{
    BoundaryStatus, Check, FetchFailure, LadderEntry, Opportunity, PhaseTiming, ReferenceQuote,
    Relation, SyncVerdict, TradeRecord, TradeStatus,
};
use crate::validator::{self, ValidatorConfig};

/// Contracts evaluated when a request does not specify a count.
pub const DEFAULT_CONTRACTS: u32 = 100;

/// Net margin per contract an auto-trade candidate must clear.
pub const DEFAULT_MIN_NET_MARGIN: Decimal = dec!(0.005);

// =============================================================================
// Config
// =============================================================================

/// Engine-level tunables.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Auto-trade margin threshold, per contract.
    pub min_net_margin: Decimal,

    pub validator: ValidatorConfig,

    pub fees: FeeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_net_margin: DEFAULT_MIN_NET_MARGIN,
            validator: ValidatorConfig::default(),
            fees: FeeConfig::default(),
        }
    }
}

impl EngineConfig {
    #[must_use]
    pub fn with_min_net_margin(mut self, margin: Decimal) -> Self {
        self.min_net_margin = margin;
        self
    }
}

// =============================================================================
// Reports
// =============================================================================

/// Full output of one request cycle. Monetary fields on checks and
/// opportunities are rounded for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct CycleReport {
    pub reference: ReferenceQuote,
    pub ladder: Vec<LadderEntry>,
    pub checks: Vec<Check>,
    /// Highest net margin check, profitable or not.
    pub best_check: Option<Check>,
    pub opportunities: Vec<Opportunity>,
    pub errors: Vec<FetchFailure>,
    pub verdict: SyncVerdict,
    pub boundary: BoundaryStatus,
    pub routes: BTreeMap<String, String>,
    pub timing: PhaseTiming,
    pub trading: TradingStateView,
    /// Present when auto-trade dispatched this cycle.
    pub auto_trade: Option<TradeRecord>,
    pub generated_at: DateTime<Utc>,
}

/// Trading surface status for the HTTP layer.
#[derive(Debug, Clone, Serialize)]
pub struct TradingStatus {
    pub auto_trade_enabled: bool,
    pub continuous_ready: bool,
    pub discrete_ready: bool,
    pub continuous_paper: bool,
    pub discrete_paper: bool,
    pub min_net_margin: Decimal,
    pub max_contracts: u32,
    pub last_trade_at: Option<DateTime<Utc>>,
    /// Last 10 dispatch attempts, newest first.
    pub recent_trades: Vec<TradeRecord>,
}

/// Result of toggling auto-trade.
#[derive(Debug, Clone, Serialize)]
pub struct AutoTradeToggle {
    pub enabled: bool,
    /// Readiness concerns surfaced on enable. Never blocks the toggle.
    pub warnings: Vec<String>,
}

/// Manual execute request, as posted by the HTTP layer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    /// Ladder strike to trade against.
    pub strike: Decimal,

    /// Discrete-venue leg.
    pub venue_leg: ContractSide,

    /// Limit price for the discrete leg.
    pub venue_cost: Decimal,

    /// Continuous-venue leg.
    pub continuous_leg: Outcome,

    /// Limit price for the continuous leg.
    pub continuous_cost: Decimal,

    /// Contracts per leg.
    pub quantity: u32,
}

// =============================================================================
// Engine
// =============================================================================

/// Owns the acquisition, decision, and dispatch pipeline plus the
/// shared trading state.
#[derive(Debug)]
pub struct ArbitrageEngine {
    acquirer: Arc<QuoteAcquirer>,
    fees: FeeModel,
    dispatcher: Dispatcher,
    state: SharedTradingState,
    config: EngineConfig,
}

impl ArbitrageEngine {
    #[must_use]
    pub fn new(acquirer: Arc<QuoteAcquirer>, dispatcher: Dispatcher, config: EngineConfig) -> Self {
        Self {
            acquirer,
            fees: FeeModel::with_config(config.fees.clone()),
            dispatcher,
            state: TradingState::shared(),
            config,
        }
    }

    /// Shared handle to the trading state.
    #[must_use]
    pub fn state(&self) -> SharedTradingState {
        Arc::clone(&self.state)
    }

    /// Runs one full cycle at the current wall-clock time.
    pub async fn run_cycle(&self, contracts: u32) -> CycleReport {
        self.run_cycle_at(contracts, Utc::now()).await
    }

    async fn run_cycle_at(&self, contracts: u32, now: DateTime<Utc>) -> CycleReport {
        let contracts = contracts.clamp(1, MAX_CONTRACTS);
        let snapshot = self.acquirer.fetch_snapshot(now).await;
        let boundary = validator::boundary_status(now);
        let verdict = validator::validate(&snapshot, now, &self.config.validator);

        let mut errors = snapshot.errors.clone();
        let mut checks = match aligner::build_checks(
            &snapshot.reference,
            &snapshot.ladder,
            &self.fees,
            contracts,
        ) {
            Ok(checks) => checks,
            Err(e) => {
                tracing::warn!(error = %e, "aligner did not run");
                errors.push(FetchFailure::new("aligner", e.to_string()));
                Vec::new()
            }
        };
        selector::apply_suppression(&mut checks, boundary.minute);

        let best_check = selector::best_check_index(&checks).map(|i| checks[i].rounded());
        let opportunities: Vec<Opportunity> =
            selector::opportunities(&checks, verdict.transition_blocked)
                .into_iter()
                .map(|o| Opportunity {
                    check: o.check.rounded(),
                })
                .collect();

        let auto_trade = self.maybe_auto_trade(&checks, &verdict, contracts).await;

        tracing::info!(
            checks = checks.len(),
            opportunities = opportunities.len(),
            blocked = verdict.transition_blocked,
            auto_traded = auto_trade.is_some(),
            "cycle complete"
        );

        CycleReport {
            reference: snapshot.reference,
            ladder: snapshot.ladder,
            checks: checks.iter().map(Check::rounded).collect(),
            best_check,
            opportunities,
            errors,
            verdict,
            boundary,
            routes: snapshot.routes,
            timing: snapshot.timing,
            trading: self.state.read().view(),
            auto_trade,
            generated_at: Utc::now(),
        }
    }

    /// Dispatches the auto-trade candidate when every gate passes:
    /// auto-trade on, cycle not blocked, candidate profitable and over
    /// the margin threshold. A not-ready executor is not a gate; its
    /// leg fails and is recorded like any other dispatch error.
    async fn maybe_auto_trade(
        &self,
        checks: &[Check],
        verdict: &SyncVerdict,
        contracts: u32,
    ) -> Option<TradeRecord> {
        if verdict.transition_blocked || !self.state.read().auto_trade_enabled() {
            return None;
        }

        let candidate = selector::auto_trade_candidate(checks)?;
        if candidate.net_margin < self.config.min_net_margin {
            tracing::debug!(
                net_margin = %candidate.net_margin,
                threshold = %self.config.min_net_margin,
                "candidate below auto-trade threshold"
            );
            return None;
        }

        let (continuous_ready, discrete_ready) = self.dispatcher.readiness().await;
        self.state
            .write()
            .set_readiness(continuous_ready, discrete_ready);

        tracing::info!(
            strike = %candidate.strike,
            net_margin = %candidate.net_margin,
            contracts,
            "auto-trade dispatching"
        );
        let record = self.dispatcher.dispatch(candidate, contracts).await;
        self.state.write().record_trade(record.clone());
        Some(record)
    }

    /// Executes a manually specified pairing.
    ///
    /// Re-fetches and re-validates before dispatch unless `force` is
    /// set; a forced override of a blocked cycle is logged as its own
    /// event. The pairing must be one of the two valid combinations.
    ///
    /// # Errors
    /// [`EngineError::TransitionBlocked`] when validation blocks and
    /// `force` is not set, [`EngineError::UnknownStrike`] when the
    /// strike is absent from the ladder, [`EngineError::InvalidRequest`]
    /// for bad quantities or pairings, and [`EngineError::Dispatch`]
    /// when both legs fail.
    pub async fn execute_manual(&self, request: ExecuteRequest, force: bool) -> Result<TradeRecord> {
        self.execute_manual_at(request, force, Utc::now()).await
    }

    async fn execute_manual_at(
        &self,
        request: ExecuteRequest,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<TradeRecord> {
        if request.quantity == 0 || request.quantity > MAX_CONTRACTS {
            return Err(EngineError::InvalidRequest(format!(
                "quantity must be between 1 and {MAX_CONTRACTS}"
            )));
        }

        let relation = match (request.continuous_leg, request.venue_leg) {
            (Outcome::Down, ContractSide::Yes) => Relation::Below,
            (Outcome::Up, ContractSide::No) => Relation::Above,
            (continuous, venue) => {
                return Err(EngineError::InvalidRequest(format!(
                    "{continuous} cannot pair with {venue}; valid pairings are Down/yes and Up/no"
                )))
            }
        };

        let snapshot = self.acquirer.fetch_snapshot(now).await;
        let verdict = validator::validate(&snapshot, now, &self.config.validator);
        if verdict.transition_blocked {
            let reason = verdict
                .anomaly_reason
                .clone()
                .unwrap_or_else(|| verdict.issues.join("; "));
            if force {
                tracing::warn!(
                    event = "forced_override",
                    strike = %request.strike,
                    reason = %reason,
                    "manual execute overriding transition block"
                );
            } else {
                return Err(EngineError::TransitionBlocked { reason });
            }
        }

        let entry = snapshot
            .ladder
            .iter()
            .find(|e| e.strike == request.strike)
            .ok_or(EngineError::UnknownStrike(request.strike))?;
        let token_id = snapshot
            .reference
            .token_id(request.continuous_leg)
            .ok_or_else(|| {
                EngineError::InvalidRequest(format!(
                    "no settlement token known for the {} leg",
                    request.continuous_leg
                ))
            })?;

        let breakdown = self
            .fees
            .compute(request.continuous_cost, request.venue_cost, request.quantity);
        let check = Check {
            relation,
            strike: entry.strike,
            ladder_ticker: entry.ticker.clone(),
            continuous_leg: request.continuous_leg,
            continuous_cost: request.continuous_cost,
            continuous_token_id: token_id.to_string(),
            contract_leg: request.venue_leg,
            contract_cost: request.venue_cost,
            total_cost: request.continuous_cost + request.venue_cost,
            gross_margin: breakdown.gross_margin,
            net_margin: breakdown.net_margin,
            profitable_after_fees: breakdown.profitable,
            fees: breakdown,
            suppressed: false,
        };

        let record = self.dispatcher.dispatch(&check, request.quantity).await;
        self.state.write().record_trade(record.clone());

        if record.status == TradeStatus::Failed {
            let detail = [
                record.continuous_result.error.clone(),
                record.contract_result.error.clone(),
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join("; ");
            return Err(EngineError::Dispatch(detail));
        }

        Ok(record)
    }

    /// Probes executor readiness and returns the trading surface view.
    pub async fn trading_status(&self) -> TradingStatus {
        let (continuous_ready, discrete_ready) = self.dispatcher.readiness().await;

        let mut state = self.state.write();
        state.set_readiness(continuous_ready, discrete_ready);

        TradingStatus {
            auto_trade_enabled: state.auto_trade_enabled(),
            continuous_ready,
            discrete_ready,
            continuous_paper: self.dispatcher.continuous_is_paper(),
            discrete_paper: self.dispatcher.discrete_is_paper(),
            min_net_margin: self.config.min_net_margin,
            max_contracts: MAX_CONTRACTS,
            last_trade_at: state.last_trade_at(),
            recent_trades: state.recent_trades(10),
        }
    }

    /// Toggles auto-trade. Enabling with a not-ready executor warns
    /// but never blocks the toggle.
    pub async fn set_auto_trade(&self, enabled: bool) -> AutoTradeToggle {
        let mut warnings = Vec::new();

        if enabled {
            let (continuous_ready, discrete_ready) = self.dispatcher.readiness().await;
            if !continuous_ready {
                warnings.push("continuous-venue executor is not ready".to_string());
            }
            if !discrete_ready {
                warnings.push("discrete-venue executor is not ready".to_string());
            }
            self.state
                .write()
                .set_readiness(continuous_ready, discrete_ready);
        }

        self.state.write().set_auto_trade(enabled);
        tracing::info!(enabled, warnings = warnings.len(), "auto-trade toggled");

        AutoTradeToggle { enabled, warnings }
    }
}
