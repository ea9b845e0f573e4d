//! Strike alignment between the continuous reference and the ladder.
//!
//! Selects a bounded window of ladder entries around the strike
//! closest to the reference price, then pairs each entry with the
//! continuous leg that makes the combined position pay exactly $1 when
//! the discrete outcome realizes:
//!
//! - reference above the strike: Down + Yes
//! - reference below the strike: Up + No
//! - exact match: both pairings, independently
//!
//! No other pairing is ever constructed.

use hourly_edge_core::{ContractSide, Outcome};
use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::fees::FeeModel;
use crate::types::{Check, LadderEntry, ReferenceQuote, Relation};

/// Entries taken below the closest-strike index.
const WINDOW_BELOW: usize = 4;

/// Entries taken from the closest-strike index upward, inclusive.
const WINDOW_ABOVE: usize = 5;

/// Finds the index of the entry whose strike is closest to the
/// reference. First-encountered entry wins ties.
#[must_use]
pub fn closest_strike_index(ladder: &[LadderEntry], reference: Decimal) -> Option<usize> {
    let mut best: Option<(usize, Decimal)> = None;

    for (i, entry) in ladder.iter().enumerate() {
        let distance = (entry.strike - reference).abs();
        match best {
            Some((_, d)) if d <= distance => {}
            _ => best = Some((i, distance)),
        }
    }

    best.map(|(i, _)| i)
}

/// Selects the aligner window: at most 9 contiguous entries, 4 below
/// the closest index and 5 from it upward, clipped to ladder bounds.
#[must_use]
pub fn select_window(ladder: &[LadderEntry], reference: Decimal) -> &[LadderEntry] {
    let Some(closest) = closest_strike_index(ladder, reference) else {
        return &[];
    };

    let start = closest.saturating_sub(WINDOW_BELOW);
    let end = (closest + WINDOW_ABOVE).min(ladder.len());
    &ladder[start..end]
}

/// Builds the cycle's checks from the reference quote and the ladder.
///
/// The ladder must be sorted ascending by strike. Entries whose
/// required continuous leg has no fetched cost or token id are skipped;
/// the sync validator separately decides whether the cycle as a whole
/// is usable.
///
/// # Errors
/// Returns [`EngineError::MissingReferenceStrike`] if the hourly
/// candle has not posted, since there is nothing to align against.
pub fn build_checks(
    reference: &ReferenceQuote,
    ladder: &[LadderEntry],
    fees: &FeeModel,
    contracts: u32,
) -> Result<Vec<Check>> {
    let strike = reference.open_reference_price.ok_or_else(|| {
        EngineError::MissingReferenceStrike(format!(
            "hourly open not posted for {}",
            reference.target_time
        ))
    })?;

    let window = select_window(ladder, strike);
    let mut checks = Vec::with_capacity(window.len() + 1);

    for entry in window {
        if strike > entry.strike {
            push_check(
                &mut checks,
                reference,
                entry,
                Relation::Below,
                Outcome::Down,
                ContractSide::Yes,
                fees,
                contracts,
            );
        } else if strike < entry.strike {
            push_check(
                &mut checks,
                reference,
                entry,
                Relation::Above,
                Outcome::Up,
                ContractSide::No,
                fees,
                contracts,
            );
        } else {
            push_check(
                &mut checks,
                reference,
                entry,
                Relation::Equal,
                Outcome::Down,
                ContractSide::Yes,
                fees,
                contracts,
            );
            push_check(
                &mut checks,
                reference,
                entry,
                Relation::Equal,
                Outcome::Up,
                ContractSide::No,
                fees,
                contracts,
            );
        }
    }

    Ok(checks)
}

#[allow(clippy::too_many_arguments)]
fn push_check(
    checks: &mut Vec<Check>,
    reference: &ReferenceQuote,
    entry: &LadderEntry,
    relation: Relation,
    outcome: Outcome,
    side: ContractSide,
    fees: &FeeModel,
    contracts: u32,
) {
    let (Some(continuous_cost), Some(token_id)) =
        (reference.cost(outcome), reference.token_id(outcome))
    else {
        tracing::debug!(
            strike = %entry.strike,
            outcome = %outcome,
            "skipping check, continuous leg not fetched"
        );
        return;
    };

    let contract_cost = match side {
        ContractSide::Yes => entry.yes_ask,
        ContractSide::No => entry.no_ask,
    };

    let breakdown = fees.compute(continuous_cost, contract_cost, contracts);
    let total_cost = continuous_cost + contract_cost;

    checks.push(Check {
        relation,
        strike: entry.strike,
        ladder_ticker: entry.ticker.clone(),
        continuous_leg: outcome,
        continuous_cost,
        continuous_token_id: token_id.to_string(),
        contract_leg: side,
        contract_cost,
        total_cost,
        gross_margin: Decimal::ONE - total_cost,
        net_margin: breakdown.net_margin,
        profitable_after_fees: breakdown.profitable,
        fees: breakdown,
        suppressed: false,
    });
}
