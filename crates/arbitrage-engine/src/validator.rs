//! Transition-safety validation around settlement-hour boundaries.
//!
//! When the hour rolls over, one venue settles to extreme prices while
//! the other has not caught up yet, which manufactures margins that are
//! stale data rather than edge. The validator runs two independent
//! passes per cycle, sync validation and anomaly detection, and ORs
//! their verdicts into `transition_blocked`.
//!
//! Validation is a pure function of the snapshot and wall-clock time.
//! It never mutates state and never suspends, so it can run alongside
//! the aligner and fee pipeline.

use chrono::{DateTime, Timelike, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::types::{BoundaryStatus, MarketSnapshot, SyncVerdict};

// =============================================================================
// Bounds
// =============================================================================

/// Costs at or below this (or at or above [`EXTREME_HIGH`]) count as
/// settlement-extreme during the hard-block window.
pub const EXTREME_LOW: Decimal = dec!(0.02);
pub const EXTREME_HIGH: Decimal = dec!(0.98);

/// Tighter bounds used by anomaly detection for the continuous market.
pub const ANOMALY_LOW: Decimal = dec!(0.01);
pub const ANOMALY_HIGH: Decimal = dec!(0.99);

/// Outcome costs should roughly sum to $1. Outside these bounds a
/// non-blocking warning is recorded.
pub const SUM_WARN_LOW: Decimal = dec!(0.85);
pub const SUM_WARN_HIGH: Decimal = dec!(1.15);

/// Minutes at the start and end of the hour where extreme prices hard
/// block the cycle (minute <= 2 or >= 58).
const HARD_BLOCK_MINUTES: u32 = 2;

/// Minutes at either hour edge where anomaly detection runs at all.
const ANOMALY_WINDOW_MINUTES: u32 = 5;

// =============================================================================
// Config
// =============================================================================

/// Tunable thresholds for sync validation.
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    /// Maximum drift allowed between the quote's target hour and the
    /// current wall clock before the fetch is considered stale.
    pub target_tolerance_minutes: i64,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            target_tolerance_minutes: 5,
        }
    }
}

// =============================================================================
// Boundary helpers
// =============================================================================

/// Returns true when the minute falls in the hard-block window.
#[must_use]
pub fn near_boundary(minute: u32) -> bool {
    minute <= HARD_BLOCK_MINUTES || minute >= 60 - HARD_BLOCK_MINUTES
}

/// Returns true when the minute falls in the anomaly-detection window.
#[must_use]
pub fn in_anomaly_window(minute: u32) -> bool {
    minute <= ANOMALY_WINDOW_MINUTES || minute >= 60 - ANOMALY_WINDOW_MINUTES
}

/// Describes where the cycle sits relative to the hour boundary.
#[must_use]
pub fn boundary_status(now: DateTime<Utc>) -> BoundaryStatus {
    let minute = now.minute();
    BoundaryStatus {
        minute,
        near_boundary: near_boundary(minute),
    }
}

fn is_extreme(cost: Decimal) -> bool {
    cost <= EXTREME_LOW || cost >= EXTREME_HIGH
}

/// Per-leg suppression range. Wider than the hard-block bounds so that
/// individually suspicious checks sit out auto-trading near a boundary
/// even when the cycle as a whole is allowed through.
pub const SUPPRESS_LOW: Decimal = dec!(0.05);
pub const SUPPRESS_HIGH: Decimal = dec!(0.95);

/// Returns true when a single leg cost looks like settlement residue
/// near the boundary. Used by the selector for per-check suppression.
#[must_use]
pub fn leg_suspicious(cost: Decimal, minute: u32) -> bool {
    in_anomaly_window(minute) && (cost <= SUPPRESS_LOW || cost >= SUPPRESS_HIGH)
}

// =============================================================================
// Validation
// =============================================================================

/// Runs sync validation and anomaly detection over one snapshot.
///
/// Sync validation fails closed: any failing check marks the cycle
/// unsynced. Anomaly detection only runs within five minutes of an
/// hour edge. `transition_blocked` is the OR of both verdicts.
#[must_use]
pub fn validate(
    snapshot: &MarketSnapshot,
    now: DateTime<Utc>,
    config: &ValidatorConfig,
) -> SyncVerdict {
    let minute = now.minute();
    let mut issues = Vec::new();
    let mut warnings = Vec::new();

    let reference = &snapshot.reference;

    // 1. The hourly candle must have posted.
    if reference.open_reference_price.is_none() {
        issues.push("hourly open price has not posted yet".to_string());
    }

    // 2. The quote must target the current settlement hour.
    let drift = (now - reference.target_time).num_minutes().abs();
    if drift > config.target_tolerance_minutes {
        issues.push(format!(
            "quote targets {} which is {drift}m from the current hour",
            reference.target_time.format("%H:%M")
        ));
    }

    // 3. Both outcome costs zero means the market has not opened.
    let up = reference.up_cost.unwrap_or(Decimal::ZERO);
    let down = reference.down_cost.unwrap_or(Decimal::ZERO);
    if up.is_zero() && down.is_zero() {
        issues.push("both outcome costs are zero, market looks unopened".to_string());
    }

    // 4. An empty ladder leaves nothing to align against.
    if snapshot.ladder.is_empty() {
        issues.push("discrete ladder is empty".to_string());
    }

    // 5. Hard block on settlement-extreme prices near the boundary.
    if near_boundary(minute) {
        for (label, cost) in [("Up", reference.up_cost), ("Down", reference.down_cost)] {
            if let Some(cost) = cost {
                if is_extreme(cost) {
                    issues.push(format!(
                        "transition-extreme {label} cost {cost} at minute {minute}"
                    ));
                }
            }
        }

        // First extreme entry is enough to block the cycle.
        if let Some(entry) = snapshot
            .ladder
            .iter()
            .find(|e| is_extreme(e.yes_ask) || is_extreme(e.no_ask))
        {
            issues.push(format!(
                "transition-extreme ladder pricing at strike {} (yes {}, no {}) at minute {minute}",
                entry.strike, entry.yes_ask, entry.no_ask
            ));
        }
    }

    // Outcome costs drifting far from $1 is worth noting but does not
    // invalidate the cycle on its own.
    if let (Some(up), Some(down)) = (reference.up_cost, reference.down_cost) {
        let sum = up + down;
        if !(SUM_WARN_LOW..=SUM_WARN_HIGH).contains(&sum) {
            warnings.push(format!("outcome costs sum to {sum}, expected near 1.00"));
        }
    }

    let (anomaly_detected, anomaly_reason) = detect_anomaly(snapshot, minute);

    let synced = issues.is_empty();
    let transition_blocked = !synced || anomaly_detected;

    if transition_blocked {
        tracing::warn!(
            minute,
            synced,
            anomaly = anomaly_detected,
            issues = ?issues,
            reason = ?anomaly_reason,
            "cycle transition-blocked"
        );
    }

    SyncVerdict {
        synced,
        issues,
        warnings,
        anomaly_detected,
        anomaly_reason,
        transition_blocked,
    }
}

/// Anomaly checks that only make sense near an hour edge. Returns the
/// first anomaly found, in check order.
fn detect_anomaly(snapshot: &MarketSnapshot, minute: u32) -> (bool, Option<String>) {
    if !in_anomaly_window(minute) {
        return (false, None);
    }

    let reference = &snapshot.reference;

    for (label, cost) in [("Up", reference.up_cost), ("Down", reference.down_cost)] {
        if let Some(cost) = cost {
            if cost <= ANOMALY_LOW || cost >= ANOMALY_HIGH {
                return (
                    true,
                    Some(format!(
                        "{label} cost {cost} looks like post-settlement residue"
                    )),
                );
            }
        }
    }

    if !snapshot.ladder.is_empty() {
        let extreme = snapshot
            .ladder
            .iter()
            .filter(|e| is_extreme(e.yes_ask) || is_extreme(e.no_ask))
            .count();
        if extreme * 2 > snapshot.ladder.len() {
            return (
                true,
                Some(format!(
                    "{extreme} of {} ladder entries at settlement-extreme prices",
                    snapshot.ladder.len()
                )),
            );
        }
    }

    if minute <= HARD_BLOCK_MINUTES && reference.open_reference_price.is_none() {
        return (
            true,
            Some(format!(
                "hourly open still absent at minute {minute} of the new hour"
            )),
        );
    }

    (false, None)
}
