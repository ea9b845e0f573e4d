//! Fee model converting gross margin into net margin.
//!
//! The continuous venue charges a taker fee on notional plus a flat
//! per-transaction settlement fee. The discrete venue charges
//! `ceil_to_cent(multiplier x contracts x price x (1 - price))` capped
//! per contract. The discrete formula is maximized at price 0.5 and
//! approaches zero at the extremes; the round-up-to-cent step is part
//! of the venue's published schedule and determines breakeven
//! thresholds, so it is applied exactly.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// =============================================================================
// Fee Constants
// =============================================================================

/// Default continuous-venue taker fee rate (1 basis point).
pub const DEFAULT_TAKER_FEE_RATE: Decimal = dec!(0.0001);

/// Default continuous-venue fixed fee per transaction.
pub const DEFAULT_FIXED_FEE: Decimal = dec!(0.02);

/// Default discrete-venue fee multiplier.
pub const DEFAULT_FEE_MULTIPLIER: Decimal = dec!(0.07);

/// Default discrete-venue fee cap per contract.
pub const DEFAULT_MAX_FEE_PER_CONTRACT: Decimal = dec!(0.0175);

/// Largest quantity `min_contracts_for_profit` will consider.
pub const MAX_CONTRACTS: u32 = 10_000;

// =============================================================================
// Configuration
// =============================================================================

/// Configurable fee parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeConfig {
    /// Continuous-venue taker fee rate on notional. Zero for the
    /// no-fee venue variant.
    pub taker_fee_rate: Decimal,

    /// Continuous-venue flat fee per transaction, in dollars.
    pub fixed_fee: Decimal,

    /// Discrete-venue fee multiplier.
    pub fee_multiplier: Decimal,

    /// Discrete-venue fee cap per contract, in dollars.
    pub max_fee_per_contract: Decimal,
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            taker_fee_rate: DEFAULT_TAKER_FEE_RATE,
            fixed_fee: DEFAULT_FIXED_FEE,
            fee_multiplier: DEFAULT_FEE_MULTIPLIER,
            max_fee_per_contract: DEFAULT_MAX_FEE_PER_CONTRACT,
        }
    }
}

impl FeeConfig {
    /// Disables the continuous-venue taker fee.
    #[must_use]
    pub fn without_taker_fee(mut self) -> Self {
        self.taker_fee_rate = Decimal::ZERO;
        self
    }
}

// =============================================================================
// Fee Breakdown
// =============================================================================

/// Per-component fee totals and the resulting margins.
///
/// Values are unrounded; call [`FeeBreakdown::rounded`] for the 4dp
/// presentation form. Comparisons always use the unrounded values so
/// results do not flap at rounding boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    /// Continuous-venue taker fee on notional, in dollars.
    pub continuous_trading_fee: Decimal,

    /// Continuous-venue fixed fee, in dollars.
    pub continuous_fixed_fee: Decimal,

    /// Discrete-venue fee, in dollars.
    pub discrete_fee: Decimal,

    /// Sum of all fees, in dollars.
    pub total_fees: Decimal,

    /// Margin per contract before fees.
    pub gross_margin: Decimal,

    /// Margin per contract after fees.
    pub net_margin: Decimal,

    /// True when the net margin is positive.
    pub profitable: bool,
}

impl FeeBreakdown {
    /// Returns a copy with every monetary field rounded to 4 decimal
    /// places for presentation.
    #[must_use]
    pub fn rounded(&self) -> Self {
        Self {
            continuous_trading_fee: self.continuous_trading_fee.round_dp(4),
            continuous_fixed_fee: self.continuous_fixed_fee.round_dp(4),
            discrete_fee: self.discrete_fee.round_dp(4),
            total_fees: self.total_fees.round_dp(4),
            gross_margin: self.gross_margin.round_dp(4),
            net_margin: self.net_margin.round_dp(4),
            profitable: self.profitable,
        }
    }
}

// =============================================================================
// Fee Model
// =============================================================================

/// Computes the full fee breakdown for a two-leg position.
#[derive(Debug, Clone, Default)]
pub struct FeeModel {
    config: FeeConfig,
}

impl FeeModel {
    /// Creates a model with default parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a model with custom parameters.
    #[must_use]
    pub fn with_config(config: FeeConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &FeeConfig {
        &self.config
    }

    /// Computes all fees and margins for one paired position.
    ///
    /// # Arguments
    /// * `continuous_cost` - continuous-leg cost in dollars [0, 1]
    /// * `discrete_cost` - discrete-leg cost in dollars [0, 1]
    /// * `contracts` - contracts per leg
    #[must_use]
    pub fn compute(
        &self,
        continuous_cost: Decimal,
        discrete_cost: Decimal,
        contracts: u32,
    ) -> FeeBreakdown {
        let n = Decimal::from(contracts.max(1));

        let continuous_trading_fee = n * continuous_cost * self.config.taker_fee_rate;
        let continuous_fixed_fee = self.config.fixed_fee;
        let discrete_fee = self.discrete_fee(discrete_cost, contracts);

        let total_fees = continuous_trading_fee + continuous_fixed_fee + discrete_fee;

        let gross_margin = Decimal::ONE - (continuous_cost + discrete_cost);
        let net_margin = (gross_margin * n - total_fees) / n;

        FeeBreakdown {
            continuous_trading_fee,
            continuous_fixed_fee,
            discrete_fee,
            total_fees,
            gross_margin,
            net_margin,
            profitable: net_margin > Decimal::ZERO,
        }
    }

    /// Computes the discrete-venue fee for one leg.
    ///
    /// `ceil_to_cent(multiplier x contracts x price x (1 - price))`,
    /// capped at `contracts x max_fee_per_contract`.
    #[must_use]
    pub fn discrete_fee(&self, price: Decimal, contracts: u32) -> Decimal {
        let n = Decimal::from(contracts.max(1));
        let raw = self.config.fee_multiplier * n * price * (Decimal::ONE - price);
        let fee = ceil_to_cent(raw);
        let cap = n * self.config.max_fee_per_contract;
        fee.min(cap)
    }

    /// Returns the gross margin at which the position breaks even,
    /// i.e. `total_fees / contracts`.
    #[must_use]
    pub fn breakeven_margin(
        &self,
        contracts: u32,
        continuous_cost: Decimal,
        discrete_cost: Decimal,
    ) -> Decimal {
        let breakdown = self.compute(continuous_cost, discrete_cost, contracts);
        breakdown.total_fees / Decimal::from(contracts.max(1))
    }

    /// Returns the smallest quantity in [1, 10000] with positive net
    /// margin at the given gross margin, or `None` if even the cap is
    /// unprofitable.
    ///
    /// Per-contract fees fall as the fixed fee amortizes, so net
    /// margin is monotone in quantity up to cent rounding.
    #[must_use]
    pub fn min_contracts_for_profit(
        &self,
        gross_margin: Decimal,
        continuous_cost: Decimal,
        discrete_cost: Decimal,
    ) -> Option<u32> {
        let net = |n: u32| -> Decimal {
            let breakdown = self.compute(continuous_cost, discrete_cost, n);
            gross_margin - breakdown.total_fees / Decimal::from(n)
        };

        if net(MAX_CONTRACTS) <= Decimal::ZERO {
            return None;
        }

        let mut lo = 1u32;
        let mut hi = MAX_CONTRACTS;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if net(mid) > Decimal::ZERO {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }

        Some(lo)
    }
}

/// Rounds up to the next whole cent.
fn ceil_to_cent(amount: Decimal) -> Decimal {
    (amount * dec!(100)).ceil() / dec!(100)
}
