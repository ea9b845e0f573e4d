//! Error types for the arbitrage engine.
//!
//! Fetch and dispatch failures are captured as data inside the cycle
//! (see `FetchFailure` and `LegResult`); only conditions that stop a
//! cycle or a manual execute from proceeding surface here.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors that can stop an engine operation.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The hourly candle has not posted, so there is no reference
    /// strike to align against.
    #[error("reference strike unavailable: {0}")]
    MissingReferenceStrike(String),

    /// The validator blocked trading for this cycle.
    #[error("trading blocked: {reason}")]
    TransitionBlocked {
        /// Joined issue list or anomaly reason.
        reason: String,
    },

    /// A manual execute named a strike absent from the current ladder.
    #[error("strike {0} not found in current ladder")]
    UnknownStrike(Decimal),

    /// A manual execute carried parameters the engine cannot dispatch.
    #[error("invalid execute request: {0}")]
    InvalidRequest(String),

    /// Both legs of a dispatch failed outright.
    #[error("dispatch failed: {0}")]
    Dispatch(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_missing_strike_display() {
        let err = EngineError::MissingReferenceStrike("candle not posted".to_string());
        assert_eq!(
            err.to_string(),
            "reference strike unavailable: candle not posted"
        );
    }

    #[test]
    fn test_blocked_display() {
        let err = EngineError::TransitionBlocked {
            reason: "ladder is empty".to_string(),
        };
        assert_eq!(err.to_string(), "trading blocked: ladder is empty");
    }

    #[test]
    fn test_unknown_strike_display() {
        let err = EngineError::UnknownStrike(dec!(93250));
        assert_eq!(err.to_string(), "strike 93250 not found in current ladder");
    }
}
