//! Market synchronization and arbitrage decision engine.
//!
//! Pairs the continuous hourly up/down market against the discrete
//! strike ladder and hunts for pairings whose combined cost is under
//! the $1.00 settlement payout. One request cycle flows one way:
//!
//! ```text
//! acquisition ──> aligner ──> fees ──┐
//!      │                            ├──> selector ──> dispatcher
//!      └────────> validator ────────┘
//! ```
//!
//! Acquisition fetches the reference quote, hourly open, and ladder in
//! two concurrent phases. The aligner windows the ladder around the
//! reference strike and builds risk-neutral pairings; the fee model
//! prices them. The validator judges the snapshot against the
//! settlement-hour boundary and its verdict gates everything
//! downstream: a blocked cycle yields zero opportunities and never
//! dispatches.
//!
//! [`ArbitrageEngine`] ties the pipeline together and owns the shared
//! [`TradingState`]; the HTTP layer calls [`ArbitrageEngine::run_cycle`]
//! per request.

pub mod acquisition;
pub mod aligner;
pub mod engine;
pub mod error;
pub mod fees;
pub mod selector;
pub mod state;
pub mod types;
pub mod validator;

pub use acquisition::{QuoteAcquirer, DEFAULT_FETCH_TIMEOUT_SECS};
pub use engine::{
    ArbitrageEngine, AutoTradeToggle, CycleReport, EngineConfig, ExecuteRequest, TradingStatus,
    DEFAULT_CONTRACTS, DEFAULT_MIN_NET_MARGIN,
};
pub use error::{EngineError, Result};
pub use fees::{FeeBreakdown, FeeConfig, FeeModel, MAX_CONTRACTS};
pub use selector::Dispatcher;
pub use state::{SharedTradingState, TradingState, TradingStateView, TRADE_HISTORY_CAPACITY};
pub use types::{
    BoundaryStatus, Check, FetchFailure, LadderEntry, MarketSnapshot, Opportunity, PhaseTiming,
    ReferenceQuote, Relation, SyncVerdict, TradeRecord, TradeStatus,
};
pub use validator::{boundary_status, validate, ValidatorConfig};
