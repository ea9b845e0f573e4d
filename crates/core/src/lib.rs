pub mod config;
pub mod config_loader;
pub mod traits;
pub mod types;

pub use config::{
    AppConfig, BinanceConfig, KalshiConfig, PolymarketConfig, ProxyConfig, ServerConfig,
    TradingConfig,
};
pub use config_loader::ConfigLoader;
pub use traits::{ExecutionError, OrderExecutor};
pub use types::{ContractSide, LegResult, OrderReceipt, OrderSide, OrderTicket, Outcome, Venue};
