use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub binance: BinanceConfig,
    pub polymarket: PolymarketConfig,
    pub kalshi: KalshiConfig,
    pub trading: TradingConfig,
    pub proxy: ProxyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BinanceConfig {
    pub api_url: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolymarketConfig {
    pub gamma_url: String,
    pub clob_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub api_passphrase: String,
    pub funder_address: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KalshiConfig {
    pub use_demo: bool,
    pub api_key_id: String,
    pub private_key_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingConfig {
    /// Hard cap on contracts per leg.
    pub max_position_size: u32,
    /// Net margin floor for automatic dispatch, in dollars per contract.
    pub min_profit_margin: f64,
    pub paper_trading: bool,
    pub auto_trade_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub enabled: bool,
    pub socks5_url: Option<String>,
    pub http_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            binance: BinanceConfig {
                api_url: "https://api.binance.us/api/v3".to_string(),
                symbol: "BTCUSDT".to_string(),
            },
            polymarket: PolymarketConfig {
                gamma_url: "https://gamma-api.polymarket.com".to_string(),
                clob_url: "https://clob.polymarket.com".to_string(),
                api_key: String::new(),
                api_secret: String::new(),
                api_passphrase: String::new(),
                funder_address: String::new(),
            },
            kalshi: KalshiConfig {
                use_demo: true,
                api_key_id: String::new(),
                private_key_path: String::new(),
            },
            trading: TradingConfig {
                max_position_size: 100,
                min_profit_margin: 0.02,
                paper_trading: true,
                auto_trade_enabled: false,
            },
            proxy: ProxyConfig {
                enabled: false,
                socks5_url: None,
                http_url: None,
            },
        }
    }
}

impl KalshiConfig {
    /// Returns true when both the key id and the private key path are set.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key_id.is_empty() && !self.private_key_path.is_empty()
    }
}

impl PolymarketConfig {
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty() && !self.api_passphrase.is_empty()
    }
}
