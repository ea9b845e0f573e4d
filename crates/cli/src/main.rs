use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use secrecy::SecretString;

use hourly_edge_binance::{BinanceClient, BinanceClientConfig};
use hourly_edge_core::{AppConfig, ConfigLoader};
use hourly_edge_engine::{
    ArbitrageEngine, Dispatcher, EngineConfig, QuoteAcquirer, DEFAULT_CONTRACTS,
    DEFAULT_FETCH_TIMEOUT_SECS,
};
use hourly_edge_kalshi::{KalshiAuth, KalshiClient, KalshiClientConfig, KalshiExecutor};
use hourly_edge_polymarket::{
    ApiCredentials, ClobClient, GammaClient, PolymarketExecutor, ProxiedHttp,
};
use hourly_edge_web_api::ApiServer;

#[derive(Parser)]
#[command(name = "hourly-edge")]
#[command(about = "Cross-venue arbitrage engine for hourly prediction markets", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the arbitrage engine with the web API
    Run {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
    },
    /// Start the web API server on an explicit address
    Server {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Server address
        #[arg(short, long, default_value = "0.0.0.0:8000")]
        addr: String,
    },
    /// Run a single arbitrage cycle and print the report as JSON
    Scan {
        /// Config file path
        #[arg(short, long, default_value = "config/Config.toml")]
        config: String,
        /// Number of contracts to price
        #[arg(long, default_value_t = DEFAULT_CONTRACTS)]
        contracts: u32,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match cli.command {
        Commands::Run { config } => {
            let config = ConfigLoader::load_from(&config)?;
            let addr = format!("{}:{}", config.server.host, config.server.port);
            run_server(config, &addr).await?;
        }
        Commands::Server { config, addr } => {
            let config = ConfigLoader::load_from(&config)?;
            run_server(config, &addr).await?;
        }
        Commands::Scan { config, contracts } => {
            let config = ConfigLoader::load_from(&config)?;
            run_scan(config, contracts).await?;
        }
    }

    Ok(())
}

async fn run_server(config: AppConfig, addr: &str) -> anyhow::Result<()> {
    let engine = build_engine(&config).await?;
    let server = ApiServer::new(engine);
    let addr = addr.to_string();

    let server_handle = tokio::spawn(async move {
        if let Err(e) = server.serve(&addr).await {
            tracing::error!("Server error: {}", e);
        }
    });

    shutdown_signal().await?;

    server_handle.abort();
    tracing::info!("Arbitrage engine stopped");
    Ok(())
}

async fn run_scan(config: AppConfig, contracts: u32) -> anyhow::Result<()> {
    let engine = build_engine(&config).await?;
    let report = engine.run_cycle(contracts).await;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

/// Wires the quote sources, executors, and engine from config.
async fn build_engine(config: &AppConfig) -> anyhow::Result<Arc<ArbitrageEngine>> {
    let binance = Arc::new(
        BinanceClient::new(
            BinanceClientConfig::default()
                .with_base_url(config.binance.api_url.clone())
                .with_symbol(config.binance.symbol.clone()),
        )
        .context("failed to build Binance client")?,
    );

    let http = Arc::new(
        ProxiedHttp::new(&config.proxy, DEFAULT_FETCH_TIMEOUT_SECS)
            .context("failed to build egress HTTP client")?,
    );
    let gamma = Arc::new(
        GammaClient::new(http.clone()).with_base_url(config.polymarket.gamma_url.clone()),
    );
    let clob = Arc::new(ClobClient::new(http).with_base_url(config.polymarket.clob_url.clone()));

    let kalshi_config = if config.kalshi.use_demo {
        KalshiClientConfig::demo()
    } else {
        KalshiClientConfig::production()
    };
    let kalshi = Arc::new(
        KalshiClient::new(kalshi_config.clone()).context("failed to build Kalshi client")?,
    );

    let acquirer = Arc::new(QuoteAcquirer::new(binance, gamma, clob, kalshi));

    let (continuous, discrete) = build_executors(config, kalshi_config)?;
    let dispatcher = Dispatcher::new(continuous, discrete);

    let min_net_margin = Decimal::try_from(config.trading.min_profit_margin)
        .context("trading.min_profit_margin is not a valid decimal")?;
    let engine_config = EngineConfig::default().with_min_net_margin(min_net_margin);

    let engine = Arc::new(ArbitrageEngine::new(acquirer, dispatcher, engine_config));

    if config.trading.auto_trade_enabled {
        let toggle = engine.set_auto_trade(true).await;
        for warning in &toggle.warnings {
            tracing::warn!("auto-trade enabled with warning: {}", warning);
        }
    }

    tracing::info!(
        paper = config.trading.paper_trading,
        auto_trade = config.trading.auto_trade_enabled,
        min_net_margin = %min_net_margin,
        "Engine configured"
    );

    Ok(engine)
}

fn build_executors(
    config: &AppConfig,
    kalshi_config: KalshiClientConfig,
) -> anyhow::Result<(Arc<PolymarketExecutor>, Arc<KalshiExecutor>)> {
    if config.trading.paper_trading {
        let continuous = PolymarketExecutor::paper()
            .context("failed to build Polymarket paper executor")?;
        let discrete = KalshiExecutor::paper(kalshi_config)
            .context("failed to build Kalshi paper executor")?;
        return Ok((Arc::new(continuous), Arc::new(discrete)));
    }

    if !config.polymarket.has_credentials() {
        anyhow::bail!(
            "live trading requires polymarket api_key, api_secret, and api_passphrase"
        );
    }
    if !config.kalshi.has_credentials() {
        anyhow::bail!("live trading requires kalshi api_key_id and private_key_path");
    }

    let creds = ApiCredentials {
        api_key: config.polymarket.api_key.clone(),
        secret: SecretString::from(config.polymarket.api_secret.clone()),
        passphrase: config.polymarket.api_passphrase.clone(),
        address: config.polymarket.funder_address.clone(),
    };
    let continuous =
        PolymarketExecutor::live(creds).context("failed to build Polymarket live executor")?;

    let auth = KalshiAuth::from_key_file(
        config.kalshi.api_key_id.clone(),
        &config.kalshi.private_key_path,
    )
    .context("failed to load Kalshi signing key")?;
    let discrete = KalshiExecutor::live(kalshi_config, auth)
        .context("failed to build Kalshi live executor")?;

    Ok((Arc::new(continuous), Arc::new(discrete)))
}

async fn shutdown_signal() -> anyhow::Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to create SIGTERM handler")?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .context("failed to create SIGINT handler")?;

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        }
    }

    Ok(())
}
