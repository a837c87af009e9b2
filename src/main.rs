use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use market_pulse::app;
use market_pulse::config::Config;

#[derive(Parser, Debug)]
#[command(version, about = "Price and open-interest pump detector for binance and bybit feeds")]
struct Args {
    /// Path to config file
    #[arg(long, default_value = "Config.toml")]
    config: String,

    /// JSON-lines input file, `-` for stdin (overrides config)
    #[arg(long)]
    input: Option<String>,

    /// Analysis tick interval in milliseconds (overrides config)
    #[arg(long)]
    tick_interval_ms: Option<u64>,

    /// Price pump threshold in percent (overrides config)
    #[arg(long)]
    price_threshold: Option<f64>,

    /// Open interest threshold in percent (overrides config)
    #[arg(long)]
    oi_threshold: Option<f64>,

    /// Log level when RUST_LOG is unset (overrides config)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Priority: CLI args > Config file > Defaults
    let loaded = Config::load_optional(&args.config)?;
    let config_found = loaded.is_some();
    let mut config = loaded.unwrap_or_default();

    if let Some(input) = args.input {
        config.transport.input = input;
    }
    if let Some(tick_interval_ms) = args.tick_interval_ms {
        config.runtime.tick_interval_ms = tick_interval_ms;
    }
    if let Some(price_threshold) = args.price_threshold {
        config.analysis.price_threshold = price_threshold;
    }
    if let Some(oi_threshold) = args.oi_threshold {
        config.analysis.oi_threshold = oi_threshold;
    }
    if let Some(log_level) = args.log_level {
        config.runtime.log_level = log_level;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.runtime.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if config_found {
        info!("Loaded configuration from {}", args.config);
    } else {
        warn!("Config file {} not found, using defaults", args.config);
    }

    let app_cfg = app::AppCfg::from_config(config)?;
    app::run(app_cfg).await
}
