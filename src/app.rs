// src/app.rs
use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::sync::{mpsc, watch};
use tracing::{error, info, warn};

use crate::application::{IngestionService, MarketMonitor, MarketMonitorConfig};
use crate::config::Config;
use crate::domain::analysis::{AnalysisConfig, OpenInterestAnalyzer, PriceAnalyzer};
use crate::domain::events::EventPublisher;
use crate::domain::market::TimeSeriesStore;
use crate::domain::signals::SignalRateLimiter;
use crate::infrastructure::{
    BroadcastEventPublisher, InMemorySignalCounter, JsonLinesSink, JsonLinesSource,
};
use crate::shared::clock::{Clock, SystemClock};
use crate::shared::types::MetricKind;

const INBOUND_BUFFER: usize = 1_024;

#[derive(Debug, Clone)]
pub struct AppCfg {
    pub analysis: AnalysisConfig,
    pub tick_interval_ms: u64,
    pub cleanup_interval_ms: u64,
    pub input: String,
    pub publish_buffer: usize,
}

impl AppCfg {
    pub fn from_config(cfg: Config) -> Result<Self> {
        let analysis = AnalysisConfig::new(cfg.analysis).context("invalid [analysis] section")?;
        if cfg.runtime.tick_interval_ms == 0 {
            anyhow::bail!("tick_interval_ms must be positive");
        }

        Ok(Self {
            analysis,
            tick_interval_ms: cfg.runtime.tick_interval_ms,
            cleanup_interval_ms: cfg.runtime.cleanup_interval_ms,
            input: cfg.transport.input,
            publish_buffer: cfg.transport.publish_buffer,
        })
    }

    fn monitor_config(&self) -> MarketMonitorConfig {
        MarketMonitorConfig {
            tick_interval_ms: self.tick_interval_ms,
            cleanup_interval_ms: self.cleanup_interval_ms,
            data_retention_period_ms: self.analysis.data_retention_period_ms(),
        }
    }
}

pub async fn run(app_cfg: AppCfg) -> Result<()> {
    info!("Starting market pulse detector");
    info!("Configuration: {:?}", app_cfg);

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let retention = app_cfg.analysis.data_retention_period_ms();
    let price_store = Arc::new(TimeSeriesStore::new(MetricKind::Price, retention));
    let oi_store = Arc::new(TimeSeriesStore::new(MetricKind::OpenInterest, retention));

    // Outbound: broadcast fan-out drained to stdout
    let broadcaster = BroadcastEventPublisher::new(app_cfg.publish_buffer);
    let sink_handle = tokio::spawn(JsonLinesSink::new(tokio::io::stdout()).run(broadcaster.subscribe()));
    let publisher: Arc<dyn EventPublisher> = Arc::new(broadcaster);
    let signals: Arc<dyn SignalRateLimiter> = Arc::new(InMemorySignalCounter::new(Arc::clone(&clock)));

    let price_analyzer = PriceAnalyzer::new(
        Arc::clone(&price_store),
        Arc::clone(&publisher),
        Arc::clone(&signals),
        app_cfg.analysis.clone(),
        Arc::clone(&clock),
    );
    let oi_analyzer = OpenInterestAnalyzer::new(
        Arc::clone(&oi_store),
        Arc::clone(&price_store),
        Arc::clone(&publisher),
        Arc::clone(&signals),
        app_cfg.analysis.clone(),
        Arc::clone(&clock),
    );
    drop(publisher);

    let monitor = MarketMonitor::new(
        app_cfg.monitor_config(),
        price_analyzer,
        oi_analyzer,
        Arc::clone(&price_store),
        Arc::clone(&oi_store),
        signals,
        clock,
    );
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_handle = tokio::spawn(monitor.run(shutdown_rx));

    // Inbound: JSON lines -> ingestion -> stores
    let (tx, rx) = mpsc::channel(INBOUND_BUFFER);
    let ingestion_handle = tokio::spawn(IngestionService::new(price_store, oi_store).run(rx));
    let reader = open_input(&app_cfg.input).await?;
    let source_handle = tokio::spawn(async move {
        match JsonLinesSource::new(reader).run(tx).await {
            Ok(forwarded) => info!("Input exhausted after {} messages", forwarded),
            Err(e) => error!("❌ Input failed: {}", e),
        }
    });

    tokio::signal::ctrl_c()
        .await
        .context("install Ctrl+C handler")?;
    info!("Received Ctrl+C, shutting down...");

    source_handle.abort();
    ingestion_handle.abort();
    if shutdown_tx.send(true).is_err() {
        warn!("Market monitor already stopped");
    }

    let stats = monitor_handle.await.context("market monitor task")?;
    info!(
        "Processed {} ticks, {} alerts, {} samples evicted",
        stats.ticks, stats.alerts_emitted, stats.samples_evicted
    );

    match sink_handle.await.context("alert sink task")? {
        Ok(written) => info!("Alert sink wrote {} events", written),
        Err(e) => error!("❌ Alert sink failed: {}", e),
    }

    Ok(())
}

async fn open_input(input: &str) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if input == "-" {
        info!("Reading market updates from stdin");
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }

    let file = tokio::fs::File::open(input)
        .await
        .with_context(|| format!("open input {}", input))?;
    info!("Reading market updates from {}", input);
    Ok(Box::new(BufReader::new(file)))
}
