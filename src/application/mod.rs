//! Application layer - ingestion and the monitoring loop

pub mod ingestion;
pub mod market_monitor;

pub use ingestion::{IngestReport, IngestionService};
pub use market_monitor::{MarketMonitor, MarketMonitorConfig, MonitorStats};
