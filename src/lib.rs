//! Market Pulse - price and open-interest pump detector
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use application::{IngestionService, MarketMonitor};
pub use domain::analysis::{AnalysisConfig, OpenInterestAnalyzer, PriceAnalyzer};
pub use domain::events::{AlertEvent, EventPublisher};
pub use domain::market::TimeSeriesStore;
pub use domain::signals::SignalRateLimiter;
