use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::domain::analysis::{OpenInterestAnalyzer, PriceAnalyzer, TickReport};
use crate::domain::market::TimeSeriesStore;
use crate::domain::signals::SignalRateLimiter;
use crate::shared::clock::Clock;

/// Monitor loop cadence
#[derive(Debug, Clone)]
pub struct MarketMonitorConfig {
    pub tick_interval_ms: u64,
    pub cleanup_interval_ms: u64,
    pub data_retention_period_ms: i64,
}

impl Default for MarketMonitorConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1_000,
            cleanup_interval_ms: 60_000,
            data_retention_period_ms: 60 * 60 * 1_000,
        }
    }
}

/// Running totals over the monitor's lifetime
#[derive(Debug, Clone)]
pub struct MonitorStats {
    pub start_time: Instant,
    pub ticks: u64,
    pub alerts_emitted: u64,
    pub suppressed: u64,
    pub collaborator_failures: u64,
    pub samples_evicted: u64,
    pub last_tick: Option<Instant>,
}

impl MonitorStats {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            ticks: 0,
            alerts_emitted: 0,
            suppressed: 0,
            collaborator_failures: 0,
            samples_evicted: 0,
            last_tick: None,
        }
    }

    pub fn record(&mut self, report: &TickReport) {
        self.alerts_emitted += report.emitted() as u64;
        self.suppressed += report.suppressed() as u64;
        self.collaborator_failures += report.failed() as u64;
    }

    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn get_alerts_per_minute(&self) -> f64 {
        let uptime_minutes = self.get_uptime().as_secs_f64() / 60.0;
        if uptime_minutes > 0.0 {
            self.alerts_emitted as f64 / uptime_minutes
        } else {
            0.0
        }
    }
}

impl Default for MonitorStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Drives both analyzers on a fixed cadence and sweeps expired history.
/// Owning the analyzers keeps ticks strictly sequential.
pub struct MarketMonitor {
    config: MarketMonitorConfig,
    price_analyzer: PriceAnalyzer,
    oi_analyzer: OpenInterestAnalyzer,
    price_store: Arc<TimeSeriesStore>,
    oi_store: Arc<TimeSeriesStore>,
    signals: Arc<dyn SignalRateLimiter>,
    clock: Arc<dyn Clock>,
    stats: MonitorStats,
}

impl MarketMonitor {
    pub fn new(
        config: MarketMonitorConfig,
        price_analyzer: PriceAnalyzer,
        oi_analyzer: OpenInterestAnalyzer,
        price_store: Arc<TimeSeriesStore>,
        oi_store: Arc<TimeSeriesStore>,
        signals: Arc<dyn SignalRateLimiter>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            price_analyzer,
            oi_analyzer,
            price_store,
            oi_store,
            signals,
            clock,
            stats: MonitorStats::new(),
        }
    }

    pub fn stats(&self) -> &MonitorStats {
        &self.stats
    }

    /// Run the price then the open-interest analyzer at one instant
    pub async fn tick(&mut self) -> (TickReport, TickReport) {
        let now = self.clock.now_ms();
        let price = self.price_analyzer.analyze_at(now).await;
        let oi = self.oi_analyzer.analyze_at(now).await;

        self.stats.ticks += 1;
        self.stats.last_tick = Some(Instant::now());
        self.stats.record(&price);
        self.stats.record(&oi);

        if !price.is_empty() || !oi.is_empty() {
            debug!(
                "Tick {}: price {} pairs / {} alerts, oi {} pairs / {} alerts",
                self.stats.ticks,
                price.outcomes.len(),
                price.emitted(),
                oi.outcomes.len(),
                oi.emitted()
            );
        }
        (price, oi)
    }

    /// Evict samples older than the retention period from both stores
    pub fn cleanup(&mut self) -> usize {
        let cutoff = self.clock.now_ms() - self.config.data_retention_period_ms;
        let evicted = self.price_store.cleanup_old_data(cutoff) + self.oi_store.cleanup_old_data(cutoff);
        let pruned = self.signals.prune_expired();

        self.stats.samples_evicted += evicted as u64;
        if evicted > 0 || pruned > 0 {
            debug!("Cleanup evicted {} samples, pruned {} signals", evicted, pruned);
        }
        evicted
    }

    /// Tick and clean up until `shutdown` flips to true or its sender drops
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> MonitorStats {
        info!(
            "🚀 Market monitor started (tick {}ms, cleanup {}ms)",
            self.config.tick_interval_ms, self.config.cleanup_interval_ms
        );

        let mut ticker = interval(Duration::from_millis(self.config.tick_interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut cleaner = interval(Duration::from_millis(self.config.cleanup_interval_ms.max(1)));
        cleaner.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.tick().await;
                }
                _ = cleaner.tick() => {
                    self.cleanup();
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(
            "🛑 Market monitor stopped: {} ticks, {} alerts ({:.2}/min), {} suppressed, {} failures, uptime {:?}",
            self.stats.ticks,
            self.stats.alerts_emitted,
            self.stats.get_alerts_per_minute(),
            self.stats.suppressed,
            self.stats.collaborator_failures,
            self.stats.get_uptime()
        );
        self.stats
    }
}
