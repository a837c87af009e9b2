//! Open interest surge detection

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{
    window_change, AnalysisConfig, NotificationGate, PairOutcome, PercentageChange, TickReport,
};
use crate::domain::events::{AlertEvent, EventPublisher, OpenInterestThresholdExceeded};
use crate::domain::market::{SeriesSnapshot, TimeSeriesStore};
use crate::domain::signals::SignalRateLimiter;
use crate::shared::clock::Clock;
use crate::shared::types::{MetricKind, Provider, SeriesKey};

/// Emits `OI_EVENT` when open interest rose past `oi_threshold` over the
/// look-back window, attaching the price change over the same window.
///
/// Unlike [`super::PriceAnalyzer`] the cooldown is checked before the
/// threshold, and pairs whose daily signal count exceeds the limit are
/// suppressed outright.
pub struct OpenInterestAnalyzer {
    oi_store: Arc<TimeSeriesStore>,
    price_store: Arc<TimeSeriesStore>,
    publisher: Arc<dyn EventPublisher>,
    signals: Arc<dyn SignalRateLimiter>,
    config: AnalysisConfig,
    gate: NotificationGate,
    clock: Arc<dyn Clock>,
}

impl OpenInterestAnalyzer {
    pub fn new(
        oi_store: Arc<TimeSeriesStore>,
        price_store: Arc<TimeSeriesStore>,
        publisher: Arc<dyn EventPublisher>,
        signals: Arc<dyn SignalRateLimiter>,
        config: AnalysisConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = NotificationGate::new(config.cooldown_period_ms());
        Self {
            oi_store,
            price_store,
            publisher,
            signals,
            config,
            gate,
            clock,
        }
    }

    pub async fn analyze(&mut self) -> TickReport {
        let now = self.clock.now_ms();
        self.analyze_at(now).await
    }

    pub async fn analyze_at(&mut self, now: i64) -> TickReport {
        let mut report = TickReport::new(MetricKind::OpenInterest, now);

        for provider in Provider::ALL {
            for snapshot in self.oi_store.collect_updated(provider) {
                let outcome = self.evaluate(&snapshot, now).await;
                report.push(snapshot.key, outcome);
            }
        }

        report
    }

    async fn evaluate(&mut self, snapshot: &SeriesSnapshot, now: i64) -> PairOutcome {
        let key = &snapshot.key;
        let cutoff = now - self.config.time_window_ms();

        let change = match window_change(snapshot, cutoff) {
            Ok(change) => change,
            Err(outcome) => {
                debug!("oi {}: skipped ({:?})", key, outcome);
                return outcome;
            }
        };

        if !self.gate.can_notify(key, now) {
            return PairOutcome::Cooldown;
        }

        if !change.exceeds_threshold(self.config.oi_threshold(), self.config.threshold_direction()) {
            return PairOutcome::BelowThreshold;
        }

        let signals_count_per_day = match self
            .signals
            .count_signals_last_day(key.provider, &key.symbol, MetricKind::OpenInterest)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!("oi {}: failed to count signals: {}", key, e);
                return PairOutcome::CollaboratorFailed;
            }
        };

        if signals_count_per_day > self.config.limit_signals_per_day() {
            debug!(
                "oi {}: {} suppressed, {} signals today exceed limit {}",
                key,
                change,
                signals_count_per_day,
                self.config.limit_signals_per_day()
            );
            return PairOutcome::RateCapped;
        }

        let price_change = self.correlated_price_change(key, cutoff);

        if let Err(e) = self
            .signals
            .record_signal(key.provider, &key.symbol, MetricKind::OpenInterest)
            .await
        {
            warn!("oi {}: failed to record signal: {}", key, e);
            return PairOutcome::CollaboratorFailed;
        }
        self.gate.record(key.clone(), now);

        let event = AlertEvent::OpenInterestThresholdExceeded(OpenInterestThresholdExceeded {
            symbol: key.symbol.clone(),
            provider: key.provider,
            oi_percentage_change: change.value(),
            price_percentage_change: price_change,
            signals_count_per_day,
            timestamp: now,
        });

        match self.publisher.publish(&event).await {
            Ok(()) => {
                info!(
                    "📊 OI {}: {} with price {:.2}% ({} today)",
                    key, change, price_change, signals_count_per_day
                );
                PairOutcome::Emitted
            }
            Err(e) => {
                warn!("oi {}: failed to publish: {}", key, e);
                PairOutcome::CollaboratorFailed
            }
        }
    }

    /// Price change over the same window; 0 without usable price history
    fn correlated_price_change(&self, key: &SeriesKey, cutoff: i64) -> f64 {
        self.price_store
            .window_endpoints(key.provider, &key.symbol, cutoff)
            .and_then(|(oldest, latest)| {
                PercentageChange::between(latest.value(), oldest.value()).ok()
            })
            .map(|change| change.value())
            .unwrap_or(0.0)
    }
}
