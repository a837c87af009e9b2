//! Price pump detection

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{window_change, AnalysisConfig, NotificationGate, PairOutcome, TickReport};
use crate::domain::events::{AlertEvent, EventPublisher, PriceChangeDetected};
use crate::domain::market::{SeriesSnapshot, TimeSeriesStore};
use crate::domain::signals::SignalRateLimiter;
use crate::shared::clock::Clock;
use crate::shared::types::{MetricKind, Provider};

/// Emits `PUMP_EVENT` when the price rose past `price_threshold` over the
/// look-back window. Records every signal but never suppresses on the
/// daily count.
pub struct PriceAnalyzer {
    store: Arc<TimeSeriesStore>,
    publisher: Arc<dyn EventPublisher>,
    signals: Arc<dyn SignalRateLimiter>,
    config: AnalysisConfig,
    gate: NotificationGate,
    clock: Arc<dyn Clock>,
}

impl PriceAnalyzer {
    pub fn new(
        store: Arc<TimeSeriesStore>,
        publisher: Arc<dyn EventPublisher>,
        signals: Arc<dyn SignalRateLimiter>,
        config: AnalysisConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let gate = NotificationGate::new(config.cooldown_period_ms());
        Self {
            store,
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

    /// One tick over every price series updated since the previous tick
    pub async fn analyze_at(&mut self, now: i64) -> TickReport {
        let mut report = TickReport::new(MetricKind::Price, now);

        for provider in Provider::ALL {
            for snapshot in self.store.collect_updated(provider) {
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
                debug!("price {}: skipped ({:?})", key, outcome);
                return outcome;
            }
        };

        if !change.exceeds_threshold(self.config.price_threshold(), self.config.threshold_direction()) {
            return PairOutcome::BelowThreshold;
        }

        if !self.gate.can_notify(key, now) {
            debug!("price {}: {} suppressed by cooldown", key, change);
            return PairOutcome::Cooldown;
        }

        if let Err(e) = self
            .signals
            .record_signal(key.provider, &key.symbol, MetricKind::Price)
            .await
        {
            warn!("price {}: failed to record signal: {}", key, e);
            return PairOutcome::CollaboratorFailed;
        }
        self.gate.record(key.clone(), now);

        let signals_count_per_day = match self
            .signals
            .count_signals_last_day(key.provider, &key.symbol, MetricKind::Price)
            .await
        {
            Ok(count) => count,
            Err(e) => {
                warn!("price {}: failed to count signals: {}", key, e);
                return PairOutcome::CollaboratorFailed;
            }
        };

        let event = AlertEvent::PriceChangeDetected(PriceChangeDetected {
            symbol: key.symbol.clone(),
            provider: key.provider,
            percentage_change: change.value(),
            signals_count_per_day,
            timestamp: now,
        });

        match self.publisher.publish(&event).await {
            Ok(()) => {
                info!(
                    "📈 PUMP {}: {} over {}ms ({} today)",
                    key,
                    change,
                    self.config.time_window_ms(),
                    signals_count_per_day
                );
                PairOutcome::Emitted
            }
            Err(e) => {
                warn!("price {}: failed to publish: {}", key, e);
                PairOutcome::CollaboratorFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::analysis::test_support::{RecordingPublisher, ScriptedSignalCounter};
    use crate::domain::analysis::{AnalysisSettings, ThresholdDirection};
    use crate::domain::events::EventPayload;
    use crate::shared::clock::ManualClock;
    use crate::shared::types::{SeriesKey, Symbol};
    use crate::shared::utils::MINUTE_MS;

    struct Harness {
        store: Arc<TimeSeriesStore>,
        publisher: Arc<RecordingPublisher>,
        signals: Arc<ScriptedSignalCounter>,
        analyzer: PriceAnalyzer,
    }

    fn harness_with(
        settings: AnalysisSettings,
        publisher: RecordingPublisher,
        signals: ScriptedSignalCounter,
    ) -> Harness {
        let config = AnalysisConfig::new(settings).unwrap();
        let store = Arc::new(TimeSeriesStore::new(
            MetricKind::Price,
            config.data_retention_period_ms(),
        ));
        let publisher = Arc::new(publisher);
        let signals = Arc::new(signals);
        let analyzer = PriceAnalyzer::new(
            Arc::clone(&store),
            publisher.clone(),
            signals.clone(),
            config,
            Arc::new(ManualClock::new(0)),
        );
        Harness {
            store,
            publisher,
            signals,
            analyzer,
        }
    }

    fn harness() -> Harness {
        harness_with(
            AnalysisSettings::default(),
            RecordingPublisher::default(),
            ScriptedSignalCounter::default(),
        )
    }

    fn btc_key() -> SeriesKey {
        SeriesKey::new(Provider::Binance, Symbol::new("BTCUSDT").unwrap())
    }

    #[tokio::test]
    async fn test_pump_emitted_after_twenty_minutes() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store
            .append(Provider::Binance, "BTCUSDT", 100.0, 19 * MINUTE_MS + 59_000)
            .unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.outcome_for(&btc_key()), Some(PairOutcome::Emitted));

        let events = h.publisher.events();
        assert_eq!(events.len(), 1);
        match events[0].to_payload() {
            EventPayload::Pump(payload) => {
                assert_eq!(payload.symbol, "BTCUSDT");
                assert_eq!(payload.provider, "binance");
                assert_eq!(payload.percentage_change, "15.00");
                assert_eq!(payload.signals_count_per_day, 1);
                assert_eq!(payload.timestamp, 20 * MINUTE_MS);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_second_pump_within_cooldown_is_suppressed() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();
        h.analyzer.analyze_at(20 * MINUTE_MS).await;

        h.store.append(Provider::Binance, "BTCUSDT", 130.0, 25 * MINUTE_MS).unwrap();
        let report = h.analyzer.analyze_at(25 * MINUTE_MS).await;

        assert_eq!(report.outcome_for(&btc_key()), Some(PairOutcome::Cooldown));
        assert_eq!(h.publisher.events().len(), 1);
    }

    #[tokio::test]
    async fn test_alert_again_after_cooldown_elapses() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();
        h.analyzer.analyze_at(20 * MINUTE_MS).await;

        h.store.append(Provider::Binance, "BTCUSDT", 130.0, 30 * MINUTE_MS).unwrap();
        h.analyzer.analyze_at(30 * MINUTE_MS).await;

        h.store.append(Provider::Binance, "BTCUSDT", 150.0, 41 * MINUTE_MS).unwrap();
        let report = h.analyzer.analyze_at(41 * MINUTE_MS).await;

        assert_eq!(report.outcome_for(&btc_key()), Some(PairOutcome::Emitted));
        let events = h.publisher.events();
        assert_eq!(events.len(), 2);
        match events[1].to_payload() {
            EventPayload::Pump(payload) => assert_eq!(payload.signals_count_per_day, 2),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_price_drop_does_not_alert() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 80.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.outcome_for(&btc_key()), Some(PairOutcome::BelowThreshold));
        assert!(h.publisher.events().is_empty());
    }

    #[tokio::test]
    async fn test_absolute_direction_alerts_on_drop() {
        let mut h = harness_with(
            AnalysisSettings {
                threshold_direction: ThresholdDirection::Absolute,
                ..Default::default()
            },
            RecordingPublisher::default(),
            ScriptedSignalCounter::default(),
        );
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 80.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.emitted(), 1);
    }

    #[tokio::test]
    async fn test_daily_count_is_reported_but_not_enforced() {
        let mut h = harness();
        let btc = Symbol::new("BTCUSDT").unwrap();
        h.signals.preset(Provider::Binance, &btc, MetricKind::Price, 50);
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.emitted(), 1);
        match h.publisher.events()[0].to_payload() {
            EventPayload::Pump(payload) => assert_eq!(payload.signals_count_per_day, 51),
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_insufficient_history_and_zero_baseline() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Bybit, "ETHUSDT", 0.0, 0).unwrap();
        h.store.append(Provider::Bybit, "ETHUSDT", 10.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        let eth = SeriesKey::new(Provider::Bybit, Symbol::new("ETHUSDT").unwrap());
        assert_eq!(
            report.outcome_for(&btc_key()),
            Some(PairOutcome::InsufficientHistory)
        );
        assert_eq!(report.outcome_for(&eth), Some(PairOutcome::NoComparison));
    }

    #[tokio::test]
    async fn test_window_not_yet_spanned() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 5 * MINUTE_MS).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 130.0, 10 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(10 * MINUTE_MS).await;
        assert_eq!(
            report.outcome_for(&btc_key()),
            Some(PairOutcome::InsufficientHistory)
        );
    }

    #[tokio::test]
    async fn test_only_updated_series_are_examined() {
        let mut h = harness();
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 101.0, 20 * MINUTE_MS).unwrap();

        assert_eq!(h.analyzer.analyze_at(20 * MINUTE_MS).await.outcomes.len(), 1);
        assert!(h.analyzer.analyze_at(21 * MINUTE_MS).await.is_empty());
    }

    #[tokio::test]
    async fn test_publisher_failure_is_scoped_to_pair() {
        let mut h = harness_with(
            AnalysisSettings::default(),
            RecordingPublisher::failing(),
            ScriptedSignalCounter::default(),
        );
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();
        h.store.append(Provider::Binance, "ETHUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "ETHUSDT", 101.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.failed(), 1);
        assert_eq!(report.count(PairOutcome::BelowThreshold), 1);
    }

    #[tokio::test]
    async fn test_counter_failure_skips_pair_without_gate_update() {
        let mut h = harness_with(
            AnalysisSettings::default(),
            RecordingPublisher::default(),
            ScriptedSignalCounter::failing(),
        );
        h.store.append(Provider::Binance, "BTCUSDT", 100.0, 0).unwrap();
        h.store.append(Provider::Binance, "BTCUSDT", 115.0, 20 * MINUTE_MS).unwrap();

        let report = h.analyzer.analyze_at(20 * MINUTE_MS).await;
        assert_eq!(report.failed(), 1);
        assert!(h.publisher.events().is_empty());
        assert_eq!(h.analyzer.gate.last_alert(&btc_key()), None);
    }
}
