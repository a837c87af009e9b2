//! In-process sliding-window signal counter

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use crate::domain::signals::{signal_key, SignalRateLimiter};
use crate::shared::clock::Clock;
use crate::shared::errors::SignalCountError;
use crate::shared::types::{MetricKind, Provider, Symbol};
use crate::shared::utils::DAY_MS;

/// Signal timestamps per `signals:{provider}:{symbol}:{kind}` key, pruned to
/// the trailing 24 hours on every write.
pub struct InMemorySignalCounter {
    clock: Arc<dyn Clock>,
    retention_ms: i64,
    signals: Mutex<HashMap<String, VecDeque<i64>>>,
}

impl InMemorySignalCounter {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            retention_ms: DAY_MS,
            signals: Mutex::new(HashMap::new()),
        }
    }

    pub fn tracked_keys(&self) -> usize {
        self.signals.lock().len()
    }
}

fn prune_before(timestamps: &mut VecDeque<i64>, cutoff: i64) -> usize {
    let mut removed = 0;
    while timestamps.front().is_some_and(|ts| *ts < cutoff) {
        timestamps.pop_front();
        removed += 1;
    }
    removed
}

#[async_trait]
impl SignalRateLimiter for InMemorySignalCounter {
    async fn record_signal(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<(), SignalCountError> {
        let now = self.clock.now_ms();
        let mut signals = self.signals.lock();
        let timestamps = signals.entry(signal_key(provider, symbol, kind)).or_default();

        prune_before(timestamps, now - self.retention_ms);
        let idx = timestamps.partition_point(|ts| *ts <= now);
        timestamps.insert(idx, now);
        Ok(())
    }

    async fn count_signals_last_day(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<u64, SignalCountError> {
        let now = self.clock.now_ms();
        let from = now - self.retention_ms;
        let signals = self.signals.lock();

        let count = signals
            .get(&signal_key(provider, symbol, kind))
            .map(|timestamps| {
                timestamps
                    .iter()
                    .filter(|ts| **ts >= from && **ts <= now)
                    .count()
            })
            .unwrap_or(0);
        Ok(count as u64)
    }

    /// Drops expired timestamps and empty keys
    fn prune_expired(&self) -> usize {
        let cutoff = self.clock.now_ms() - self.retention_ms;
        let mut signals = self.signals.lock();
        let mut removed = 0;

        signals.retain(|_, timestamps| {
            removed += prune_before(timestamps, cutoff);
            !timestamps.is_empty()
        });

        if removed > 0 {
            debug!("signal counter pruned {} expired entries", removed);
        }
        removed
    }
}
