//! Collaborator fakes shared by the analyzer tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::domain::events::{AlertEvent, EventPublisher};
use crate::domain::signals::{signal_key, SignalRateLimiter};
use crate::shared::errors::{PublishError, SignalCountError};
use crate::shared::types::{MetricKind, Provider, Symbol};

/// Keeps every published event; can be switched to fail
#[derive(Default)]
pub struct RecordingPublisher {
    events: Mutex<Vec<AlertEvent>>,
    failing: AtomicBool,
}

impl RecordingPublisher {
    pub fn failing() -> Self {
        let publisher = Self::default();
        publisher.set_failing(true);
        publisher
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn events(&self) -> Vec<AlertEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &AlertEvent) -> Result<(), PublishError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(PublishError::NoSubscribers(event.event_type()));
        }
        self.events.lock().push(event.clone());
        Ok(())
    }
}

/// Counts recorded signals per key; counts can be preset and calls can fail
#[derive(Default)]
pub struct ScriptedSignalCounter {
    counts: Mutex<HashMap<String, u64>>,
    failing: AtomicBool,
}

impl ScriptedSignalCounter {
    pub fn failing() -> Self {
        let counter = Self::default();
        counter.failing.store(true, Ordering::SeqCst);
        counter
    }

    pub fn preset(&self, provider: Provider, symbol: &Symbol, kind: MetricKind, count: u64) {
        self.counts
            .lock()
            .insert(signal_key(provider, symbol, kind), count);
    }

    pub fn recorded(&self, provider: Provider, symbol: &Symbol, kind: MetricKind) -> u64 {
        self.counts
            .lock()
            .get(&signal_key(provider, symbol, kind))
            .copied()
            .unwrap_or(0)
    }

    fn check(&self) -> Result<(), SignalCountError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SignalCountError::Unavailable("counter down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SignalRateLimiter for ScriptedSignalCounter {
    async fn record_signal(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<(), SignalCountError> {
        self.check()?;
        *self
            .counts
            .lock()
            .entry(signal_key(provider, symbol, kind))
            .or_insert(0) += 1;
        Ok(())
    }

    async fn count_signals_last_day(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<u64, SignalCountError> {
        self.check()?;
        Ok(self.recorded(provider, symbol, kind))
    }
}
