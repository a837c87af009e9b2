//! Per-series alert cooldown

use std::collections::HashMap;

use crate::shared::types::SeriesKey;

/// Remembers the last alert per (provider, symbol) for one analyzer.
/// Entries live for the whole process.
#[derive(Debug)]
pub struct NotificationGate {
    cooldown_ms: i64,
    last_alert: HashMap<SeriesKey, i64>,
}

impl NotificationGate {
    pub fn new(cooldown_ms: i64) -> Self {
        Self {
            cooldown_ms,
            last_alert: HashMap::new(),
        }
    }

    /// True when the pair never alerted or its cooldown has fully elapsed
    pub fn can_notify(&self, key: &SeriesKey, now: i64) -> bool {
        match self.last_alert.get(key) {
            Some(last) => now > last + self.cooldown_ms,
            None => true,
        }
    }

    pub fn record(&mut self, key: SeriesKey, now: i64) {
        self.last_alert.insert(key, now);
    }

    pub fn last_alert(&self, key: &SeriesKey) -> Option<i64> {
        self.last_alert.get(key).copied()
    }
}
