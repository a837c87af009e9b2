//! Bounded in-memory history per (provider, symbol) for one metric kind

use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use tracing::debug;

use super::{find_latest_at_or_before, Sample};
use crate::shared::errors::ValidationError;
use crate::shared::types::{MetricKind, Provider, SeriesKey, Symbol};

#[derive(Debug, Default)]
struct Series {
    samples: VecDeque<Sample>,
    dirty: bool,
}

impl Series {
    /// Keep timestamps non-decreasing; late samples go after their equals
    fn insert(&mut self, sample: Sample) {
        match self.samples.back() {
            Some(last) if last.timestamp() > sample.timestamp() => {
                let idx = self
                    .samples
                    .partition_point(|s| s.timestamp() <= sample.timestamp());
                self.samples.insert(idx, sample);
            }
            _ => self.samples.push_back(sample),
        }
    }

    fn newest_timestamp(&self) -> Option<i64> {
        self.samples.back().map(|sample| sample.timestamp())
    }

    fn evict_older_than(&mut self, cutoff: i64) -> usize {
        let mut evicted = 0;
        while self
            .samples
            .front()
            .is_some_and(|sample| sample.is_older_than(cutoff))
        {
            self.samples.pop_front();
            evicted += 1;
        }
        evicted
    }
}

/// Copy of a series taken at collection time.
///
/// Bounded by the retention period. Eviction mutates the series in place, so
/// analyzers work on this copy and never hold a series lock across an await.
#[derive(Debug, Clone)]
pub struct SeriesSnapshot {
    pub key: SeriesKey,
    pub samples: Vec<Sample>,
}

impl SeriesSnapshot {
    pub fn latest(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Time-series storage for a single metric kind.
///
/// Every series sits behind its own lock, so appends for different symbols
/// never contend; the index lock is only taken for write when a series is
/// created.
pub struct TimeSeriesStore {
    metric: MetricKind,
    retention_ms: i64,
    series: RwLock<BTreeMap<SeriesKey, Arc<Mutex<Series>>>>,
}

impl TimeSeriesStore {
    pub fn new(metric: MetricKind, retention_ms: i64) -> Self {
        Self {
            metric,
            retention_ms,
            series: RwLock::new(BTreeMap::new()),
        }
    }

    /// Validate and append one observation, evicting samples that fell out of
    /// the retention window measured from the newest sample of the series.
    pub fn append(
        &self,
        provider: Provider,
        symbol: &str,
        value: f64,
        timestamp: i64,
    ) -> Result<SeriesKey, ValidationError> {
        let key = SeriesKey::new(provider, Symbol::new(symbol)?);
        let sample = Sample::new(value, timestamp)?;
        self.insert(key.clone(), sample);
        Ok(key)
    }

    /// Append an already validated sample. A sample already outside the
    /// retention window of the series is dropped without marking it dirty.
    pub fn insert(&self, key: SeriesKey, sample: Sample) {
        let series = self.series_entry(&key);
        let mut series = series.lock();

        let newest = series
            .newest_timestamp()
            .map_or(sample.timestamp(), |ts| ts.max(sample.timestamp()));
        let cutoff = newest - self.retention_ms;
        if sample.is_older_than(cutoff) {
            debug!(
                "{} {}: dropped stale sample at {} (newest {})",
                self.metric,
                key,
                sample.timestamp(),
                newest
            );
            return;
        }

        series.insert(sample);
        let evicted = series.evict_older_than(cutoff);
        series.dirty = true;

        if evicted > 0 {
            debug!("{} {}: evicted {} samples on append", self.metric, key, evicted);
        }
    }

    /// Snapshot every series of `provider` touched since the previous call and
    /// clear its dirty flag. Snapshot and clear happen under the series lock.
    pub fn collect_updated(&self, provider: Provider) -> Vec<SeriesSnapshot> {
        let index = self.series.read();
        let mut updated = Vec::new();

        for (key, series) in index.iter().filter(|(key, _)| key.provider == provider) {
            let mut series = series.lock();
            if !series.dirty {
                continue;
            }
            updated.push(SeriesSnapshot {
                key: key.clone(),
                samples: series.samples.iter().copied().collect(),
            });
            series.dirty = false;
        }

        updated
    }

    /// Oldest-at-or-before-`cutoff` and latest sample of a series with at
    /// least two samples. Leaves the dirty flag untouched.
    pub fn window_endpoints(
        &self,
        provider: Provider,
        symbol: &Symbol,
        cutoff: i64,
    ) -> Option<(Sample, Sample)> {
        let key = SeriesKey::new(provider, symbol.clone());
        let series = self.series.read().get(&key).cloned()?;
        let series = series.lock();

        if series.samples.len() < 2 {
            return None;
        }
        let (front, back) = series.samples.as_slices();
        let oldest = match find_latest_at_or_before(back, cutoff) {
            Some(sample) => *sample,
            None => *find_latest_at_or_before(front, cutoff)?,
        };
        let latest = *series.samples.back()?;
        Some((oldest, latest))
    }

    /// Evict samples older than `cutoff` from every series, dirty or not.
    /// Returns the number of samples removed.
    pub fn cleanup_old_data(&self, cutoff: i64) -> usize {
        let index = self.series.read();
        let evicted: usize = index
            .values()
            .map(|series| series.lock().evict_older_than(cutoff))
            .sum();

        if evicted > 0 {
            debug!("{}: cleanup evicted {} samples older than {}", self.metric, evicted, cutoff);
        }
        evicted
    }

    pub fn series_count(&self) -> usize {
        self.series.read().len()
    }

    pub fn sample_count(&self) -> usize {
        self.series
            .read()
            .values()
            .map(|series| series.lock().samples.len())
            .sum()
    }

    fn series_entry(&self, key: &SeriesKey) -> Arc<Mutex<Series>> {
        if let Some(series) = self.series.read().get(key) {
            return Arc::clone(series);
        }
        let mut index = self.series.write();
        Arc::clone(index.entry(key.clone()).or_default())
    }
}
