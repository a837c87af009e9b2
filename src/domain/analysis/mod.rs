//! Windowed change analysis for price and open interest

mod analysis_config;
mod change_detector;
mod notification_gate;
mod open_interest_analyzer;
mod price_analyzer;

#[cfg(test)]
pub(crate) mod test_support;

pub use analysis_config::{AnalysisConfig, AnalysisSettings, ThresholdDirection};
pub use change_detector::PercentageChange;
pub use notification_gate::NotificationGate;
pub use open_interest_analyzer::OpenInterestAnalyzer;
pub use price_analyzer::PriceAnalyzer;

use crate::domain::market::{find_latest_at_or_before, SeriesSnapshot};
use crate::shared::types::{MetricKind, SeriesKey};

/// What happened to one (provider, symbol) during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Emitted,
    /// Fewer than two samples, or none at or before the window cutoff
    InsufficientHistory,
    /// Oldest reference value was zero
    NoComparison,
    BelowThreshold,
    Cooldown,
    RateCapped,
    /// Signal counter or publisher failed; the pair was skipped
    CollaboratorFailed,
}

impl PairOutcome {
    pub fn is_suppressed(&self) -> bool {
        !matches!(self, PairOutcome::Emitted | PairOutcome::CollaboratorFailed)
    }
}

/// Outcomes of every dirty series examined by one analyzer tick
#[derive(Debug, Clone)]
pub struct TickReport {
    pub metric: MetricKind,
    pub timestamp: i64,
    pub outcomes: Vec<(SeriesKey, PairOutcome)>,
}

impl TickReport {
    pub fn new(metric: MetricKind, timestamp: i64) -> Self {
        Self {
            metric,
            timestamp,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, key: SeriesKey, outcome: PairOutcome) {
        self.outcomes.push((key, outcome));
    }

    pub fn count(&self, outcome: PairOutcome) -> usize {
        self.outcomes.iter().filter(|(_, o)| *o == outcome).count()
    }

    pub fn emitted(&self) -> usize {
        self.count(PairOutcome::Emitted)
    }

    pub fn suppressed(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_suppressed()).count()
    }

    pub fn failed(&self) -> usize {
        self.count(PairOutcome::CollaboratorFailed)
    }

    pub fn outcome_for(&self, key: &SeriesKey) -> Option<PairOutcome> {
        self.outcomes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, outcome)| *outcome)
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }
}

/// Change between the latest sample and the most recent one at or before
/// `cutoff`. Errors carry the suppression outcome.
pub(crate) fn window_change(
    snapshot: &SeriesSnapshot,
    cutoff: i64,
) -> Result<PercentageChange, PairOutcome> {
    if snapshot.samples.len() < 2 {
        return Err(PairOutcome::InsufficientHistory);
    }
    let oldest = find_latest_at_or_before(&snapshot.samples, cutoff)
        .ok_or(PairOutcome::InsufficientHistory)?;
    let latest = snapshot.latest().ok_or(PairOutcome::InsufficientHistory)?;

    PercentageChange::between(latest.value(), oldest.value())
        .map_err(|_| PairOutcome::NoComparison)
}
