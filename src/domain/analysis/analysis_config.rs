//! Analysis configuration value object

use serde::{Deserialize, Serialize};

use crate::shared::errors::ValidationError;
use crate::shared::utils::MINUTE_MS;

/// Which moves count as crossing a threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ThresholdDirection {
    /// Only increases alert: `change >= threshold`
    #[default]
    IncreaseOnly,
    /// Moves in either direction alert: `|change| >= threshold`
    Absolute,
}

/// Raw analysis settings as they appear in `Config.toml`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisSettings {
    pub oi_threshold: f64,
    pub price_threshold: f64,
    pub limit_signals_per_day: i64,
    pub time_window_ms: i64,
    pub cooldown_period_ms: i64,
    pub data_retention_period_ms: i64,
    pub threshold_direction: ThresholdDirection,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            oi_threshold: 3.0,
            price_threshold: 10.0,
            limit_signals_per_day: 5,
            time_window_ms: 20 * MINUTE_MS,
            cooldown_period_ms: 20 * MINUTE_MS,
            data_retention_period_ms: 60 * MINUTE_MS,
            threshold_direction: ThresholdDirection::IncreaseOnly,
        }
    }
}

/// Validated, immutable analysis configuration
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisConfig {
    oi_threshold: f64,
    price_threshold: f64,
    limit_signals_per_day: u64,
    time_window_ms: i64,
    cooldown_period_ms: i64,
    data_retention_period_ms: i64,
    threshold_direction: ThresholdDirection,
}

impl AnalysisConfig {
    pub fn new(settings: AnalysisSettings) -> Result<Self, ValidationError> {
        ensure_positive_f64(settings.oi_threshold, "OI threshold")?;
        ensure_positive_f64(settings.price_threshold, "Price threshold")?;
        ensure_positive_i64(settings.limit_signals_per_day, "Daily signal limit")?;
        ensure_positive_i64(settings.time_window_ms, "Time window")?;
        ensure_positive_i64(settings.cooldown_period_ms, "Cooldown period")?;
        ensure_positive_i64(settings.data_retention_period_ms, "Data retention period")?;

        Ok(Self {
            oi_threshold: settings.oi_threshold,
            price_threshold: settings.price_threshold,
            limit_signals_per_day: settings.limit_signals_per_day as u64,
            time_window_ms: settings.time_window_ms,
            cooldown_period_ms: settings.cooldown_period_ms,
            data_retention_period_ms: settings.data_retention_period_ms,
            threshold_direction: settings.threshold_direction,
        })
    }

    pub fn oi_threshold(&self) -> f64 {
        self.oi_threshold
    }

    pub fn price_threshold(&self) -> f64 {
        self.price_threshold
    }

    /// Applied as a hard cap by the open-interest analyzer only
    pub fn limit_signals_per_day(&self) -> u64 {
        self.limit_signals_per_day
    }

    pub fn time_window_ms(&self) -> i64 {
        self.time_window_ms
    }

    pub fn cooldown_period_ms(&self) -> i64 {
        self.cooldown_period_ms
    }

    pub fn data_retention_period_ms(&self) -> i64 {
        self.data_retention_period_ms
    }

    pub fn threshold_direction(&self) -> ThresholdDirection {
        self.threshold_direction
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        let defaults = AnalysisSettings::default();
        Self {
            oi_threshold: defaults.oi_threshold,
            price_threshold: defaults.price_threshold,
            limit_signals_per_day: defaults.limit_signals_per_day as u64,
            time_window_ms: defaults.time_window_ms,
            cooldown_period_ms: defaults.cooldown_period_ms,
            data_retention_period_ms: defaults.data_retention_period_ms,
            threshold_direction: defaults.threshold_direction,
        }
    }
}

fn ensure_positive_f64(value: f64, field: &'static str) -> Result<(), ValidationError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveConfig(field))
    }
}

fn ensure_positive_i64(value: i64, field: &'static str) -> Result<(), ValidationError> {
    if value > 0 {
        Ok(())
    } else {
        Err(ValidationError::NonPositiveConfig(field))
    }
}
