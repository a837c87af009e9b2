//! Common types used across the application

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::shared::errors::ValidationError;

/// Supported exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Binance,
    Bybit,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Binance, Provider::Bybit];

    /// Get string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Binance => "binance",
            Provider::Bybit => "bybit",
        }
    }
}

impl FromStr for Provider {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "binance" => Ok(Provider::Binance),
            "bybit" => Ok(Provider::Bybit),
            _ => Err(ValidationError::InvalidProvider(value.to_string())),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metric tracked per series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricKind {
    Price,
    OpenInterest,
}

impl MetricKind {
    /// Short name used in signal counter keys
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Price => "price",
            MetricKind::OpenInterest => "oi",
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Upper-cased ticker, e.g. `BTCUSDT`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(value: &str) -> Result<Self, ValidationError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptySymbol);
        }
        Ok(Self(trimmed.to_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identity of one series inside a store: `(provider, symbol)`.
/// The metric is implied by the store that owns the series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeriesKey {
    pub provider: Provider,
    pub symbol: Symbol,
}

impl SeriesKey {
    pub fn new(provider: Provider, symbol: Symbol) -> Self {
        Self { provider, symbol }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.symbol, self.provider)
    }
}
