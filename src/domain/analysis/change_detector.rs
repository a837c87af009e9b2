//! Percentage change computation and threshold comparison

use std::fmt;

use super::ThresholdDirection;
use crate::shared::errors::AnalysisError;

/// `(latest - oldest) / oldest * 100`, kept at full precision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PercentageChange(f64);

impl PercentageChange {
    pub fn between(latest: f64, oldest: f64) -> Result<Self, AnalysisError> {
        if oldest == 0.0 {
            return Err(AnalysisError::DivisionByZero);
        }
        Ok(Self((latest - oldest) / oldest * 100.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn exceeds_threshold(&self, threshold: f64, direction: ThresholdDirection) -> bool {
        match direction {
            ThresholdDirection::IncreaseOnly => self.0 >= threshold,
            ThresholdDirection::Absolute => self.0.abs() >= threshold,
        }
    }
}

impl fmt::Display for PercentageChange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}%", self.0)
    }
}
