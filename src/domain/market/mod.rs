//! Market data domain - samples, series storage and window lookup

mod time_series_store;
mod window_lookup;

pub use time_series_store::{SeriesSnapshot, TimeSeriesStore};
pub use window_lookup::find_latest_at_or_before;

use crate::shared::errors::ValidationError;

/// One timestamped metric observation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    value: f64,
    timestamp: i64,
}

impl Sample {
    pub fn new(value: f64, timestamp: i64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::InvalidValue(value));
        }
        if timestamp < 0 {
            return Err(ValidationError::InvalidTimestamp(timestamp));
        }
        Ok(Self { value, timestamp })
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    /// Epoch milliseconds
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn is_older_than(&self, timestamp: i64) -> bool {
        self.timestamp < timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_validation() {
        assert!(Sample::new(100.0, 0).is_ok());
        assert!(matches!(
            Sample::new(f64::NAN, 1),
            Err(ValidationError::InvalidValue(_))
        ));
        assert!(matches!(
            Sample::new(f64::INFINITY, 1),
            Err(ValidationError::InvalidValue(_))
        ));
        assert_eq!(
            Sample::new(1.0, -5),
            Err(ValidationError::InvalidTimestamp(-5))
        );
    }

    #[test]
    fn test_is_older_than() {
        let sample = Sample::new(1.0, 1_000).unwrap();
        assert!(sample.is_older_than(1_001));
        assert!(!sample.is_older_than(1_000));
    }
}
