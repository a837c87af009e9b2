//! Error handling for the application

use thiserror::Error;

/// Validation errors raised while constructing value objects
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Invalid provider: {0}. Valid providers: binance, bybit")]
    InvalidProvider(String),

    #[error("Symbol must be a non-empty string")]
    EmptySymbol,

    #[error("Missing or non-numeric field: {0}")]
    MissingField(&'static str),

    #[error("Sample value must be a finite number, got {0}")]
    InvalidValue(f64),

    #[error("Timestamp must be a non-negative number of milliseconds, got {0}")]
    InvalidTimestamp(i64),

    #[error("{0} must be positive")]
    NonPositiveConfig(&'static str),
}

/// Analysis-related errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("Cannot calculate percentage change: division by zero")]
    DivisionByZero,
}

/// Signal counter errors
#[derive(Error, Debug, Clone)]
pub enum SignalCountError {
    #[error("Signal counter unavailable: {0}")]
    Unavailable(String),
}

/// Event publishing errors
#[derive(Error, Debug, Clone)]
pub enum PublishError {
    #[error("No subscribers attached to channel {0}")]
    NoSubscribers(&'static str),
}

/// Inbound transport errors
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),

    #[error("Malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Read failed: {0}")]
    Io(#[from] std::io::Error),
}
