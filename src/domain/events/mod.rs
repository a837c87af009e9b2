//! Alert events and the publisher port

use async_trait::async_trait;
use serde::Serialize;

use crate::shared::errors::PublishError;
use crate::shared::types::{Provider, Symbol};
use crate::shared::utils::format_percentage;

pub const PUMP_EVENT: &str = "PUMP_EVENT";
pub const OI_EVENT: &str = "OI_EVENT";

/// Price moved past the configured threshold within the look-back window
#[derive(Debug, Clone, PartialEq)]
pub struct PriceChangeDetected {
    pub symbol: Symbol,
    pub provider: Provider,
    pub percentage_change: f64,
    pub signals_count_per_day: u64,
    pub timestamp: i64,
}

/// Open interest moved past the configured threshold within the look-back
/// window; carries the price change over the same window
#[derive(Debug, Clone, PartialEq)]
pub struct OpenInterestThresholdExceeded {
    pub symbol: Symbol,
    pub provider: Provider,
    pub oi_percentage_change: f64,
    pub price_percentage_change: f64,
    pub signals_count_per_day: u64,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AlertEvent {
    PriceChangeDetected(PriceChangeDetected),
    OpenInterestThresholdExceeded(OpenInterestThresholdExceeded),
}

/// `PUMP_EVENT` wire record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PumpEventPayload {
    pub symbol: String,
    pub provider: String,
    pub percentage_change: String,
    pub signals_count_per_day: u64,
    pub timestamp: i64,
}

/// `OI_EVENT` wire record
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OiEventPayload {
    pub symbol: String,
    pub provider: String,
    pub signals_count_per_day: u64,
    pub open_close_percentage_difference: String,
    pub open_interest_percentage_difference: String,
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    Pump(PumpEventPayload),
    OpenInterest(OiEventPayload),
}

impl AlertEvent {
    /// Channel the event is published on
    pub fn event_type(&self) -> &'static str {
        match self {
            AlertEvent::PriceChangeDetected(_) => PUMP_EVENT,
            AlertEvent::OpenInterestThresholdExceeded(_) => OI_EVENT,
        }
    }

    pub fn symbol(&self) -> &Symbol {
        match self {
            AlertEvent::PriceChangeDetected(event) => &event.symbol,
            AlertEvent::OpenInterestThresholdExceeded(event) => &event.symbol,
        }
    }

    pub fn provider(&self) -> Provider {
        match self {
            AlertEvent::PriceChangeDetected(event) => event.provider,
            AlertEvent::OpenInterestThresholdExceeded(event) => event.provider,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            AlertEvent::PriceChangeDetected(event) => event.timestamp,
            AlertEvent::OpenInterestThresholdExceeded(event) => event.timestamp,
        }
    }

    /// Flat record handed to the transport; percentages become 2-decimal strings
    pub fn to_payload(&self) -> EventPayload {
        match self {
            AlertEvent::PriceChangeDetected(event) => EventPayload::Pump(PumpEventPayload {
                symbol: event.symbol.to_string(),
                provider: event.provider.to_string(),
                percentage_change: format_percentage(event.percentage_change),
                signals_count_per_day: event.signals_count_per_day,
                timestamp: event.timestamp,
            }),
            AlertEvent::OpenInterestThresholdExceeded(event) => {
                EventPayload::OpenInterest(OiEventPayload {
                    symbol: event.symbol.to_string(),
                    provider: event.provider.to_string(),
                    signals_count_per_day: event.signals_count_per_day,
                    open_close_percentage_difference: format_percentage(
                        event.price_percentage_change,
                    ),
                    open_interest_percentage_difference: format_percentage(
                        event.oi_percentage_change,
                    ),
                    timestamp: event.timestamp,
                })
            }
        }
    }
}

/// Outbound transport for alerts
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AlertEvent) -> Result<(), PublishError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn btc() -> Symbol {
        Symbol::new("BTCUSDT").unwrap()
    }

    #[test]
    fn test_pump_event_payload() {
        let event = AlertEvent::PriceChangeDetected(PriceChangeDetected {
            symbol: btc(),
            provider: Provider::Binance,
            percentage_change: 15.000000000000002,
            signals_count_per_day: 1,
            timestamp: 1_200_000,
        });

        assert_eq!(event.event_type(), PUMP_EVENT);
        assert_eq!(
            serde_json::to_value(event.to_payload()).unwrap(),
            json!({
                "symbol": "BTCUSDT",
                "provider": "binance",
                "percentageChange": "15.00",
                "signalsCountPerDay": 1,
                "timestamp": 1_200_000,
            })
        );
    }

    #[test]
    fn test_oi_event_payload() {
        let event = AlertEvent::OpenInterestThresholdExceeded(OpenInterestThresholdExceeded {
            symbol: btc(),
            provider: Provider::Bybit,
            oi_percentage_change: 4.256,
            price_percentage_change: -1.5,
            signals_count_per_day: 2,
            timestamp: 42,
        });

        assert_eq!(event.event_type(), OI_EVENT);
        assert_eq!(event.provider(), Provider::Bybit);
        assert_eq!(event.symbol(), &btc());
        assert_eq!(event.timestamp(), 42);
        assert_eq!(
            serde_json::to_value(event.to_payload()).unwrap(),
            json!({
                "symbol": "BTCUSDT",
                "provider": "bybit",
                "signalsCountPerDay": 2,
                "openClosePercentageDifference": "-1.50",
                "openInterestPercentageDifference": "4.26",
                "timestamp": 42,
            })
        );
    }
}
