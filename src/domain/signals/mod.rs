//! Daily signal counting port

use async_trait::async_trait;

use crate::shared::errors::SignalCountError;
use crate::shared::types::{MetricKind, Provider, Symbol};

/// Counter key, e.g. `signals:binance:BTCUSDT:oi`
pub fn signal_key(provider: Provider, symbol: &Symbol, kind: MetricKind) -> String {
    format!("signals:{}:{}:{}", provider, symbol, kind)
}

/// Durable sliding-window counter of emitted signals
#[async_trait]
pub trait SignalRateLimiter: Send + Sync {
    /// Register one signal occurrence at the limiter's "now"
    async fn record_signal(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<(), SignalCountError>;

    /// Signals registered in the trailing 24 hours
    async fn count_signals_last_day(
        &self,
        provider: Provider,
        symbol: &Symbol,
        kind: MetricKind,
    ) -> Result<u64, SignalCountError>;

    /// Drop expired bookkeeping; stores that expire on their own keep the default
    fn prune_expired(&self) -> usize {
        0
    }
}
