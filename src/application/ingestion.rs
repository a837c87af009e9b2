//! Inbound update ingestion

use serde_json::{Map, Value};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::domain::market::TimeSeriesStore;
use crate::infrastructure::transport::InboundMessage;
use crate::shared::errors::ValidationError;
use crate::shared::types::{MetricKind, Provider};

const PRICE_FIELDS: [&str; 3] = ["price", "lastPrice", "value"];
const OI_FIELDS: [&str; 2] = ["openInterest", "value"];

/// Accepted and dropped entries of one or more inbound messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub accepted: usize,
    pub dropped: usize,
}

impl IngestReport {
    pub fn merge(&mut self, other: IngestReport) {
        self.accepted += other.accepted;
        self.dropped += other.dropped;
    }
}

/// Validates inbound entries and appends them to the matching store
#[derive(Clone)]
pub struct IngestionService {
    price_store: Arc<TimeSeriesStore>,
    oi_store: Arc<TimeSeriesStore>,
}

impl IngestionService {
    pub fn new(price_store: Arc<TimeSeriesStore>, oi_store: Arc<TimeSeriesStore>) -> Self {
        Self {
            price_store,
            oi_store,
        }
    }

    /// Apply every well-formed entry of `message`; bad entries are skipped
    /// one by one without affecting the rest of the batch.
    pub fn ingest(&self, message: &InboundMessage) -> IngestReport {
        let (store, value_fields): (&TimeSeriesStore, &[&str]) = match message.channel.metric() {
            MetricKind::Price => (self.price_store.as_ref(), &PRICE_FIELDS[..]),
            MetricKind::OpenInterest => (self.oi_store.as_ref(), &OI_FIELDS[..]),
        };

        let entries: Vec<&Value> = match &message.payload {
            Value::Array(items) => items.iter().collect(),
            single => vec![single],
        };

        let mut report = IngestReport::default();
        for (idx, entry) in entries.into_iter().enumerate() {
            match append_entry(store, entry, value_fields) {
                Ok(()) => report.accepted += 1,
                Err(e) => {
                    warn!("{} entry {} dropped: {}", message.channel, idx, e);
                    report.dropped += 1;
                }
            }
        }

        debug!(
            "{}: {} accepted, {} dropped",
            message.channel, report.accepted, report.dropped
        );
        report
    }

    /// Consume messages until every sender is gone
    pub async fn run(self, mut rx: mpsc::Receiver<InboundMessage>) -> IngestReport {
        let mut total = IngestReport::default();
        while let Some(message) = rx.recv().await {
            total.merge(self.ingest(&message));
        }
        info!(
            "Ingestion stopped: {} accepted, {} dropped",
            total.accepted, total.dropped
        );
        total
    }
}

fn append_entry(
    store: &TimeSeriesStore,
    entry: &Value,
    value_fields: &[&str],
) -> Result<(), ValidationError> {
    let fields = entry_fields(entry).ok_or(ValidationError::MissingField("entry"))?;

    let provider: Provider = fields
        .get("provider")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("provider"))?
        .parse()?;
    let symbol = fields
        .get("symbol")
        .and_then(Value::as_str)
        .ok_or(ValidationError::MissingField("symbol"))?;
    let value = value_fields
        .iter()
        .find_map(|name| fields.get(*name).and_then(as_number))
        .ok_or(ValidationError::MissingField("value"))?;
    let timestamp = fields
        .get("timestamp")
        .and_then(as_timestamp)
        .ok_or(ValidationError::MissingField("timestamp"))?;

    store.append(provider, symbol, value, timestamp)?;
    Ok(())
}

/// Entry object, unwrapping an optional `{"data": {...}}` envelope
fn entry_fields(entry: &Value) -> Option<&Map<String, Value>> {
    let fields = entry.as_object()?;
    match fields.get("data") {
        Some(Value::Object(inner)) => Some(inner),
        _ => Some(fields),
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_timestamp(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.is_finite() && f.fract() == 0.0)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
