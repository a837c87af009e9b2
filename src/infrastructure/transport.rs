//! Inbound market updates as newline-delimited JSON envelopes

use serde::Deserialize;
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::shared::errors::TransportError;
use crate::shared::types::MetricKind;

pub const PRICE_UPDATE: &str = "PRICE_UPDATE";
pub const OI_UPDATE: &str = "OI_UPDATE";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundChannel {
    PriceUpdate,
    OiUpdate,
}

impl InboundChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            InboundChannel::PriceUpdate => PRICE_UPDATE,
            InboundChannel::OiUpdate => OI_UPDATE,
        }
    }

    /// Store the channel feeds
    pub fn metric(&self) -> MetricKind {
        match self {
            InboundChannel::PriceUpdate => MetricKind::Price,
            InboundChannel::OiUpdate => MetricKind::OpenInterest,
        }
    }
}

impl FromStr for InboundChannel {
    type Err = TransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            PRICE_UPDATE => Ok(InboundChannel::PriceUpdate),
            OI_UPDATE => Ok(InboundChannel::OiUpdate),
            other => Err(TransportError::UnknownChannel(other.to_string())),
        }
    }
}

impl fmt::Display for InboundChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct Envelope {
    channel: String,
    payload: Value,
}

/// Channel plus untyped payload; entries are validated during ingestion
#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub channel: InboundChannel,
    pub payload: Value,
}

impl InboundMessage {
    pub fn parse_line(line: &str) -> Result<Self, TransportError> {
        let envelope: Envelope = serde_json::from_str(line)?;
        Ok(Self {
            channel: envelope.channel.parse()?,
            payload: envelope.payload,
        })
    }
}

/// Reads envelopes line by line and forwards them to the ingestion task
pub struct JsonLinesSource<R> {
    reader: R,
}

impl<R: AsyncBufRead + Unpin> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Runs until EOF or until the receiver is dropped; returns forwarded
    /// messages. Undecodable lines are logged and skipped.
    pub async fn run(self, tx: mpsc::Sender<InboundMessage>) -> Result<u64, TransportError> {
        let mut lines = LinesStream::new(self.reader.lines());
        let mut forwarded = 0;
        let mut line_no = 0u64;

        while let Some(line) = lines.next().await {
            let line = line?;
            line_no += 1;
            if line.trim().is_empty() {
                continue;
            }

            match InboundMessage::parse_line(&line) {
                Ok(message) => {
                    if tx.send(message).await.is_err() {
                        debug!("Inbound receiver dropped, stopping source");
                        break;
                    }
                    forwarded += 1;
                }
                Err(e) => warn!("Skipping inbound line {}: {}", line_no, e),
            }
        }

        info!("Inbound source finished after {} messages", forwarded);
        Ok(forwarded)
    }
}
