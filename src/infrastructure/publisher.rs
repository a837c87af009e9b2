//! Outbound alert fan-out

use async_trait::async_trait;
use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::domain::events::{AlertEvent, EventPayload, EventPublisher};
use crate::shared::errors::{PublishError, TransportError};

/// One alert as it leaves the process
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PublishedEvent {
    pub channel: &'static str,
    pub data: EventPayload,
}

impl From<&AlertEvent> for PublishedEvent {
    fn from(event: &AlertEvent) -> Self {
        Self {
            channel: event.event_type(),
            data: event.to_payload(),
        }
    }
}

/// Publishes alerts on a tokio broadcast channel
#[derive(Clone)]
pub struct BroadcastEventPublisher {
    tx: broadcast::Sender<PublishedEvent>,
}

impl BroadcastEventPublisher {
    pub fn new(buffer_size: usize) -> Self {
        let (tx, _rx) = broadcast::channel(buffer_size.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PublishedEvent> {
        self.tx.subscribe()
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: &AlertEvent) -> Result<(), PublishError> {
        let receivers = self
            .tx
            .send(PublishedEvent::from(event))
            .map_err(|_| PublishError::NoSubscribers(event.event_type()))?;
        debug!(
            "{} {} {} at {} sent to {} receivers",
            event.event_type(),
            event.provider(),
            event.symbol(),
            event.timestamp(),
            receivers
        );
        Ok(())
    }
}

/// Writes every published event as one JSON line
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: AsyncWrite + Unpin> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Drain `rx` until the channel closes; returns lines written
    pub async fn run(
        mut self,
        mut rx: broadcast::Receiver<PublishedEvent>,
    ) -> Result<u64, TransportError> {
        let mut written = 0;

        loop {
            match rx.recv().await {
                Ok(event) => {
                    let mut line = serde_json::to_vec(&event)?;
                    line.push(b'\n');
                    self.writer.write_all(&line).await?;
                    self.writer.flush().await?;
                    written += 1;
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!("Alert sink lagged, skipped {} events", skipped);
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Alert channel closed after {} events", written);
                    break;
                }
            }
        }

        Ok(written)
    }
}
