//! Infrastructure layer - collaborator adapters and transport

pub mod publisher;
pub mod signal_counter;
pub mod transport;

pub use publisher::{BroadcastEventPublisher, JsonLinesSink, PublishedEvent};
pub use signal_counter::InMemorySignalCounter;
pub use transport::{InboundChannel, InboundMessage, JsonLinesSource};
