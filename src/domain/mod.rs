//! Domain layer - market history, windowed analysis and alert events

pub mod analysis;
pub mod events;
pub mod market;
pub mod signals;
