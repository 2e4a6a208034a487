pub mod nats;

pub use nats::{NatsConfig, NatsPublisher};

use async_trait::async_trait;
use thiserror::Error;

/// Fire a payload at a named channel on the message bus.
///
/// `publish` resolves only once the bus has acknowledged the message, so a
/// returned `Ok` means the bus holds it. Callers decide what a failure means;
/// this crate never swallows one.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), PublishError>;
}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to connect to message bus: {0}")]
    Connect(String),

    #[error("failed to prepare stream for channel '{channel}': {reason}")]
    Stream { channel: String, reason: String },

    #[error("publish to channel '{channel}' failed: {reason}")]
    Publish { channel: String, reason: String },
}
