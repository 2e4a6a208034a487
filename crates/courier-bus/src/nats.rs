use std::time::Duration;

use async_nats::ConnectOptions;
use async_nats::jetstream;
use async_nats::jetstream::stream::Config as StreamConfig;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{debug, info};

use crate::{PublishError, Publisher};

/// NATS connection settings with local-development defaults.
#[derive(Debug, Clone)]
pub struct NatsConfig {
    pub url: String,
    /// Bound on establishing the TCP connection.
    pub connection_timeout: Duration,
    /// Bound on each publish awaiting its JetStream ack.
    pub request_timeout: Duration,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
            connection_timeout: Duration::from_secs(5),
            request_timeout: Duration::from_secs(30),
        }
    }
}

/// JetStream-backed [`Publisher`].
///
/// Publishes are acknowledged by the server before `publish` returns, which
/// is what lets the caller treat `Ok` as "the bus has it".
#[derive(Clone)]
pub struct NatsPublisher {
    jetstream: jetstream::Context,
}

impl NatsPublisher {
    /// Connect and make sure a stream covering `channel` exists. Stream
    /// creation is idempotent, so concurrently starting instances are fine.
    pub async fn connect(config: &NatsConfig, channel: &str) -> Result<Self, PublishError> {
        let client = ConnectOptions::new()
            .name("courier")
            .connection_timeout(config.connection_timeout)
            .request_timeout(Some(config.request_timeout))
            .connect(config.url.as_str())
            .await
            .map_err(|e| PublishError::Connect(e.to_string()))?;

        let jetstream = jetstream::new(client);

        jetstream
            .get_or_create_stream(StreamConfig {
                name: stream_name(channel),
                subjects: vec![channel.to_string()],
                ..Default::default()
            })
            .await
            .map_err(|e| PublishError::Stream {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;

        info!(url = %config.url, channel, "connected to NATS, stream ready");

        Ok(Self { jetstream })
    }
}

#[async_trait]
impl Publisher for NatsPublisher {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), PublishError> {
        let ack = self
            .jetstream
            .publish(channel.to_string(), Bytes::copy_from_slice(payload))
            .await
            .map_err(|e| PublishError::Publish {
                channel: channel.to_string(),
                reason: e.to_string(),
            })?;

        // The ack confirms the server stored the message.
        ack.await.map_err(|e| PublishError::Publish {
            channel: channel.to_string(),
            reason: e.to_string(),
        })?;

        debug!(channel, bytes = payload.len(), "message published");
        Ok(())
    }
}

/// JetStream stream names may not contain dots or spaces; channels may.
fn stream_name(channel: &str) -> String {
    channel.replace(['.', ' '], "_").to_uppercase()
}
