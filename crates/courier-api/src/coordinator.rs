use std::sync::Arc;

use tracing::{error, info, warn};

use courier_bus::Publisher;
use courier_db::Store;
use courier_types::models::InboundMessage;

/// What the handler should tell the client about one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestResult {
    /// The insert succeeded. The publish outcome does not matter here.
    Accepted,
    /// The insert failed at runtime.
    StoreFailure,
    /// No store was configured at startup, so nothing could be persisted.
    StoreUnconfigured,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PublishOutcome {
    Ok,
    Failed,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PersistOutcome {
    Ok,
    Failed,
    Unavailable,
}

/// The two independent write outcomes for one request. Request-scoped only.
#[derive(Debug, Clone, Copy)]
struct WriteOutcome {
    publish: PublishOutcome,
    persist: PersistOutcome,
}

impl WriteOutcome {
    /// True when neither system ended up holding the message. There is no
    /// compensating action for this; it is logged so the loss is visible.
    fn lost_message(self) -> bool {
        self.publish != PublishOutcome::Ok && self.persist != PersistOutcome::Ok
    }

    fn into_result(self) -> RequestResult {
        match self.persist {
            PersistOutcome::Ok => RequestResult::Accepted,
            PersistOutcome::Failed => RequestResult::StoreFailure,
            PersistOutcome::Unavailable => RequestResult::StoreUnconfigured,
        }
    }
}

/// Issues the two downstream writes for each inbound message and decides the
/// overall result.
///
/// The writes are best-effort and non-atomic: the publish is attempted first
/// and its failure is absorbed, then the insert decides the request. Neither
/// write is retried here.
///
/// Both collaborators are injected at construction. An absent one was not
/// configured at startup; the coordinator degrades per write rather than
/// refusing to run.
pub struct DualWriteCoordinator {
    publisher: Option<Arc<dyn Publisher>>,
    store: Option<Arc<dyn Store>>,
    channel: String,
}

impl DualWriteCoordinator {
    pub fn new(
        publisher: Option<Arc<dyn Publisher>>,
        store: Option<Arc<dyn Store>>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            store,
            channel: channel.into(),
        }
    }

    /// Publish, then persist, then map the pair of outcomes.
    ///
    /// The caller has already validated `message`, so `content` is non-empty
    /// here. The persist never starts before the publish attempt has fully
    /// resolved.
    pub async fn process(&self, message: &InboundMessage) -> RequestResult {
        let publish = self.attempt_publish(message).await;
        let persist = self.attempt_persist(message).await;

        let outcome = WriteOutcome { publish, persist };
        if outcome.lost_message() {
            error!(
                content_len = message.content.len(),
                ?outcome,
                "message lost: neither bus nor store accepted it"
            );
        }

        outcome.into_result()
    }

    async fn attempt_publish(&self, message: &InboundMessage) -> PublishOutcome {
        let Some(publisher) = &self.publisher else {
            warn!("publisher not available, skipping publish");
            return PublishOutcome::Skipped;
        };

        match publisher
            .publish(&self.channel, message.content.as_bytes())
            .await
        {
            Ok(()) => {
                info!(channel = %self.channel, "message published");
                PublishOutcome::Ok
            }
            Err(err) => {
                // Non-fatal: the request continues to the insert regardless.
                warn!(channel = %self.channel, %err, "publish failed, continuing to persist");
                PublishOutcome::Failed
            }
        }
    }

    async fn attempt_persist(&self, message: &InboundMessage) -> PersistOutcome {
        let Some(store) = &self.store else {
            error!("store not available, skipping insert");
            return PersistOutcome::Unavailable;
        };

        match store.insert(&message.content).await {
            Ok(record) => {
                info!(id = record.id, "message inserted into database");
                PersistOutcome::Ok
            }
            Err(err) => {
                error!(%err, "failed to insert message into database");
                PersistOutcome::Failed
            }
        }
    }
}
