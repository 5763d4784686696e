//! Asynchronous notification dispatch
//!
//! Workflow transitions enqueue notifications onto an unbounded channel
//! and a single background task drains it, so delivery latency and
//! channel outages never block a decision. Delivery failures are logged
//! and absorbed.

use async_trait::async_trait;
use org_types::ActorId;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Failure delivering one notification
#[derive(Debug, Error)]
#[error("notification channel failure: {0}")]
pub struct ChannelError(pub String);

/// Transport over which notifications reach actors
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, recipient: &ActorId, message: &str) -> Result<(), ChannelError>;
}

/// One queued notification
#[derive(Clone, Debug)]
pub struct Notification {
    pub recipient: ActorId,
    pub message: String,
}

impl Notification {
    pub fn new(recipient: ActorId, message: impl Into<String>) -> Self {
        Self {
            recipient,
            message: message.into(),
        }
    }
}

/// Handle for enqueueing notifications onto the dispatch task
#[derive(Clone)]
pub struct NotificationDispatcher {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationDispatcher {
    /// Spawn the dispatch task over a channel implementation.
    ///
    /// The task runs until every dispatcher clone is dropped; the
    /// returned handle resolves once the queue has fully drained.
    pub fn spawn(
        channel: std::sync::Arc<dyn NotificationChannel>,
    ) -> (Self, JoinHandle<()>) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Notification>();
        let handle = tokio::spawn(async move {
            while let Some(notification) = rx.recv().await {
                match channel
                    .send(&notification.recipient, &notification.message)
                    .await
                {
                    Ok(()) => {
                        debug!(recipient = %notification.recipient, "notification delivered")
                    }
                    Err(err) => {
                        warn!(
                            recipient = %notification.recipient,
                            error = %err,
                            "notification delivery failed"
                        );
                    }
                }
            }
        });
        (Self { tx }, handle)
    }

    /// Queue a notification for delivery
    pub fn enqueue(&self, notification: Notification) {
        if self.tx.send(notification).is_err() {
            warn!("notification dispatch task is gone, dropping notification");
        }
    }

    /// Queue one message for several recipients
    pub fn enqueue_all(&self, recipients: &[ActorId], message: &str) {
        for recipient in recipients {
            self.enqueue(Notification::new(recipient.clone(), message));
        }
    }
}
