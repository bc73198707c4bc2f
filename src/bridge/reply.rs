//! Per-request reply queue lifecycle.
//!
//! # Responsibilities
//! - Declare an exclusive, auto-deleting, server-named reply queue
//! - Attach an auto-acknowledging consumer to it
//! - Delete the queue exactly once when the request is done
//!
//! # Design Decisions
//! - `release().await` on normal exit paths
//! - `Drop` spawns the delete when the owning future is cancelled or
//!   unwinds, so a queue is never left behind by an abandoned request
//! - Delete failures are logged, never surfaced: the request outcome is
//!   already decided and the broker auto-deletes the queue anyway

use futures_util::StreamExt;
use std::sync::Arc;

use crate::bridge::error::BridgeError;
use crate::broker::{BrokerResult, MessageBroker, ReplyMessage, ReplyStream};

/// An exclusive reply queue and its consumer, owned by one request.
pub struct ReplyChannel {
    broker: Arc<dyn MessageBroker>,
    queue: String,
    replies: ReplyStream,
    released: bool,
}

impl ReplyChannel {
    /// Declare a fresh reply queue and start consuming from it.
    pub async fn acquire(broker: Arc<dyn MessageBroker>) -> Result<Self, BridgeError> {
        let queue = broker
            .declare_reply_queue()
            .await
            .map_err(BridgeError::ReplyQueue)?;

        let replies = match broker.consume(&queue).await {
            Ok(replies) => replies,
            Err(e) => {
                delete_queue(broker.as_ref(), &queue).await;
                return Err(BridgeError::Consume(e));
            }
        };

        tracing::trace!(queue = %queue, "Reply queue acquired");
        Ok(Self {
            broker,
            queue,
            replies,
            released: false,
        })
    }

    /// Queue name to put in the request's `reply_to`.
    pub fn address(&self) -> &str {
        &self.queue
    }

    /// Wait for the next delivery. `None` once the consumer has ended.
    pub async fn next_reply(&mut self) -> Option<BrokerResult<ReplyMessage>> {
        self.replies.next().await
    }

    /// Delete the reply queue.
    pub async fn release(mut self) {
        delete_queue(self.broker.as_ref(), &self.queue).await;
        self.released = true;
    }
}

impl Drop for ReplyChannel {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        let broker = Arc::clone(&self.broker);
        let queue = std::mem::take(&mut self.queue);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    delete_queue(broker.as_ref(), &queue).await;
                });
            }
            Err(_) => {
                tracing::warn!(queue = %queue, "No runtime to delete reply queue, leaving it to auto-delete");
            }
        }
    }
}

async fn delete_queue(broker: &dyn MessageBroker, queue: &str) {
    match broker.delete_queue(queue).await {
        Ok(()) => tracing::trace!(queue = %queue, "Reply queue deleted"),
        Err(e) => tracing::warn!(queue = %queue, error = %e, "Failed to delete reply queue"),
    }
}
