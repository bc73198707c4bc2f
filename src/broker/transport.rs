//! The seam between the request-reply bridge and a concrete broker.
//!
//! [`MessageBroker`] covers exactly the operations the bridge and the health
//! endpoint need. The AMQP implementation lives in `connection.rs`; tests
//! substitute an in-memory broker.

use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::broker::error::BrokerResult;

/// Content type attached to every published request.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// A request about to be published to the work queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub body: Vec<u8>,
    pub content_type: String,
    pub correlation_id: String,
    /// Queue the worker should publish its reply to.
    pub reply_to: String,
}

/// A message delivered to a reply queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyMessage {
    pub correlation_id: Option<String>,
    pub body: Vec<u8>,
}

/// Deliveries from a reply queue consumer, auto-acknowledged.
pub type ReplyStream = BoxStream<'static, BrokerResult<ReplyMessage>>;

/// Broker operations used by the gateway.
///
/// Implementations must be safe to call concurrently from many request
/// tasks sharing one instance.
#[async_trait]
pub trait MessageBroker: Send + Sync + 'static {
    /// Declare an exclusive, auto-deleting, server-named queue and return its name.
    async fn declare_reply_queue(&self) -> BrokerResult<String>;

    /// Start an auto-acknowledging consumer on `queue`.
    async fn consume(&self, queue: &str) -> BrokerResult<ReplyStream>;

    /// Publish `message` through the default exchange with `routing_key`.
    async fn publish(&self, routing_key: &str, message: OutboundMessage) -> BrokerResult<()>;

    /// Delete `queue` regardless of consumers or pending messages.
    async fn delete_queue(&self, queue: &str) -> BrokerResult<()>;

    /// Cheap, non-blocking liveness check.
    fn is_live(&self) -> bool;
}
