//! Bridge error definitions.

use std::time::Duration;
use thiserror::Error;

use crate::broker::BrokerError;

/// Errors from a single request-reply exchange.
///
/// Every variant is reported to HTTP callers as service unavailable; the
/// variants exist so logs and metrics can tell the causes apart.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Failed to declare reply queue: {0}")]
    ReplyQueue(#[source] BrokerError),

    #[error("Failed to consume from reply queue: {0}")]
    Consume(#[source] BrokerError),

    #[error("Failed to serialize request: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Failed to publish request {correlation_id}: {source}")]
    Publish {
        correlation_id: String,
        #[source]
        source: BrokerError,
    },

    #[error("No reply for request {correlation_id} within {timeout:?}")]
    Timeout {
        correlation_id: String,
        timeout: Duration,
    },

    #[error("Failed to receive reply for request {correlation_id}: {source}")]
    Receive {
        correlation_id: String,
        #[source]
        source: BrokerError,
    },

    #[error("Reply correlation mismatch: expected {expected}, got {received}")]
    CorrelationMismatch { expected: String, received: String },

    #[error("Malformed reply for request {correlation_id}: {source}")]
    MalformedReply {
        correlation_id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Reply queue closed before a reply arrived for {correlation_id}")]
    ReplyChannelClosed { correlation_id: String },
}

impl BridgeError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            BridgeError::ReplyQueue(_) => "reply_queue",
            BridgeError::Consume(_) => "consume",
            BridgeError::Serialize(_) => "serialize",
            BridgeError::Publish { .. } => "publish",
            BridgeError::Timeout { .. } => "timeout",
            BridgeError::Receive { .. } => "receive",
            BridgeError::CorrelationMismatch { .. } => "correlation_mismatch",
            BridgeError::MalformedReply { .. } => "malformed_reply",
            BridgeError::ReplyChannelClosed { .. } => "reply_closed",
        }
    }

    /// Timeouts and correlation mismatches both mean no usable reply arrived.
    pub fn is_timeout_equivalent(&self) -> bool {
        matches!(
            self,
            BridgeError::Timeout { .. } | BridgeError::CorrelationMismatch { .. }
        )
    }
}
