//! Request-reply over the broker.
//!
//! One call: acquire a reply queue, publish the request to the work queue
//! tagged with a fresh correlation ID and the reply address, then wait for
//! the first delivery or the deadline, whichever comes first.
//!
//! A delivery whose correlation ID does not match fails the call at once.
//! Each reply queue is exclusive to a single request, so a foreign ID means
//! something upstream is broken; waiting on would only hide it.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::bridge::correlation::CorrelationId;
use crate::bridge::error::BridgeError;
use crate::bridge::reply::ReplyChannel;
use crate::broker::{MessageBroker, OutboundMessage, JSON_CONTENT_TYPE};
use crate::observability::metrics;
use crate::prediction::{PredictionRequest, PredictionResponse};

/// Bridges synchronous callers to the asynchronous worker pool.
#[derive(Clone)]
pub struct RpcBridge {
    broker: Arc<dyn MessageBroker>,
    work_queue: String,
    timeout: Duration,
}

impl RpcBridge {
    pub fn new(broker: Arc<dyn MessageBroker>, work_queue: impl Into<String>, timeout: Duration) -> Self {
        Self {
            broker,
            work_queue: work_queue.into(),
            timeout,
        }
    }

    /// Send `request` and wait up to the configured timeout for its reply.
    pub async fn send(&self, request: &PredictionRequest) -> Result<PredictionResponse, BridgeError> {
        self.send_with_timeout(request, self.timeout).await
    }

    /// Send `request` and wait up to `timeout` for its reply.
    ///
    /// The reply queue is released before this returns, whatever the outcome.
    pub async fn send_with_timeout(
        &self,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<PredictionResponse, BridgeError> {
        let start = Instant::now();

        let result = match ReplyChannel::acquire(Arc::clone(&self.broker)).await {
            Ok(mut reply) => {
                let result = self.exchange(&mut reply, request, timeout).await;
                reply.release().await;
                result
            }
            Err(e) => Err(e),
        };

        match &result {
            Ok(_) => metrics::record_bridge_outcome("ok", start),
            Err(e) => {
                metrics::record_bridge_outcome(e.kind(), start);
                tracing::error!(error = %e, kind = e.kind(), "Request-reply exchange failed");
            }
        }
        result
    }

    async fn exchange(
        &self,
        reply: &mut ReplyChannel,
        request: &PredictionRequest,
        timeout: Duration,
    ) -> Result<PredictionResponse, BridgeError> {
        let correlation_id = CorrelationId::new();
        let body = serde_json::to_vec(request).map_err(BridgeError::Serialize)?;

        let message = OutboundMessage {
            body,
            content_type: JSON_CONTENT_TYPE.to_string(),
            correlation_id: correlation_id.to_string(),
            reply_to: reply.address().to_string(),
        };

        self.broker
            .publish(&self.work_queue, message)
            .await
            .map_err(|source| BridgeError::Publish {
                correlation_id: correlation_id.to_string(),
                source,
            })?;

        tracing::info!(
            correlation_id = %correlation_id,
            queue = %self.work_queue,
            reply_to = %reply.address(),
            "Sent request"
        );

        let delivery = match tokio::time::timeout(timeout, reply.next_reply()).await {
            Err(_) => {
                return Err(BridgeError::Timeout {
                    correlation_id: correlation_id.to_string(),
                    timeout,
                })
            }
            Ok(None) => {
                return Err(BridgeError::ReplyChannelClosed {
                    correlation_id: correlation_id.to_string(),
                })
            }
            Ok(Some(Err(source))) => {
                return Err(BridgeError::Receive {
                    correlation_id: correlation_id.to_string(),
                    source,
                })
            }
            Ok(Some(Ok(delivery))) => delivery,
        };

        if !correlation_id.matches(delivery.correlation_id.as_deref()) {
            let received = delivery.correlation_id.unwrap_or_default();
            tracing::warn!(
                expected = %correlation_id,
                received = %received,
                "Received message with mismatched correlation ID"
            );
            return Err(BridgeError::CorrelationMismatch {
                expected: correlation_id.to_string(),
                received,
            });
        }

        let response: PredictionResponse =
            serde_json::from_slice(&delivery.body).map_err(|source| BridgeError::MalformedReply {
                correlation_id: correlation_id.to_string(),
                source,
            })?;

        tracing::info!(correlation_id = %correlation_id, "Received reply");
        Ok(response)
    }
}
