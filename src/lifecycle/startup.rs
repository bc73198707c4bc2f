//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect to the broker, retrying per the configured policy
//! - Declare the durable work queue
//! - Hand back a shared connection for the HTTP layer
//!
//! # Design Decisions
//! - Fail fast: any error after the connection is up is fatal
//! - Listeners start last (traffic only when the broker is ready)

use std::sync::Arc;

use thiserror::Error;

use crate::broker::{BrokerConnection, BrokerError, ConnectError};
use crate::config::GatewayConfig;
use crate::resilience::RetryPolicy;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error("Failed to declare queue '{queue}': {source}")]
    DeclareQueue {
        queue: String,
        #[source]
        source: BrokerError,
    },
}

/// Bring up the broker side of the gateway.
pub async fn connect_broker(config: &GatewayConfig) -> Result<Arc<BrokerConnection>, StartupError> {
    let policy = RetryPolicy::from_config(&config.retry);
    let connection = BrokerConnection::connect(&config.broker, &policy).await?;

    let queue = &config.broker.request_queue;
    if let Err(source) = connection.declare_work_queue(queue).await {
        connection.close().await;
        return Err(StartupError::DeclareQueue {
            queue: queue.clone(),
            source,
        });
    }

    tracing::info!(queue = %queue, "Broker ready");
    Ok(Arc::new(connection))
}
