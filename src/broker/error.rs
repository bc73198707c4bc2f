//! Broker error definitions.

use thiserror::Error;

use crate::resilience::RetryExhausted;

/// Errors from individual broker operations.
#[derive(Debug, Error)]
pub enum BrokerError {
    /// The AMQP client reported a failure.
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// The connection or channel is no longer open.
    #[error("Broker connection is closed")]
    Closed,

    /// The broker refused the operation.
    #[error("Broker unavailable: {0}")]
    Unavailable(String),
}

/// Errors while establishing the process-wide broker connection.
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Invalid broker URI: {0}")]
    InvalidUri(#[from] url::ParseError),

    #[error("Failed to connect to broker: {0}")]
    Connect(#[from] RetryExhausted<lapin::Error>),

    #[error("Failed to open a channel: {0}")]
    Channel(#[source] lapin::Error),
}

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;
