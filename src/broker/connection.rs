//! AMQP connection management.
//!
//! # Responsibilities
//! - Establish the process-wide connection, retrying per [`RetryPolicy`]
//! - Open the primary channel shared by every request
//! - Declare the durable work queue
//! - Track liveness for the health endpoint
//! - Implement [`MessageBroker`] on top of the primary channel
//!
//! # Design Decisions
//! - lapin channels are `Send + Sync` and safe for concurrent declare,
//!   consume and publish, so requests share one channel without a lock
//! - No reconnect after a broker-side drop; health reports the loss

use async_trait::async_trait;
use futures_util::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicConsumeOptions, BasicPublishOptions, QueueDeclareOptions, QueueDeleteOptions,
};
use lapin::types::FieldTable;
use lapin::{BasicProperties, Channel, Connection, ConnectionProperties};

use crate::broker::error::{BrokerError, BrokerResult, ConnectError};
use crate::broker::state::{ConnectionState, SharedConnectionState};
use crate::broker::transport::{MessageBroker, OutboundMessage, ReplyMessage, ReplyStream};
use crate::config::BrokerConfig;
use crate::observability::metrics;
use crate::resilience::RetryPolicy;

const REPLY_SUCCESS: u16 = 200;

/// Connection and primary channel to the broker.
pub struct BrokerConnection {
    connection: Connection,
    channel: Channel,
    state: SharedConnectionState,
}

impl BrokerConnection {
    /// Connect to the broker, retrying per `policy`, and open the primary channel.
    ///
    /// With an unbounded policy this only returns once the broker is reachable.
    /// A channel that cannot be opened on a fresh connection is an error.
    pub async fn connect(config: &BrokerConfig, policy: &RetryPolicy) -> Result<Self, ConnectError> {
        let state = SharedConnectionState::new();
        let uri = config.amqp_uri()?;

        state.set(ConnectionState::Connecting);
        tracing::info!(
            uri = %config.redacted_uri(),
            retry_interval = ?policy.interval(),
            max_attempts = ?policy.max_attempts(),
            "Connecting to broker"
        );

        let connected = policy
            .run("broker connect", |_attempt| {
                let uri = uri.clone();
                async move {
                    let outcome = Connection::connect(&uri, ConnectionProperties::default()).await;
                    metrics::record_connect_attempt(outcome.is_ok());
                    outcome
                }
            })
            .await;

        let connection = match connected {
            Ok(connection) => connection,
            Err(e) => {
                state.set(ConnectionState::Disconnected);
                return Err(e.into());
            }
        };
        tracing::info!("Connected to broker");

        let channel = match connection.create_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                if let Err(close_err) = connection.close(REPLY_SUCCESS, "channel open failed").await {
                    tracing::debug!(error = %close_err, "Failed to close connection");
                }
                state.set(ConnectionState::Disconnected);
                return Err(ConnectError::Channel(e));
            }
        };

        let error_state = state.clone();
        connection.on_error(move |err| {
            tracing::error!(error = %err, "Broker connection lost");
            error_state.set(ConnectionState::Disconnected);
            metrics::set_broker_connected(false);
        });

        state.set(ConnectionState::Connected);
        metrics::set_broker_connected(true);

        Ok(Self {
            connection,
            channel,
            state,
        })
    }

    /// Ensure the durable work queue exists. Idempotent.
    pub async fn declare_work_queue(&self, name: &str) -> BrokerResult<()> {
        let queue = self
            .channel
            .queue_declare(
                name,
                QueueDeclareOptions {
                    durable: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        tracing::info!(
            queue = %queue.name().as_str(),
            messages = queue.message_count(),
            consumers = queue.consumer_count(),
            "Declared request queue"
        );
        Ok(())
    }

    fn ensure_open(&self) -> BrokerResult<()> {
        if self.is_live() {
            Ok(())
        } else {
            Err(BrokerError::Closed)
        }
    }

    /// Close the channel and connection.
    pub async fn close(&self) {
        if let Err(e) = self.channel.close(REPLY_SUCCESS, "shutdown").await {
            tracing::debug!(error = %e, "Failed to close channel");
        }
        if let Err(e) = self.connection.close(REPLY_SUCCESS, "shutdown").await {
            tracing::debug!(error = %e, "Failed to close connection");
        }
        self.state.set(ConnectionState::Disconnected);
        metrics::set_broker_connected(false);
        tracing::info!("Broker connection closed");
    }
}

#[async_trait]
impl MessageBroker for BrokerConnection {
    async fn declare_reply_queue(&self) -> BrokerResult<String> {
        self.ensure_open()?;
        let queue = self
            .channel
            .queue_declare(
                "",
                QueueDeclareOptions {
                    durable: false,
                    exclusive: true,
                    auto_delete: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;
        Ok(queue.name().as_str().to_string())
    }

    async fn consume(&self, queue: &str) -> BrokerResult<ReplyStream> {
        let consumer = self
            .channel
            .basic_consume(
                queue,
                &format!("{}-consumer", queue),
                BasicConsumeOptions {
                    no_ack: true,
                    ..Default::default()
                },
                FieldTable::default(),
            )
            .await?;

        Ok(consumer
            .map(|delivery| delivery.map(reply_from_delivery).map_err(BrokerError::from))
            .boxed())
    }

    async fn publish(&self, routing_key: &str, message: OutboundMessage) -> BrokerResult<()> {
        self.ensure_open()?;
        let properties = BasicProperties::default()
            .with_content_type(message.content_type.into())
            .with_correlation_id(message.correlation_id.into())
            .with_reply_to(message.reply_to.into());

        self.channel
            .basic_publish(
                "",
                routing_key,
                BasicPublishOptions::default(),
                &message.body,
                properties,
            )
            .await?
            .await?;
        Ok(())
    }

    async fn delete_queue(&self, queue: &str) -> BrokerResult<()> {
        self.channel
            .queue_delete(queue, QueueDeleteOptions::default())
            .await?;
        Ok(())
    }

    fn is_live(&self) -> bool {
        if !self.state.is_connected() {
            return false;
        }
        let open = self.connection.status().connected() && self.channel.status().connected();
        if !open {
            self.state.set(ConnectionState::Disconnected);
            metrics::set_broker_connected(false);
        }
        open
    }
}

fn reply_from_delivery(delivery: Delivery) -> ReplyMessage {
    ReplyMessage {
        correlation_id: delivery
            .properties
            .correlation_id()
            .as_ref()
            .map(|id| id.as_str().to_string()),
        body: delivery.data,
    }
}
