//! Broker subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     connection.rs (retry until connected, open primary channel)
//!     → declare durable work queue
//!     → state.rs (Connected)
//!
//! Per request (through transport.rs::MessageBroker):
//!     declare exclusive reply queue → consume → publish → delete
//!
//! Broker-side closure:
//!     error callback → state.rs (Disconnected) → health reports 503
//! ```

pub mod connection;
pub mod error;
pub mod state;
pub mod transport;

pub use connection::BrokerConnection;
pub use error::{BrokerError, BrokerResult, ConnectError};
pub use state::{ConnectionState, SharedConnectionState};
pub use transport::{MessageBroker, OutboundMessage, ReplyMessage, ReplyStream, JSON_CONTENT_TYPE};
