//! HTTP-to-AMQP prediction gateway library.

pub mod bridge;
pub mod broker;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod prediction;
pub mod resilience;

pub use bridge::{BridgeError, RpcBridge};
pub use broker::{BrokerConnection, MessageBroker};
pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
