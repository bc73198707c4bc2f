//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (PREDICT_CONFIG)
//!     → loader.rs (environment overrides: RABBITMQ_*, RUN_LOCALLY, PREDICT_*)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//!     → handed to startup, bridge and HTTP server at construction
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults so an empty environment is a valid deployment
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::{
    BridgeConfig, BrokerConfig, GatewayConfig, ListenerConfig, LogFormat, ObservabilityConfig,
    RetryConfig, ServiceConfig,
};
pub use validation::ValidationError;
