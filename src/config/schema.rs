//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Root configuration for the prediction gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Service identity reported by the health endpoint.
    pub service: ServiceConfig,

    /// Listener configuration (bind address, CORS, body limits).
    pub listener: ListenerConfig,

    /// Broker connection and queue settings.
    pub broker: BrokerConfig,

    /// Request-reply bridge settings.
    pub bridge: BridgeConfig,

    /// Startup connection retry policy.
    pub retry: RetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Service identity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Name reported in health payloads.
    pub name: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "mnist-predictor".to_string(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Add permissive CORS headers and answer OPTIONS directly.
    pub cors_enabled: bool,

    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            cors_enabled: false,
            max_body_bytes: 1024 * 1024,
        }
    }
}

/// Broker connection configuration.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BrokerConfig {
    pub user: String,
    pub password: String,
    pub host: String,
    pub port: u16,

    /// Virtual host. "/" is the broker default.
    pub vhost: String,

    /// Durable work queue that prediction requests are published to.
    pub request_queue: String,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            user: "guest".to_string(),
            password: "guest".to_string(),
            host: "rabbitmq".to_string(),
            port: 5672,
            vhost: "/".to_string(),
            request_queue: "mnist_requests".to_string(),
        }
    }
}

impl BrokerConfig {
    /// Build the AMQP URI with credentials and vhost escaped.
    pub fn amqp_uri(&self) -> Result<String, url::ParseError> {
        Ok(self.build_url(&self.password)?.to_string())
    }

    /// The AMQP URI with the password masked, for logs.
    pub fn redacted_uri(&self) -> String {
        self.build_url("***")
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("amqp://{}:{}", self.host, self.port))
    }

    fn build_url(&self, password: &str) -> Result<Url, url::ParseError> {
        let mut url = Url::parse(&format!("amqp://{}:{}", self.host, self.port))?;
        url.set_username(&self.user)
            .map_err(|_| url::ParseError::EmptyHost)?;
        url.set_password(Some(password))
            .map_err(|_| url::ParseError::EmptyHost)?;
        if self.vhost != "/" && !self.vhost.is_empty() {
            let encoded: String = url::form_urlencoded::byte_serialize(self.vhost.as_bytes()).collect();
            url.set_path(&format!("/{}", encoded));
        }
        Ok(url)
    }
}

impl std::fmt::Debug for BrokerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrokerConfig")
            .field("user", &self.user)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("vhost", &self.vhost)
            .field("request_queue", &self.request_queue)
            .finish()
    }
}

/// Request-reply bridge configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// How long a request waits for its correlated reply, in milliseconds.
    pub reply_timeout_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            reply_timeout_ms: 5000,
        }
    }
}

impl BridgeConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_millis(self.reply_timeout_ms)
    }
}

/// Startup connection retry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Fixed delay between connection attempts in milliseconds.
    pub interval_ms: u64,

    /// Give up after this many attempts. `None` retries forever.
    pub max_attempts: Option<u32>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            interval_ms: 2000,
            max_attempts: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(format!("unknown log format '{}'", other)),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Text for development, JSON for log aggregation.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
