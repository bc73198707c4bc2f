//! Configuration loading from disk and environment.
//!
//! Precedence, lowest to highest: built-in defaults, the optional TOML file
//! named by `PREDICT_CONFIG`, then individual environment variables.
//! Empty environment values count as unset.

use std::fs;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Path of an optional TOML file with the base configuration.
pub const CONFIG_PATH_ENV: &str = "PREDICT_CONFIG";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {key}: {reason}")]
    Env {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: GatewayConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Load configuration from the process environment.
pub fn load_from_env() -> Result<GatewayConfig, ConfigError> {
    load_with(|key| std::env::var(key).ok())
}

/// Load configuration using `lookup` as the environment.
pub fn load_with<F>(lookup: F) -> Result<GatewayConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let lookup = |key: &str| lookup(key).filter(|v| !v.is_empty());

    let mut config = match lookup(CONFIG_PATH_ENV) {
        Some(path) => {
            let content = fs::read_to_string(&path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env(&mut config, lookup)?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment variables onto `config`.
pub fn apply_env<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("RABBITMQ_USER") {
        config.broker.user = v;
    }
    if let Some(v) = lookup("RABBITMQ_PASS") {
        config.broker.password = v;
    }
    if let Some(v) = lookup("RABBITMQ_HOST") {
        config.broker.host = v;
    }
    if let Some(v) = lookup("RABBITMQ_PORT") {
        config.broker.port = parse_value("RABBITMQ_PORT", v)?;
    }
    if let Some(v) = lookup("RABBITMQ_VHOST") {
        config.broker.vhost = v;
    }
    if let Some(v) = lookup("RUN_LOCALLY") {
        // Unparsable values keep the current setting.
        if let Some(enabled) = parse_bool(&v) {
            config.listener.cors_enabled = enabled;
        }
    }
    if let Some(v) = lookup("PREDICT_BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    if let Some(v) = lookup("PREDICT_SERVICE_NAME") {
        config.service.name = v;
    }
    if let Some(v) = lookup("PREDICT_REQUEST_QUEUE") {
        config.broker.request_queue = v;
    }
    if let Some(v) = lookup("PREDICT_REPLY_TIMEOUT_MS") {
        config.bridge.reply_timeout_ms = parse_value("PREDICT_REPLY_TIMEOUT_MS", v)?;
    }
    if let Some(v) = lookup("PREDICT_RETRY_INTERVAL_MS") {
        config.retry.interval_ms = parse_value("PREDICT_RETRY_INTERVAL_MS", v)?;
    }
    if let Some(v) = lookup("PREDICT_RETRY_MAX_ATTEMPTS") {
        config.retry.max_attempts = Some(parse_value("PREDICT_RETRY_MAX_ATTEMPTS", v)?);
    }
    if let Some(v) = lookup("PREDICT_LOG_LEVEL") {
        config.observability.log_level = v;
    }
    if let Some(v) = lookup("PREDICT_LOG_FORMAT") {
        config.observability.log_format = parse_value("PREDICT_LOG_FORMAT", v)?;
    }
    if let Some(v) = lookup("PREDICT_METRICS_ENABLED") {
        config.observability.metrics_enabled = parse_bool(&v).ok_or_else(|| ConfigError::Env {
            key: "PREDICT_METRICS_ENABLED",
            value: v.clone(),
            reason: "expected a boolean".to_string(),
        })?;
    }
    if let Some(v) = lookup("PREDICT_METRICS_ADDRESS") {
        config.observability.metrics_address = v;
    }
    Ok(())
}

fn parse_value<T>(key: &'static str, value: String) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let parsed = value.trim().parse::<T>();
    parsed.map_err(|e| ConfigError::Env {
        key,
        reason: e.to_string(),
        value,
    })
}

/// Accepts the usual boolean spellings: 1/0, t/f, true/false in any case.
pub fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "t" | "true" => Some(true),
        "0" | "f" | "false" => Some(false),
        _ => None,
    }
}
