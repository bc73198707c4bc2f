//! Prediction gateway
//!
//! Accepts digit-classification requests over HTTP and hands them to a pool
//! of prediction workers over RabbitMQ, waiting for each worker's reply.
//!
//! # Architecture Overview
//!
//! ```text
//!                              ┌───────────────────────────────────────────────┐
//!                              │               PREDICTION GATEWAY              │
//!                              │                                               │
//!     POST /predict            │  ┌─────────┐    ┌─────────┐    ┌──────────┐   │
//!     ─────────────────────────┼─▶│  http   │───▶│ bridge  │───▶│  broker  │───┼──▶ work queue
//!                              │  │ server  │    │   rpc   │    │connection│   │    (durable)
//!                              │  └─────────┘    └────┬────┘    └──────────┘   │
//!                              │                      │                        │
//!     JSON reply               │                      ▼                        │
//!     ◀────────────────────────┼────────────── reply queue ◀───────────────────┼─── worker
//!                              │               (exclusive, per request)        │
//!                              │                                               │
//!                              │  ┌─────────────────────────────────────────┐  │
//!                              │  │          Cross-Cutting Concerns         │  │
//!                              │  │  config · observability · resilience    │  │
//!                              │  │  lifecycle (startup / signals / drain)  │  │
//!                              │  └─────────────────────────────────────────┘  │
//!                              └───────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use tokio::net::TcpListener;

use predict_gateway::config::{self, GatewayConfig};
use predict_gateway::lifecycle::{self, signals, Shutdown};
use predict_gateway::observability::{logging, metrics};
use predict_gateway::HttpServer;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match config::load_from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("predict-gateway: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("predict-gateway: failed to initialize logging: {}", e);
        return ExitCode::FAILURE;
    }

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Gateway exited with error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("predict-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        service = %config.service.name,
        bind_address = %config.listener.bind_address,
        broker = %config.broker.redacted_uri(),
        request_queue = %config.broker.request_queue,
        reply_timeout_ms = config.bridge.reply_timeout_ms,
        cors_enabled = config.listener.cors_enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let shutdown = Shutdown::new();
    let mut startup_shutdown = shutdown.subscribe();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown.clone());

    let broker = tokio::select! {
        result = lifecycle::connect_broker(&config) => result?,
        _ = startup_shutdown.recv() => {
            tracing::info!("Shutdown requested before the broker was ready");
            return Ok(());
        }
    };
    drop(startup_shutdown);

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, broker.clone());
    let served = server.run(listener, server_shutdown).await;

    broker.close().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
