//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the health and predict handlers
//! - Wire up middleware (request ID, tracing, optional CORS)
//! - Serve on a listener until the shutdown signal fires

use std::sync::Arc;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::Request;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::bridge::RpcBridge;
use crate::broker::MessageBroker;
use crate::config::GatewayConfig;
use crate::http::cors::cors_middleware;
use crate::http::handlers;
use crate::http::request::X_REQUEST_ID;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub broker: Arc<dyn MessageBroker>,
    pub bridge: RpcBridge,
    pub service_name: Arc<str>,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(config: &GatewayConfig, broker: Arc<dyn MessageBroker>) -> Self {
        let bridge = RpcBridge::new(
            Arc::clone(&broker),
            config.broker.request_queue.clone(),
            config.bridge.reply_timeout(),
        );
        Self {
            broker,
            bridge,
            service_name: Arc::from(config.service.name.as_str()),
            max_body_bytes: config.listener.max_body_bytes,
        }
    }
}

/// HTTP front end of the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    pub fn new(config: GatewayConfig, broker: Arc<dyn MessageBroker>) -> Self {
        let state = AppState::new(&config, broker);
        let router = Self::build_router(&config, state);
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(config: &GatewayConfig, state: AppState) -> Router {
        let mut router = Router::new()
            .route(
                "/health",
                get(handlers::health).fallback(handlers::method_not_allowed),
            )
            .route(
                "/predict",
                post(handlers::predict)
                    .fallback(handlers::method_not_allowed)
                    .layer(DefaultBodyLimit::max(config.listener.max_body_bytes)),
            );

        // Only the two endpoints; unknown paths still get the JSON 404.
        if config.listener.cors_enabled {
            router = router.route_layer(middleware::from_fn(cors_middleware));
        }

        let router = router.fallback(handlers::not_found).with_state(state);

        router
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                    let request_id = request
                        .headers()
                        .get(X_REQUEST_ID)
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("unknown");
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = %request_id,
                    )
                }),
            )
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// The fully layered router, for driving the server without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server until `shutdown` fires, then drain in-flight requests.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            service = %self.config.service.name,
            cors = self.config.listener.cors_enabled,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
