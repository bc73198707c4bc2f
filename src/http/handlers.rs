//! Endpoint handlers.
//!
//! # Responsibilities
//! - `/health`: report whether the broker link is usable
//! - `/predict`: validate, forward through the bridge, relay the reply
//! - Reject unsupported methods and paths with a JSON body

use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::http::request::{body_bytes, decode_prediction, request_id};
use crate::http::response::{ApiError, HealthStatus};
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::prediction::PredictionResponse;

const BROKER_DOWN_DETAILS: &str = "Broker connection is closed or unavailable";
const BRIDGE_FAILED_MESSAGE: &str = "Prediction service failed to respond";

/// `GET /health`
pub async fn health(State(state): State<AppState>) -> Response {
    let start = Instant::now();

    let response = if state.broker.is_live() {
        (StatusCode::OK, Json(HealthStatus::healthy(&state.service_name))).into_response()
    } else {
        tracing::warn!("Health check failed: broker link is down");
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthStatus::unhealthy(&state.service_name, BROKER_DOWN_DETAILS)),
        )
            .into_response()
    };

    metrics::record_request("health", response.status().as_u16(), start);
    response
}

/// `POST /predict`
pub async fn predict(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();
    let request_id = request_id(&headers);

    let response = match handle_predict(&state, body, &request_id).await {
        Ok(prediction) => (StatusCode::OK, Json(prediction)).into_response(),
        Err(e) => {
            tracing::debug!(request_id = %request_id, error = %e, "Prediction request rejected");
            e.into_response()
        }
    };

    metrics::record_request("predict", response.status().as_u16(), start);
    response
}

async fn handle_predict(
    state: &AppState,
    body: Result<Bytes, BytesRejection>,
    request_id: &str,
) -> Result<PredictionResponse, ApiError> {
    let bytes = body_bytes(body, state.max_body_bytes)?;
    let request = decode_prediction(&bytes)?;

    let prediction = state.bridge.send(&request).await.map_err(|e| {
        tracing::warn!(request_id = %request_id, error = %e, "Prediction request failed");
        ApiError::service_unavailable(BRIDGE_FAILED_MESSAGE)
    })?;

    tracing::info!(
        request_id = %request_id,
        digit = prediction.digit,
        "Prediction request processed: predicted digit {}",
        prediction.digit
    );
    Ok(prediction)
}

/// Fallback for a known path with an unsupported method.
pub async fn method_not_allowed() -> ApiError {
    ApiError::method_not_allowed()
}

/// Fallback for unknown paths.
pub async fn not_found() -> ApiError {
    ApiError::not_found()
}
