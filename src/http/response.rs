//! Response handling.
//!
//! # Responsibilities
//! - Map every failure to a JSON body `{"error": <status text>, "message": <detail>}`
//! - Shape health payloads
//!
//! # Design Decisions
//! - No failure path returns an empty body or a raw protocol error string
//! - Bridge failures all surface as 503; the cause stays in the logs

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// An HTTP error with a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn method_not_allowed() -> Self {
        Self::new(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    }

    pub fn not_found() -> Self {
        Self::new(StatusCode::NOT_FOUND, "No such endpoint")
    }

    pub fn payload_too_large(limit: usize) -> Self {
        Self::new(
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Request body must not exceed {} bytes", limit),
        )
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self
                .status
                .canonical_reason()
                .unwrap_or("Unknown Status")
                .to_string(),
            message: self.message,
        };
        (self.status, Json(body)).into_response()
    }
}

/// Health endpoint payload.
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl HealthStatus {
    pub fn healthy(service: &str) -> Self {
        Self {
            status: "healthy",
            service: service.to_string(),
            details: None,
        }
    }

    pub fn unhealthy(service: &str, details: impl Into<String>) -> Self {
        Self {
            status: "unhealthy",
            service: service.to_string(),
            details: Some(details.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn error_body_uses_status_text() {
        let response = ApiError::service_unavailable("Prediction service failed to respond").into_response();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(
            response.headers()["content-type"],
            "application/json"
        );

        let json = body_json(response).await;
        assert_eq!(json["error"], "Service Unavailable");
        assert_eq!(json["message"], "Prediction service failed to respond");
    }

    #[tokio::test]
    async fn method_not_allowed_has_body() {
        let json = body_json(ApiError::method_not_allowed().into_response()).await;
        assert_eq!(json["error"], "Method Not Allowed");
        assert_eq!(json["message"], "Method not allowed");
    }

    #[test]
    fn healthy_payload_omits_details() {
        let json = serde_json::to_value(HealthStatus::healthy("mnist-predictor")).unwrap();
        assert_eq!(json, serde_json::json!({"status": "healthy", "service": "mnist-predictor"}));

        let json = serde_json::to_value(HealthStatus::unhealthy("mnist-predictor", "down")).unwrap();
        assert_eq!(json["details"], "down");
    }
}
