//! Request handling.
//!
//! # Responsibilities
//! - Read the request ID stamped by the request-id layer
//! - Classify body read failures (over the limit vs. unreadable)
//! - Decode and validate the prediction payload before any broker work

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, FailedToBufferBody};
use axum::http::HeaderMap;

use crate::http::response::ApiError;
use crate::prediction::{InvalidImage, PredictionRequest, RawPredictionRequest};

/// Header carrying the per-request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

const INVALID_JSON: &str = "Invalid JSON format";

/// The request ID, or `"unknown"` when absent.
pub fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

/// Map the buffered body, or the reason it could not be buffered.
///
/// Only the body limit yields 413; a broken or aborted body is a 400.
pub fn body_bytes(body: Result<Bytes, BytesRejection>, limit: usize) -> Result<Bytes, ApiError> {
    match body {
        Ok(bytes) => Ok(bytes),
        Err(BytesRejection::FailedToBufferBody(FailedToBufferBody::LengthLimitError(_))) => {
            Err(ApiError::payload_too_large(limit))
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Failed to read request body");
            Err(ApiError::bad_request("Failed to read request body"))
        }
    }
}

/// Decode `{"image": [...]}` and check its values and length.
pub fn decode_prediction(bytes: &[u8]) -> Result<PredictionRequest, ApiError> {
    let raw: RawPredictionRequest = serde_json::from_slice(bytes).map_err(|e| {
        tracing::debug!(error = %e, "Rejected request body");
        ApiError::bad_request(INVALID_JSON)
    })?;
    PredictionRequest::try_from(raw).map_err(|e| match e {
        // Numbers beyond f32 range decode to infinity.
        InvalidImage::NonFinite { index } => {
            tracing::debug!(index, "Rejected out-of-range image value");
            ApiError::bad_request(INVALID_JSON)
        }
        InvalidImage::WrongLength { .. } => ApiError::bad_request(e.to_string()),
    })
}
