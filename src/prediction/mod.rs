//! Prediction payloads.
//!
//! `types.rs` holds the request/reply envelopes carried over HTTP and the
//! broker; `pixels.rs` turns a 28x28 PNG into a request vector for
//! the companion client.

pub mod pixels;
pub mod types;

pub use types::{
    InvalidImage, PredictionRequest, PredictionResponse, RawPredictionRequest, CLASS_COUNT,
    IMAGE_SIZE,
};
