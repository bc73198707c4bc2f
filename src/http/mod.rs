//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, trace span, CORS when enabled)
//!     → handlers.rs (method check, endpoint logic)
//!     → request.rs (bounded body read, decode, validate)
//!     → bridge::RpcBridge (publish, await reply)
//!     → response.rs (JSON success or JSON error body)
//!     → Send to client
//! ```

pub mod cors;
pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use request::X_REQUEST_ID;
pub use response::{ApiError, HealthStatus};
pub use server::{AppState, HttpServer};
