//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Startup connection to the broker:
//!     → retry.rs (fixed interval, optional attempt cap)
//!
//! Per-request bridge call:
//!     → bounded by the reply timeout in bridge::rpc
//!     → never retried inside the gateway; callers own retry policy
//! ```

pub mod retry;

pub use retry::{RetryExhausted, RetryPolicy};
