//! Request-reply bridge subsystem.
//!
//! # Data Flow
//! ```text
//! RpcBridge::send(request)
//!     → reply.rs     (declare exclusive reply queue, consume)
//!     → correlation.rs (fresh UUID v4)
//!     → publish to work queue {correlation_id, reply_to}
//!     → first of: delivery on reply queue | timeout
//!     → match correlation ID → decode PredictionResponse
//!     → reply.rs     (delete reply queue)
//! ```
//!
//! # Design Decisions
//! - No retry inside the bridge; callers decide
//! - Mismatched correlation ID fails immediately
//! - Reply queue released on every exit path

pub mod correlation;
pub mod error;
pub mod reply;
pub mod rpc;

pub use correlation::CorrelationId;
pub use error::BridgeError;
pub use reply::ReplyChannel;
pub use rpc::RpcBridge;
