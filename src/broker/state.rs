//! Broker connection state machine.
//!
//! # States
//! - Disconnected: no usable connection
//! - Connecting: startup retry loop in progress
//! - Connected: connection and primary channel open
//!
//! # State Transitions
//! ```text
//! Disconnected → Connecting: startup begins
//! Connecting → Connected: connection and channel opened
//! Connected → Disconnected: broker-side closure or error callback
//! ```

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

/// Connection state enum.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected = 0,
    Connecting = 1,
    Connected = 2,
}

impl From<u8> for ConnectionState {
    fn from(val: u8) -> Self {
        match val {
            1 => ConnectionState::Connecting,
            2 => ConnectionState::Connected,
            _ => ConnectionState::Disconnected,
        }
    }
}

/// Shared, lock-free holder for the current [`ConnectionState`].
///
/// Cloning yields a handle to the same state, so the AMQP error callback
/// and the health endpoint observe the same value.
#[derive(Debug, Clone)]
pub struct SharedConnectionState(Arc<AtomicU8>);

impl SharedConnectionState {
    pub fn new() -> Self {
        Self(Arc::new(AtomicU8::new(ConnectionState::Disconnected as u8)))
    }

    pub fn get(&self) -> ConnectionState {
        ConnectionState::from(self.0.load(Ordering::Acquire))
    }

    /// Store `state`, returning the previous one.
    pub fn set(&self, state: ConnectionState) -> ConnectionState {
        let previous = ConnectionState::from(self.0.swap(state as u8, Ordering::AcqRel));
        if previous != state {
            tracing::debug!(from = ?previous, to = ?state, "Broker connection state changed");
        }
        previous
    }

    pub fn is_connected(&self) -> bool {
        self.get() == ConnectionState::Connected
    }
}

impl Default for SharedConnectionState {
    fn default() -> Self {
        Self::new()
    }
}
