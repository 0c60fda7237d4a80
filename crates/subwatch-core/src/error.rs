//! Core error types.

use thiserror::Error;

/// Core monitor errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Slot index outside `[0, slot_count)`.
    #[error("invalid slot index {slot} (slot count {slot_count})")]
    InvalidSlot { slot: usize, slot_count: usize },

    /// The external lookup service failed.
    #[error("lookup error: {0}")]
    Lookup(#[from] LookupError),

    /// Invalid monitor configuration.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Failures reported by a [`SubscriptionLookup`](crate::lookup::SubscriptionLookup).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// The lookup service is temporarily unreachable.
    #[error("lookup service unavailable: {0}")]
    Unavailable(String),

    /// The lookup service does not know the requested slot.
    #[error("unknown slot {0}")]
    UnknownSlot(usize),
}

/// Failures reported by a notification target during delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// The receiving side is gone.
    #[error("notification target disconnected")]
    Disconnected,

    /// The target's queue is full.
    #[error("notification target queue full")]
    Full,

    /// The target panicked while handling the notification.
    #[error("notification target panicked")]
    Panicked,
}
