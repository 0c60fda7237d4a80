//! Observer registries and notification delivery.
//!
//! Observers register per slot in one of two registries. Every registration
//! receives one notification right away, then one per real change.

mod hub;
mod registrant;
mod target;

pub use hub::{FanOut, NotificationHub};
pub use registrant::{Registrant, RegistrationId};
pub use target::{channel_target, same_target, FnTarget, NotificationTarget, SharedTarget};
