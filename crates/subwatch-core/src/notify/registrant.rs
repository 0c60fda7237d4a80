//! Registered observers.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::DeliveryError;
use crate::types::{Notification, RegistryKind, SlotState};

use super::target::{same_target, SharedTarget};

/// Identifier handed out at registration.
pub type RegistrationId = u64;

/// An observer entry in a slot's registry list.
#[derive(Clone)]
pub struct Registrant {
    /// Unique registration ID.
    pub id: RegistrationId,
    /// Where notifications go.
    pub target: SharedTarget,
    /// Application-defined message tag.
    pub what: i32,
    /// Application-defined payload.
    pub payload: Option<serde_json::Value>,
    /// Number of successful deliveries.
    pub delivered: u64,
}

impl Registrant {
    /// Create a new registrant.
    pub fn new(
        id: RegistrationId,
        target: SharedTarget,
        what: i32,
        payload: Option<serde_json::Value>,
    ) -> Self {
        Self {
            id,
            target,
            what,
            payload,
            delivered: 0,
        }
    }

    /// Whether this entry belongs to `target`.
    pub fn is_for(&self, target: &SharedTarget) -> bool {
        same_target(&self.target, target)
    }

    /// Deliver one notification carrying this entry's tag and payload.
    ///
    /// A panic inside the target is caught and reported as
    /// [`DeliveryError::Panicked`].
    pub fn notify(
        &mut self,
        kind: RegistryKind,
        slot: usize,
        state: SlotState,
    ) -> Result<(), DeliveryError> {
        let notification = Notification {
            kind,
            slot,
            what: self.what,
            payload: self.payload.clone(),
            subscription_id: state.subscription_id,
            is_default_data: state.is_default_data,
            default_data: state.default_data,
        };
        let target = &self.target;
        panic::catch_unwind(AssertUnwindSafe(|| target.deliver(notification)))
            .map_err(|_| DeliveryError::Panicked)??;
        self.delivered += 1;
        Ok(())
    }

}

impl fmt::Debug for Registrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registrant")
            .field("id", &self.id)
            .field("what", &self.what)
            .field("payload", &self.payload)
            .field("delivered", &self.delivered)
            .finish_non_exhaustive()
    }
}
