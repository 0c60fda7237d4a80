//! Source of slot bindings and the default-data choice.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::LookupError;
use crate::types::SubscriptionId;

/// Authoritative source of subscription bindings.
///
/// The monitor calls these synchronously while handling change events and
/// once per slot at construction.
pub trait SubscriptionLookup: Send + Sync {
    /// Subscription currently bound to `slot`.
    fn subscription_for_slot(&self, slot: usize) -> Result<SubscriptionId, LookupError>;

    /// Subscription currently chosen for default data.
    fn default_data_subscription(&self) -> Result<SubscriptionId, LookupError>;

    /// Slot hosting `subscription_id`, if any.
    fn slot_for_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Option<usize>, LookupError>;
}

impl<T: SubscriptionLookup + ?Sized> SubscriptionLookup for Arc<T> {
    fn subscription_for_slot(&self, slot: usize) -> Result<SubscriptionId, LookupError> {
        (**self).subscription_for_slot(slot)
    }

    fn default_data_subscription(&self) -> Result<SubscriptionId, LookupError> {
        (**self).default_data_subscription()
    }

    fn slot_for_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Option<usize>, LookupError> {
        (**self).slot_for_subscription(subscription_id)
    }
}

#[derive(Debug)]
struct LookupState {
    bindings: Vec<SubscriptionId>,
    default_data: SubscriptionId,
}

/// In-memory lookup service.
///
/// Bindings are set directly by the owner. Availability can be toggled to
/// simulate an unreachable service.
#[derive(Debug)]
pub struct InMemoryLookup {
    state: RwLock<LookupState>,
    available: AtomicBool,
}

impl InMemoryLookup {
    /// Lookup with `slot_count` unbound slots and no default.
    pub fn new(slot_count: usize) -> Self {
        Self::with_bindings(vec![SubscriptionId::INVALID; slot_count], SubscriptionId::INVALID)
    }

    /// Lookup seeded with bindings and a default-data subscription.
    pub fn with_bindings(bindings: Vec<SubscriptionId>, default_data: SubscriptionId) -> Self {
        Self {
            state: RwLock::new(LookupState {
                bindings,
                default_data,
            }),
            available: AtomicBool::new(true),
        }
    }

    /// Number of slots known to the lookup.
    pub fn slot_count(&self) -> usize {
        self.state.read().bindings.len()
    }

    /// Bind `subscription_id` to `slot`.
    pub fn bind(&self, slot: usize, subscription_id: SubscriptionId) -> Result<(), LookupError> {
        let mut state = self.state.write();
        let entry = state
            .bindings
            .get_mut(slot)
            .ok_or(LookupError::UnknownSlot(slot))?;
        *entry = subscription_id;
        Ok(())
    }

    /// Clear the binding on `slot`.
    pub fn unbind(&self, slot: usize) -> Result<(), LookupError> {
        self.bind(slot, SubscriptionId::INVALID)
    }

    /// Replace every binding at once.
    pub fn set_bindings(&self, bindings: &[SubscriptionId]) {
        let mut state = self.state.write();
        for (slot, id) in state.bindings.iter_mut().zip(bindings) {
            *slot = *id;
        }
    }

    /// Choose the default-data subscription.
    pub fn set_default_data(&self, subscription_id: SubscriptionId) {
        self.state.write().default_data = subscription_id;
    }

    /// Current bindings in slot order.
    pub fn bindings(&self) -> Vec<SubscriptionId> {
        self.state.read().bindings.clone()
    }

    /// Make every query succeed or fail.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), LookupError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(LookupError::Unavailable("lookup service offline".to_string()))
        }
    }
}

impl SubscriptionLookup for InMemoryLookup {
    fn subscription_for_slot(&self, slot: usize) -> Result<SubscriptionId, LookupError> {
        self.check_available()?;
        self.state
            .read()
            .bindings
            .get(slot)
            .copied()
            .ok_or(LookupError::UnknownSlot(slot))
    }

    fn default_data_subscription(&self) -> Result<SubscriptionId, LookupError> {
        self.check_available()?;
        Ok(self.state.read().default_data)
    }

    fn slot_for_subscription(
        &self,
        subscription_id: SubscriptionId,
    ) -> Result<Option<usize>, LookupError> {
        self.check_available()?;
        if !subscription_id.is_valid() {
            return Ok(None);
        }
        Ok(self
            .state
            .read()
            .bindings
            .iter()
            .position(|&id| id == subscription_id))
    }
}
