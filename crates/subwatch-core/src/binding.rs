//! Slot-to-subscription binding table.

use crate::error::Error;
use crate::types::SubscriptionId;

/// Fixed-size table of the subscription bound to each slot.
///
/// The table is sized once at construction and never resized. It carries no
/// locking of its own; the monitor owns it behind its state lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotBindingTable {
    bindings: Vec<SubscriptionId>,
}

impl SlotBindingTable {
    /// Create a table with every slot unbound.
    pub fn new(slot_count: usize) -> Self {
        Self {
            bindings: vec![SubscriptionId::INVALID; slot_count],
        }
    }

    /// Create a table from an initial set of bindings.
    pub fn from_bindings(bindings: Vec<SubscriptionId>) -> Self {
        Self { bindings }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Whether the table has no slots.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Check that `slot` is in range.
    pub fn check_slot(&self, slot: usize) -> Result<(), Error> {
        if slot < self.bindings.len() {
            Ok(())
        } else {
            Err(Error::InvalidSlot {
                slot,
                slot_count: self.bindings.len(),
            })
        }
    }

    /// Subscription bound to `slot`.
    pub fn get(&self, slot: usize) -> Result<SubscriptionId, Error> {
        self.check_slot(slot)?;
        Ok(self.bindings[slot])
    }

    /// Bind `subscription_id` to `slot`, returning the previous binding.
    pub fn set(
        &mut self,
        slot: usize,
        subscription_id: SubscriptionId,
    ) -> Result<SubscriptionId, Error> {
        self.check_slot(slot)?;
        Ok(std::mem::replace(&mut self.bindings[slot], subscription_id))
    }

    /// Lowest slot bound to `subscription_id`.
    ///
    /// The invalid sentinel never matches: unbound slots are not hosts.
    pub fn find(&self, subscription_id: SubscriptionId) -> Option<usize> {
        if !subscription_id.is_valid() {
            return None;
        }
        self.bindings.iter().position(|&id| id == subscription_id)
    }

    /// Bindings in slot order.
    pub fn as_slice(&self) -> &[SubscriptionId] {
        &self.bindings
    }
}
