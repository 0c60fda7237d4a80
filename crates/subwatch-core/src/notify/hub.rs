//! Per-slot observer registries and fan-out.

use tracing::{debug, trace, warn};

use crate::error::{DeliveryError, Error};
use crate::types::{RegistryKind, SlotState};

use super::registrant::{Registrant, RegistrationId};
use super::target::SharedTarget;

/// Result of one fan-out over a slot's registry list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FanOut {
    /// Observers that accepted the notification.
    pub delivered: usize,
    /// Observers whose delivery failed.
    pub failed: usize,
    /// Disconnected or panicking observers removed after the fan-out.
    pub pruned: usize,
}

fn is_dead(error: DeliveryError) -> bool {
    matches!(error, DeliveryError::Disconnected | DeliveryError::Panicked)
}

/// Two independent registries, each holding an ordered observer list per slot.
///
/// The hub has no lock of its own. The monitor keeps it behind the same lock
/// as the binding state, so a registration always replays a consistent view.
#[derive(Debug)]
pub struct NotificationHub {
    subscription_changed: Vec<Vec<Registrant>>,
    default_data_changed: Vec<Vec<Registrant>>,
    next_registration_id: RegistrationId,
    prune_disconnected: bool,
}

impl NotificationHub {
    /// Create a hub for `slot_count` slots.
    pub fn new(slot_count: usize, prune_disconnected: bool) -> Self {
        Self {
            subscription_changed: (0..slot_count).map(|_| Vec::new()).collect(),
            default_data_changed: (0..slot_count).map(|_| Vec::new()).collect(),
            next_registration_id: 1,
            prune_disconnected,
        }
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.subscription_changed.len()
    }

    fn list(&self, kind: RegistryKind, slot: usize) -> Result<&Vec<Registrant>, Error> {
        let slot_count = self.slot_count();
        let lists = match kind {
            RegistryKind::SubscriptionChanged => &self.subscription_changed,
            RegistryKind::DefaultDataChanged => &self.default_data_changed,
        };
        lists.get(slot).ok_or(Error::InvalidSlot { slot, slot_count })
    }

    fn list_mut(&mut self, kind: RegistryKind, slot: usize) -> Result<&mut Vec<Registrant>, Error> {
        let slot_count = self.slot_count();
        let lists = match kind {
            RegistryKind::SubscriptionChanged => &mut self.subscription_changed,
            RegistryKind::DefaultDataChanged => &mut self.default_data_changed,
        };
        lists.get_mut(slot).ok_or(Error::InvalidSlot { slot, slot_count })
    }

    /// Append an observer to a slot's list and deliver the current state to
    /// it right away.
    ///
    /// A failed replay is logged; the registration itself still succeeds
    /// unless the target is already dead (disconnected or panicking) and
    /// pruning is enabled.
    pub fn register(
        &mut self,
        kind: RegistryKind,
        slot: usize,
        target: SharedTarget,
        what: i32,
        payload: Option<serde_json::Value>,
        state: SlotState,
    ) -> Result<(RegistrationId, FanOut), Error> {
        let prune = self.prune_disconnected;
        let id = self.next_registration_id;
        let list = self.list_mut(kind, slot)?;

        list.push(Registrant::new(id, target, what, payload));
        let mut fan_out = FanOut::default();

        let last = list.len() - 1;
        match list[last].notify(kind, slot, state) {
            Ok(()) => fan_out.delivered = 1,
            Err(e) => {
                fan_out.failed = 1;
                warn!(registration_id = id, %kind, slot, error = %e, "initial notification failed");
                if prune && is_dead(e) {
                    list.pop();
                    fan_out.pruned = 1;
                }
            }
        }

        self.next_registration_id += 1;
        debug!(registration_id = id, %kind, slot, what, "observer registered");

        Ok((id, fan_out))
    }

    /// Remove every entry of `target` from a slot's list.
    ///
    /// Returns the number of entries removed; zero is not an error.
    pub fn unregister(
        &mut self,
        kind: RegistryKind,
        slot: usize,
        target: &SharedTarget,
    ) -> Result<usize, Error> {
        let list = self.list_mut(kind, slot)?;
        let before = list.len();
        list.retain(|entry| !entry.is_for(target));
        let removed = before - list.len();

        if removed > 0 {
            debug!(%kind, slot, removed, "observer unregistered");
        }
        Ok(removed)
    }

    /// Deliver to every observer on a slot's list, in registration order.
    ///
    /// A failing observer never stops delivery to the rest of the list.
    pub fn notify_all(
        &mut self,
        kind: RegistryKind,
        slot: usize,
        state: SlotState,
    ) -> Result<FanOut, Error> {
        let prune = self.prune_disconnected;
        let list = self.list_mut(kind, slot)?;
        let mut fan_out = FanOut::default();
        let mut disconnected = Vec::new();

        for entry in list.iter_mut() {
            match entry.notify(kind, slot, state) {
                Ok(()) => {
                    fan_out.delivered += 1;
                    trace!(registration_id = entry.id, %kind, slot, "notification delivered");
                }
                Err(e) => {
                    fan_out.failed += 1;
                    warn!(
                        registration_id = entry.id,
                        %kind,
                        slot,
                        error = %e,
                        "notification delivery failed"
                    );
                    if is_dead(e) {
                        disconnected.push(entry.id);
                    }
                }
            }
        }

        if prune && !disconnected.is_empty() {
            list.retain(|entry| !disconnected.contains(&entry.id));
            fan_out.pruned = disconnected.len();
            debug!(%kind, slot, pruned = fan_out.pruned, "pruned disconnected observers");
        }

        Ok(fan_out)
    }

    /// Number of observers on a slot's list.
    pub fn observer_count(&self, kind: RegistryKind, slot: usize) -> Result<usize, Error> {
        Ok(self.list(kind, slot)?.len())
    }

    /// Registration IDs on a slot's list, in delivery order.
    pub fn registrations(
        &self,
        kind: RegistryKind,
        slot: usize,
    ) -> Result<Vec<RegistrationId>, Error> {
        Ok(self.list(kind, slot)?.iter().map(|entry| entry.id).collect())
    }

    /// Total observers across both registries.
    pub fn total_observers(&self) -> usize {
        self.subscription_changed
            .iter()
            .chain(self.default_data_changed.iter())
            .map(Vec::len)
            .sum()
    }
}
