//! Subscription monitor: reacts to change signals and fans out notifications.
//!
//! All state (binding table, default-data tracker and both observer
//! registries) lives behind one lock. Each change event runs to completion
//! under that lock, including delivery, so two real changes to the same slot
//! are never coalesced and a registration never replays a half-applied update.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::binding::SlotBindingTable;
use crate::config::MonitorConfig;
use crate::default_data::{DefaultDataChange, DefaultDataTracker};
use crate::error::{Error, LookupError};
use crate::lookup::SubscriptionLookup;
use crate::notify::{NotificationHub, RegistrationId, SharedTarget};
use crate::stats::{MonitorStats, StatsSnapshot};
use crate::types::{RegistryKind, SlotState, SubscriptionId};

/// Owned copy of the monitor's binding state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorSnapshot {
    /// Subscription bound to each slot.
    pub bindings: Vec<SubscriptionId>,
    /// Tracked default-data subscription.
    pub default_data: SubscriptionId,
    /// Slot hosting the default-data subscription.
    pub default_data_slot: Option<usize>,
}

impl MonitorSnapshot {
    /// Whether the tracked default slot agrees with the bindings.
    pub fn is_consistent(&self) -> bool {
        match self.default_data_slot {
            None => true,
            Some(slot) => {
                self.default_data.is_valid() && self.bindings.get(slot) == Some(&self.default_data)
            }
        }
    }
}

struct MonitorState {
    table: SlotBindingTable,
    default_data: DefaultDataTracker,
    hub: NotificationHub,
}

impl MonitorState {
    fn slot_state(&self, slot: usize) -> SlotState {
        SlotState {
            subscription_id: self.table.as_slice()[slot],
            is_default_data: self.default_data.hosts(slot),
            default_data: self.default_data.current_subscription(),
        }
    }

    fn fan_out(
        &mut self,
        kind: RegistryKind,
        slot: usize,
        stats: &MonitorStats,
    ) -> Result<(), Error> {
        let state = self.slot_state(slot);
        let fan_out = self.hub.notify_all(kind, slot, state)?;
        stats.record_fan_out(fan_out);
        Ok(())
    }
}

/// Tracks the subscription bound to each slot and which slot hosts the
/// default-data subscription, notifying per-slot observers on change.
pub struct SubscriptionMonitor {
    lookup: Arc<dyn SubscriptionLookup>,
    slot_count: usize,
    state: Mutex<MonitorState>,
    stats: MonitorStats,
}

impl SubscriptionMonitor {
    /// Create a monitor, reading the initial bindings and default-data
    /// subscription from `lookup`.
    ///
    /// No notifications fire for the initial population.
    pub fn new(config: MonitorConfig, lookup: Arc<dyn SubscriptionLookup>) -> Result<Self, Error> {
        config.validate()?;
        let slot_count = config.slot_count;

        let table = SlotBindingTable::from_bindings(read_bindings(lookup.as_ref(), slot_count)?);
        let default_id = lookup.default_data_subscription()?;

        let default_slot = if default_id.is_valid() {
            match lookup.slot_for_subscription(default_id)? {
                Some(slot) if table.get(slot).ok() == Some(default_id) => Some(slot),
                _ => table.find(default_id),
            }
        } else {
            None
        };

        info!(
            slot_count,
            default_data = %default_id,
            default_data_slot = ?default_slot,
            "subscription monitor initialized"
        );

        Ok(Self {
            lookup,
            slot_count,
            state: Mutex::new(MonitorState {
                table,
                default_data: DefaultDataTracker::with_state(default_id, default_slot),
                hub: NotificationHub::new(slot_count, config.prune_disconnected),
            }),
            stats: MonitorStats::new(),
        })
    }

    /// Number of slots.
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    fn check_slot(&self, slot: usize) -> Result<(), Error> {
        if slot < self.slot_count {
            Ok(())
        } else {
            Err(Error::InvalidSlot {
                slot,
                slot_count: self.slot_count,
            })
        }
    }

    /// Handle "slot bindings may have changed": re-poll every slot and
    /// notify the slots whose binding actually changed.
    ///
    /// Every slot is read before any is applied, so a lookup failure leaves
    /// the state untouched. Returns the slots that changed, in order.
    pub fn on_subscriptions_changed(&self) -> Result<Vec<usize>, Error> {
        self.stats.record_subscription_event();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let fresh = read_bindings(self.lookup.as_ref(), self.slot_count).map_err(|e| {
            self.stats.record_lookup_failure();
            warn!(error = %e, "failed to read slot bindings, keeping previous state");
            e
        })?;

        let mut changed = Vec::new();
        for (slot, new_id) in fresh.into_iter().enumerate() {
            let old_id = state.table.set(slot, new_id)?;
            if old_id == new_id {
                continue;
            }

            debug!(slot, %old_id, %new_id, "slot subscription changed");
            changed.push(slot);
            self.stats.record_slot_change();

            let default_id = state.default_data.current_subscription();
            let touches_default =
                default_id.is_valid() && (new_id == default_id || old_id == default_id);

            if touches_default {
                let before = state.default_data.current_slot();
                if new_id == default_id {
                    // Later slots overwrite earlier ones
                    state.default_data.set_slot(Some(slot));
                } else if state.default_data.hosts(slot) {
                    // Fall back to any other slot still carrying the default
                    let remaining = state.table.find(default_id);
                    state.default_data.set_slot(remaining);
                }
                if state.default_data.current_slot() != before {
                    self.stats.record_default_slot_move();
                    debug!(
                        default_data = %default_id,
                        from = ?before,
                        to = ?state.default_data.current_slot(),
                        "default data slot moved"
                    );
                }
            }

            state.fan_out(RegistryKind::SubscriptionChanged, slot, &self.stats)?;

            // No default-data fan-out while no default is set
            if touches_default {
                state.fan_out(RegistryKind::DefaultDataChanged, slot, &self.stats)?;
            }
        }

        Ok(changed)
    }

    /// Handle "default data subscription changed": re-read the default and,
    /// if its hosting slot moved, notify both the slot that lost it and the
    /// slot that gained it.
    ///
    /// Returns `None` when the default subscription is unchanged.
    pub fn on_default_data_changed(&self) -> Result<Option<DefaultDataChange>, Error> {
        self.stats.record_default_data_event();
        let mut guard = self.state.lock();
        let state = &mut *guard;

        let new_id = self.lookup.default_data_subscription().map_err(|e| {
            self.stats.record_lookup_failure();
            warn!(error = %e, "failed to read default data subscription");
            Error::from(e)
        })?;

        if new_id == state.default_data.current_subscription() {
            return Ok(None);
        }

        let change = state
            .default_data
            .on_default_subscription_changed(new_id, &state.table);

        debug!(
            old_id = %change.old_id,
            new_id = %change.new_id,
            old_slot = ?change.old_slot,
            new_slot = ?change.new_slot,
            "default data subscription changed"
        );

        if change.slot_changed() {
            self.stats.record_default_slot_move();
        }
        for slot in change.affected_slots() {
            state.fan_out(RegistryKind::DefaultDataChanged, slot, &self.stats)?;
        }

        Ok(Some(change))
    }

    fn register(
        &self,
        kind: RegistryKind,
        slot: usize,
        target: SharedTarget,
        what: i32,
        payload: Option<serde_json::Value>,
    ) -> Result<RegistrationId, Error> {
        self.check_slot(slot)?;
        let mut state = self.state.lock();
        let slot_state = state.slot_state(slot);
        let (id, fan_out) = state.hub.register(kind, slot, target, what, payload, slot_state)?;
        self.stats.record_fan_out(fan_out);
        Ok(id)
    }

    fn unregister(
        &self,
        kind: RegistryKind,
        slot: usize,
        target: &SharedTarget,
    ) -> Result<(), Error> {
        self.check_slot(slot)?;
        self.state.lock().hub.unregister(kind, slot, target)?;
        Ok(())
    }

    /// Observe changes to the subscription bound to `slot`.
    ///
    /// The target receives one notification immediately with the current state.
    pub fn register_for_subscription_changed(
        &self,
        slot: usize,
        target: SharedTarget,
        what: i32,
        payload: Option<serde_json::Value>,
    ) -> Result<RegistrationId, Error> {
        self.register(RegistryKind::SubscriptionChanged, slot, target, what, payload)
    }

    /// Stop observing subscription changes on `slot`. Unknown targets are ignored.
    pub fn unregister_for_subscription_changed(
        &self,
        slot: usize,
        target: &SharedTarget,
    ) -> Result<(), Error> {
        self.unregister(RegistryKind::SubscriptionChanged, slot, target)
    }

    /// Observe `slot` gaining or losing the default-data subscription.
    ///
    /// The target receives one notification immediately with the current state.
    pub fn register_for_default_data_changed(
        &self,
        slot: usize,
        target: SharedTarget,
        what: i32,
        payload: Option<serde_json::Value>,
    ) -> Result<RegistrationId, Error> {
        self.register(RegistryKind::DefaultDataChanged, slot, target, what, payload)
    }

    /// Stop observing default-data changes on `slot`. Unknown targets are ignored.
    pub fn unregister_for_default_data_changed(
        &self,
        slot: usize,
        target: &SharedTarget,
    ) -> Result<(), Error> {
        self.unregister(RegistryKind::DefaultDataChanged, slot, target)
    }

    /// Subscription currently bound to `slot`.
    pub fn subscription_for_slot(&self, slot: usize) -> Result<SubscriptionId, Error> {
        self.state.lock().table.get(slot)
    }

    /// Tracked default-data subscription.
    pub fn default_data_subscription(&self) -> SubscriptionId {
        self.state.lock().default_data.current_subscription()
    }

    /// Slot hosting the default-data subscription.
    pub fn default_data_slot(&self) -> Option<usize> {
        self.state.lock().default_data.current_slot()
    }

    /// Consistent copy of bindings and default-data state.
    pub fn snapshot(&self) -> MonitorSnapshot {
        let state = self.state.lock();
        MonitorSnapshot {
            bindings: state.table.as_slice().to_vec(),
            default_data: state.default_data.current_subscription(),
            default_data_slot: state.default_data.current_slot(),
        }
    }

    /// Number of observers registered on `slot` in `kind`.
    pub fn observer_count(&self, kind: RegistryKind, slot: usize) -> Result<usize, Error> {
        self.state.lock().hub.observer_count(kind, slot)
    }

    /// Current counter values.
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }
}

/// Shared monitor handle.
pub type SharedMonitor = Arc<SubscriptionMonitor>;

fn read_bindings(
    lookup: &dyn SubscriptionLookup,
    slot_count: usize,
) -> Result<Vec<SubscriptionId>, LookupError> {
    (0..slot_count)
        .map(|slot| lookup.subscription_for_slot(slot))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::InMemoryLookup;
    use crate::notify::channel_target;

    fn ids(raw: &[i32]) -> Vec<SubscriptionId> {
        raw.iter().copied().map(SubscriptionId::new).collect()
    }

    fn monitor(bindings: &[i32], default_data: i32) -> (Arc<InMemoryLookup>, SubscriptionMonitor) {
        let lookup = Arc::new(InMemoryLookup::with_bindings(
            ids(bindings),
            SubscriptionId::new(default_data),
        ));
        let monitor =
            SubscriptionMonitor::new(MonitorConfig::new(bindings.len()), lookup.clone()).unwrap();
        (lookup, monitor)
    }

    #[test]
    fn test_initial_state_from_lookup() {
        let (_lookup, monitor) = monitor(&[3, 5], 5);
        assert_eq!(monitor.slot_count(), 2);
        assert_eq!(monitor.subscription_for_slot(0).unwrap(), SubscriptionId::new(3));
        assert_eq!(monitor.default_data_subscription(), SubscriptionId::new(5));
        assert_eq!(monitor.default_data_slot(), Some(1));
        assert!(monitor.snapshot().is_consistent());
    }

    #[test]
    fn test_initial_default_unbound() {
        let (_lookup, monitor) = monitor(&[3, 4], -1);
        assert_eq!(monitor.default_data_slot(), None);
    }

    #[test]
    fn test_construction_fails_on_lookup_error() {
        let lookup = Arc::new(InMemoryLookup::new(2));
        lookup.set_available(false);
        let result = SubscriptionMonitor::new(MonitorConfig::new(2), lookup);
        assert!(matches!(result, Err(Error::Lookup(LookupError::Unavailable(_)))));
    }

    #[test]
    fn test_construction_rejects_zero_slots() {
        let lookup = Arc::new(InMemoryLookup::new(0));
        let result = SubscriptionMonitor::new(MonitorConfig::new(0), lookup);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_register_invalid_slot() {
        let (_lookup, monitor) = monitor(&[1, 2], 1);
        let (target, mut rx) = channel_target();

        let err = monitor
            .register_for_subscription_changed(2, target.clone(), 0, None)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSlot { slot: 2, slot_count: 2 }));
        assert!(monitor.unregister_for_default_data_changed(9, &target).is_err());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_replay_reports_current_state() {
        let (_lookup, monitor) = monitor(&[1, 2], 2);
        let (target, mut rx) = channel_target();

        monitor
            .register_for_default_data_changed(1, target, 11, None)
            .unwrap();
        let n = rx.try_recv().unwrap();
        assert_eq!(n.kind, RegistryKind::DefaultDataChanged);
        assert_eq!(n.what, 11);
        assert_eq!(n.subscription_id, SubscriptionId::new(2));
        assert!(n.is_default_data);
    }

    #[test]
    fn test_subscription_change_notifies_only_changed_slot() {
        let (lookup, monitor) = monitor(&[1, 2], -1);
        let (t0, mut rx0) = channel_target();
        let (t1, mut rx1) = channel_target();
        monitor.register_for_subscription_changed(0, t0, 0, None).unwrap();
        monitor.register_for_subscription_changed(1, t1, 0, None).unwrap();
        rx0.try_recv().unwrap();
        rx1.try_recv().unwrap();

        lookup.bind(1, SubscriptionId::new(9)).unwrap();
        assert_eq!(monitor.on_subscriptions_changed().unwrap(), vec![1]);

        assert!(rx0.try_recv().is_err());
        assert_eq!(rx1.try_recv().unwrap().subscription_id, SubscriptionId::new(9));
    }

    #[test]
    fn test_lookup_failure_applies_nothing() {
        let (lookup, monitor) = monitor(&[1, 2], 1);
        lookup.bind(0, SubscriptionId::new(8)).unwrap();
        lookup.set_available(false);

        assert!(monitor.on_subscriptions_changed().is_err());
        assert_eq!(monitor.subscription_for_slot(0).unwrap(), SubscriptionId::new(1));
        assert_eq!(monitor.stats().lookup_failures, 1);

        // Retried on the next signal
        lookup.set_available(true);
        assert_eq!(monitor.on_subscriptions_changed().unwrap(), vec![0]);
        assert_eq!(monitor.default_data_slot(), None);
    }

    #[test]
    fn test_default_unchanged_is_noop() {
        let (_lookup, monitor) = monitor(&[1, 2], 2);
        assert_eq!(monitor.on_default_data_changed().unwrap(), None);
    }

    #[test]
    fn test_default_moves_between_slots() {
        let (lookup, monitor) = monitor(&[1, 2], 1);
        lookup.set_default_data(SubscriptionId::new(2));

        let change = monitor.on_default_data_changed().unwrap().unwrap();
        assert_eq!(change.old_slot, Some(0));
        assert_eq!(change.new_slot, Some(1));
        assert_eq!(monitor.default_data_slot(), Some(1));
        assert_eq!(monitor.stats().default_slot_moves, 1);
    }
}
