//! Tracking of the default-data subscription and the slot hosting it.

use crate::binding::SlotBindingTable;
use crate::types::SubscriptionId;

/// Outcome of replacing the tracked default-data subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDataChange {
    pub old_id: SubscriptionId,
    pub old_slot: Option<usize>,
    pub new_id: SubscriptionId,
    pub new_slot: Option<usize>,
}

impl DefaultDataChange {
    /// Whether the hosting slot moved.
    pub fn slot_changed(&self) -> bool {
        self.old_slot != self.new_slot
    }

    /// Slots that must be told about the move: the one that lost default
    /// data first, then the one that gained it.
    pub fn affected_slots(&self) -> impl Iterator<Item = usize> {
        let moved = self.slot_changed();
        self.old_slot
            .into_iter()
            .chain(self.new_slot)
            .filter(move |_| moved)
    }
}

/// The tracked default-data subscription and its hosting slot.
///
/// `slot` is `None` whenever no slot carries the subscription, and always
/// `None` while the subscription itself is the invalid sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultDataTracker {
    subscription_id: SubscriptionId,
    slot: Option<usize>,
}

impl DefaultDataTracker {
    /// Tracker with no default-data subscription.
    pub fn new() -> Self {
        Self {
            subscription_id: SubscriptionId::INVALID,
            slot: None,
        }
    }

    /// Tracker seeded with a known subscription and hosting slot.
    ///
    /// A slot given for the invalid sentinel is dropped.
    pub fn with_state(subscription_id: SubscriptionId, slot: Option<usize>) -> Self {
        Self {
            subscription_id,
            slot: slot.filter(|_| subscription_id.is_valid()),
        }
    }

    /// Tracked default-data subscription.
    pub fn current_subscription(&self) -> SubscriptionId {
        self.subscription_id
    }

    /// Slot currently hosting the default-data subscription.
    pub fn current_slot(&self) -> Option<usize> {
        self.slot
    }

    /// Whether `slot` hosts the default-data subscription.
    pub fn hosts(&self, slot: usize) -> bool {
        self.slot == Some(slot)
    }

    /// Record `slot` as the hosting slot.
    pub fn set_slot(&mut self, slot: Option<usize>) {
        self.slot = slot.filter(|_| self.subscription_id.is_valid());
    }

    /// Replace the tracked subscription and resolve its hosting slot from
    /// `table` (lowest matching slot).
    pub fn on_default_subscription_changed(
        &mut self,
        new_id: SubscriptionId,
        table: &SlotBindingTable,
    ) -> DefaultDataChange {
        let old_id = self.subscription_id;
        let old_slot = self.slot;

        // find() short-circuits on the invalid sentinel
        let new_slot = table.find(new_id);

        self.subscription_id = new_id;
        self.slot = new_slot;

        DefaultDataChange {
            old_id,
            old_slot,
            new_id,
            new_slot,
        }
    }
}

impl Default for DefaultDataTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(raw: &[i32]) -> SlotBindingTable {
        SlotBindingTable::from_bindings(raw.iter().copied().map(SubscriptionId::new).collect())
    }

    #[test]
    fn test_resolves_lowest_matching_slot() {
        let mut tracker = DefaultDataTracker::new();
        let change =
            tracker.on_default_subscription_changed(SubscriptionId::new(7), &table(&[5, 7, 5, 7]));

        assert_eq!(change.old_id, SubscriptionId::INVALID);
        assert_eq!(change.old_slot, None);
        assert_eq!(change.new_slot, Some(1));
        assert_eq!(tracker.current_slot(), Some(1));
        assert_eq!(change.affected_slots().collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_unbound_subscription_has_no_slot() {
        let mut tracker = DefaultDataTracker::with_state(SubscriptionId::new(5), Some(0));
        let change =
            tracker.on_default_subscription_changed(SubscriptionId::new(9), &table(&[5, 7]));

        assert_eq!(change.new_slot, None);
        assert_eq!(change.affected_slots().collect::<Vec<_>>(), vec![0]);
        assert_eq!(tracker.current_subscription(), SubscriptionId::new(9));
    }

    #[test]
    fn test_invalid_default_never_matches_unbound_slot() {
        // Slot 1 is unbound, which must not be mistaken for a host
        let mut tracker = DefaultDataTracker::with_state(SubscriptionId::new(5), Some(0));
        let change =
            tracker.on_default_subscription_changed(SubscriptionId::INVALID, &table(&[5, -1]));

        assert_eq!(change.new_slot, None);
        assert_eq!(tracker.current_slot(), None);
    }

    #[test]
    fn test_move_between_slots_notifies_both() {
        let mut tracker = DefaultDataTracker::with_state(SubscriptionId::new(5), Some(0));
        let change =
            tracker.on_default_subscription_changed(SubscriptionId::new(7), &table(&[5, 7]));

        assert!(change.slot_changed());
        assert_eq!(change.affected_slots().collect::<Vec<_>>(), vec![0, 1]);
    }

    #[test]
    fn test_same_slot_notifies_nobody() {
        let mut tracker = DefaultDataTracker::with_state(SubscriptionId::new(5), None);
        let change =
            tracker.on_default_subscription_changed(SubscriptionId::new(6), &table(&[1, 2]));

        assert!(!change.slot_changed());
        assert_eq!(change.affected_slots().count(), 0);
    }

    #[test]
    fn test_slot_dropped_for_invalid_subscription() {
        let mut tracker = DefaultDataTracker::with_state(SubscriptionId::INVALID, Some(2));
        assert_eq!(tracker.current_slot(), None);
        tracker.set_slot(Some(1));
        assert_eq!(tracker.current_slot(), None);
    }
}
