//! Monitor counters.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::notify::FanOut;

/// Running counters kept by the monitor.
#[derive(Debug, Default)]
pub struct MonitorStats {
    subscription_events: AtomicU64,
    default_data_events: AtomicU64,
    slot_changes: AtomicU64,
    default_slot_moves: AtomicU64,
    notifications_delivered: AtomicU64,
    delivery_failures: AtomicU64,
    observers_pruned: AtomicU64,
    lookup_failures: AtomicU64,
}

/// Point-in-time copy of [`MonitorStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub subscription_events: u64,
    pub default_data_events: u64,
    pub slot_changes: u64,
    pub default_slot_moves: u64,
    pub notifications_delivered: u64,
    pub delivery_failures: u64,
    pub observers_pruned: u64,
    pub lookup_failures: u64,
}

impl MonitorStats {
    /// Create zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_subscription_event(&self) {
        self.subscription_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_default_data_event(&self) {
        self.default_data_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_slot_change(&self) {
        self.slot_changes.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_default_slot_move(&self) {
        self.default_slot_moves.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup_failure(&self) {
        self.lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fan_out(&self, fan_out: FanOut) {
        self.notifications_delivered
            .fetch_add(fan_out.delivered as u64, Ordering::Relaxed);
        self.delivery_failures
            .fetch_add(fan_out.failed as u64, Ordering::Relaxed);
        self.observers_pruned
            .fetch_add(fan_out.pruned as u64, Ordering::Relaxed);
    }

    /// Copy the current counter values.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            subscription_events: self.subscription_events.load(Ordering::Relaxed),
            default_data_events: self.default_data_events.load(Ordering::Relaxed),
            slot_changes: self.slot_changes.load(Ordering::Relaxed),
            default_slot_moves: self.default_slot_moves.load(Ordering::Relaxed),
            notifications_delivered: self.notifications_delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            observers_pruned: self.observers_pruned.load(Ordering::Relaxed),
            lookup_failures: self.lookup_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_fan_out() {
        let stats = MonitorStats::new();
        stats.record_fan_out(FanOut {
            delivered: 3,
            failed: 1,
            pruned: 1,
        });
        stats.record_slot_change();

        let snap = stats.snapshot();
        assert_eq!(snap.notifications_delivered, 3);
        assert_eq!(snap.delivery_failures, 1);
        assert_eq!(snap.observers_pruned, 1);
        assert_eq!(snap.slot_changes, 1);
        assert_eq!(snap.lookup_failures, 0);
    }
}
