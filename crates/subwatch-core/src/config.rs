//! Monitor configuration.

use crate::error::Error;

/// Default number of slots (dual-slot device).
pub const DEFAULT_SLOT_COUNT: usize = 2;

/// Configuration for a [`SubscriptionMonitor`](crate::monitor::SubscriptionMonitor).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MonitorConfig {
    /// Number of physical slots. Fixed for the monitor's lifetime.
    pub slot_count: usize,

    /// Drop observers whose target reports a disconnect during delivery.
    pub prune_disconnected: bool,
}

impl MonitorConfig {
    /// Create a configuration for `slot_count` slots.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            prune_disconnected: true,
        }
    }

    /// Set whether disconnected observers are pruned.
    pub fn with_prune_disconnected(mut self, prune: bool) -> Self {
        self.prune_disconnected = prune;
        self
    }

    /// Check the configuration is usable.
    pub fn validate(&self) -> Result<(), Error> {
        if self.slot_count == 0 {
            return Err(Error::Config("slot count must be at least 1".to_string()));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.slot_count, DEFAULT_SLOT_COUNT);
        assert!(config.prune_disconnected);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_slots_rejected() {
        let config = MonitorConfig::new(0).with_prune_disconnected(false);
        assert!(!config.prune_disconnected);
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }
}
