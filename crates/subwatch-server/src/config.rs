//! Server configuration.

use std::path::PathBuf;

use clap::Parser;
use subwatch_core::MonitorConfig;

/// Default number of physical slots.
pub const DEFAULT_SLOT_COUNT: usize = subwatch_core::config::DEFAULT_SLOT_COUNT;

/// Default capacity of the change-signal queue.
pub const DEFAULT_SIGNAL_BUFFER: usize = 64;

/// Subwatch process configuration.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    /// Number of physical slots.
    pub slot_count: usize,

    /// JSON file with the initial bindings. None starts with every slot unbound.
    pub bindings_path: Option<PathBuf>,

    /// Capacity of the change-signal queue.
    pub signal_buffer: usize,

    /// Drop observers whose delivery channel is gone.
    pub prune_disconnected: bool,
}

impl WatchConfig {
    /// Create a configuration for `slot_count` slots.
    pub fn new(slot_count: usize) -> Self {
        Self {
            slot_count,
            bindings_path: None,
            signal_buffer: DEFAULT_SIGNAL_BUFFER,
            prune_disconnected: true,
        }
    }

    /// Set the bindings file.
    pub fn with_bindings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.bindings_path = Some(path.into());
        self
    }

    /// Set the signal queue capacity.
    pub fn with_signal_buffer(mut self, buffer: usize) -> Self {
        self.signal_buffer = buffer.max(1);
        self
    }

    /// Keep observers even after their delivery channel closes.
    pub fn keep_disconnected(mut self) -> Self {
        self.prune_disconnected = false;
        self
    }

    /// Monitor configuration derived from this configuration.
    pub fn monitor_config(&self) -> MonitorConfig {
        MonitorConfig::new(self.slot_count).with_prune_disconnected(self.prune_disconnected)
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self::new(DEFAULT_SLOT_COUNT)
    }
}

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "subwatch")]
#[command(version, about = "Per-slot subscription monitor", long_about = None)]
pub struct Args {
    /// Number of physical slots.
    #[arg(short, long, default_value_t = DEFAULT_SLOT_COUNT)]
    pub slots: usize,

    /// JSON file with the initial slot bindings and default-data subscription.
    #[arg(short, long)]
    pub bindings: Option<PathBuf>,

    /// Capacity of the change-signal queue.
    #[arg(long, default_value_t = DEFAULT_SIGNAL_BUFFER)]
    pub signal_buffer: usize,

    /// Keep observers whose delivery channel has closed.
    #[arg(long)]
    pub keep_disconnected: bool,
}

impl Args {
    /// Convert command-line arguments to configuration.
    pub fn into_config(self) -> WatchConfig {
        WatchConfig {
            slot_count: self.slots,
            bindings_path: self.bindings,
            signal_buffer: self.signal_buffer.max(1),
            prune_disconnected: !self.keep_disconnected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = WatchConfig::default();
        assert_eq!(config.slot_count, DEFAULT_SLOT_COUNT);
        assert!(config.bindings_path.is_none());
        assert_eq!(config.signal_buffer, DEFAULT_SIGNAL_BUFFER);
        assert!(config.prune_disconnected);
    }

    #[test]
    fn test_config_builder() {
        let config = WatchConfig::new(4)
            .with_bindings_path("/etc/subwatch/bindings.json")
            .with_signal_buffer(0)
            .keep_disconnected();

        assert_eq!(config.slot_count, 4);
        assert_eq!(
            config.bindings_path,
            Some(PathBuf::from("/etc/subwatch/bindings.json"))
        );
        assert_eq!(config.signal_buffer, 1);

        let monitor = config.monitor_config();
        assert_eq!(monitor.slot_count, 4);
        assert!(!monitor.prune_disconnected);
    }

    #[test]
    fn test_args_into_config() {
        let args = Args::parse_from(["subwatch", "--slots", "3", "--keep-disconnected"]);
        let config = args.into_config();
        assert_eq!(config.slot_count, 3);
        assert!(!config.prune_disconnected);
        assert!(config.bindings_path.is_none());
    }
}
