//! Subwatch Core - per-slot subscription tracking and change notification.
//!
//! This crate tracks which subscription is bound to each physical slot of a
//! multi-slot device and which slot hosts the default-data subscription,
//! and notifies per-slot observers when either changes.

pub mod binding;
pub mod config;
pub mod default_data;
pub mod error;
pub mod lookup;
pub mod monitor;
pub mod notify;
pub mod stats;
pub mod types;

pub use binding::SlotBindingTable;
pub use config::MonitorConfig;
pub use default_data::{DefaultDataChange, DefaultDataTracker};
pub use error::{DeliveryError, Error, LookupError};
pub use lookup::{InMemoryLookup, SubscriptionLookup};
pub use monitor::{MonitorSnapshot, SharedMonitor, SubscriptionMonitor};
pub use notify::{
    channel_target, FanOut, FnTarget, NotificationHub, NotificationTarget, RegistrationId,
    SharedTarget,
};
pub use stats::{MonitorStats, StatsSnapshot};
pub use types::{Notification, RegistryKind, SlotState, SubscriptionId};
