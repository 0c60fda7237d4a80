//! Identifiers and notification payloads shared by every component.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical subscription identifier bound to a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubscriptionId(pub i32);

impl SubscriptionId {
    /// Sentinel meaning "no subscription bound".
    pub const INVALID: SubscriptionId = SubscriptionId(-1);

    /// Create a subscription id.
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Whether this id refers to an actual subscription.
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }

    /// Raw integer value.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Default for SubscriptionId {
    fn default() -> Self {
        Self::INVALID
    }
}

impl From<i32> for SubscriptionId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "{}", self.0)
        } else {
            f.write_str("invalid")
        }
    }
}

/// Which per-slot observer registry a notification belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistryKind {
    /// The subscription bound to the slot changed.
    SubscriptionChanged,
    /// The slot gained or lost the default-data subscription.
    DefaultDataChanged,
}

impl RegistryKind {
    /// Both registries, in a fixed order.
    pub const ALL: [RegistryKind; 2] = [
        RegistryKind::SubscriptionChanged,
        RegistryKind::DefaultDataChanged,
    ];
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubscriptionChanged => write!(f, "subscription_changed"),
            Self::DefaultDataChanged => write!(f, "default_data_changed"),
        }
    }
}

/// Slot state captured at the moment a notification is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    /// Subscription currently bound to the slot.
    pub subscription_id: SubscriptionId,
    /// Whether the slot currently hosts the default-data subscription.
    pub is_default_data: bool,
    /// Tracked default-data subscription.
    pub default_data: SubscriptionId,
}

/// A single delivery to an observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    /// Registry that fired.
    pub kind: RegistryKind,
    /// Slot the observer registered for.
    pub slot: usize,
    /// Application-defined tag given at registration.
    pub what: i32,
    /// Application-defined payload given at registration.
    pub payload: Option<serde_json::Value>,
    /// Subscription bound to the slot at delivery time.
    pub subscription_id: SubscriptionId,
    /// Whether the slot hosted the default-data subscription at delivery time.
    pub is_default_data: bool,
    /// Tracked default-data subscription at delivery time.
    pub default_data: SubscriptionId,
}
