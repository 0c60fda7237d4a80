//! Initial bindings file.

use std::path::Path;

use serde::{Deserialize, Serialize};
use subwatch_core::{InMemoryLookup, SubscriptionId};

use crate::error::Error;

/// Contents of a bindings file.
///
/// ```json
/// { "slots": [1, 2], "default_data": 1 }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindingsFile {
    /// Subscription bound to each slot; -1 for unbound.
    pub slots: Vec<SubscriptionId>,
    /// Default-data subscription; -1 or absent for none.
    #[serde(default)]
    pub default_data: SubscriptionId,
}

impl BindingsFile {
    /// Read and parse a bindings file.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Build a lookup for `slot_count` slots, padding missing slots as unbound.
    pub fn into_lookup(self, slot_count: usize) -> Result<InMemoryLookup, Error> {
        if self.slots.len() > slot_count {
            return Err(Error::Config(format!(
                "bindings file lists {} slots but only {} are configured",
                self.slots.len(),
                slot_count
            )));
        }

        let mut slots = self.slots;
        slots.resize(slot_count, SubscriptionId::INVALID);
        Ok(InMemoryLookup::with_bindings(slots, self.default_data))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use subwatch_core::SubscriptionLookup;

    use super::*;

    #[test]
    fn test_load_and_pad() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "slots": [3, 4], "default_data": 4 }}"#).unwrap();

        let bindings = BindingsFile::load(file.path()).unwrap();
        assert_eq!(bindings.default_data, SubscriptionId::new(4));

        let lookup = bindings.into_lookup(3).unwrap();
        assert_eq!(lookup.subscription_for_slot(1).unwrap(), SubscriptionId::new(4));
        assert_eq!(lookup.subscription_for_slot(2).unwrap(), SubscriptionId::INVALID);
        assert_eq!(lookup.default_data_subscription().unwrap(), SubscriptionId::new(4));
    }

    #[test]
    fn test_default_data_optional() {
        let bindings: BindingsFile = serde_json::from_str(r#"{ "slots": [1] }"#).unwrap();
        assert_eq!(bindings.default_data, SubscriptionId::INVALID);
    }

    #[test]
    fn test_too_many_slots() {
        let bindings: BindingsFile = serde_json::from_str(r#"{ "slots": [1, 2, 3] }"#).unwrap();
        assert!(matches!(bindings.into_lookup(2), Err(Error::Config(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = BindingsFile::load(Path::new("/nonexistent/bindings.json"));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
