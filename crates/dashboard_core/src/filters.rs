use std::collections::BTreeMap;

use serde::{Serialize, Serializer};
use serde_json::Value;
use tracing::debug;

#[derive(Debug, Clone, PartialEq)]
pub struct FilterEntry {
    pub value: Value,
    pub label: Option<String>,
}

/// At most one active value per key. Setting the active value again removes it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterStore {
    filters: BTreeMap<String, FilterEntry>,
}

// Labels are display-only; the serialized form is the plain key -> value map.
impl Serialize for FilterStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.toggle(None, key.into(), value.into());
    }

    pub fn filter_labeled(
        &mut self,
        label: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.toggle(Some(label.into()), key.into(), value.into());
    }

    fn toggle(&mut self, label: Option<String>, key: String, value: Value) {
        if self.is_filtered_field(&key, &value) {
            debug!(key = %key, value = %value, "filter removed");
            self.filters.remove(&key);
        } else {
            debug!(key = %key, value = %value, "filter set");
            self.filters.insert(key, FilterEntry { value, label });
        }
    }

    pub fn is_filtered_field(&self, key: &str, value: &Value) -> bool {
        self.filters
            .get(key)
            .is_some_and(|entry| &entry.value == value)
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear();
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.filters.get(key).map(|entry| &entry.value)
    }

    pub fn entry(&self, key: &str) -> Option<&FilterEntry> {
        self.filters.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.filters
            .iter()
            .map(|(key, entry)| (key.as_str(), &entry.value))
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}
