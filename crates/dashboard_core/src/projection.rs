use serde::Serialize;
use serde_json::Value;
use shared::domain::{StorageVolume, UsageRecord, VirtualMachine};

use crate::{
    filters::FilterStore,
    tags::{value_param, TagStore},
};

pub trait Record {
    fn field(&self, key: &str) -> Option<Value>;
}

impl Record for Value {
    fn field(&self, key: &str) -> Option<Value> {
        self.get(key).cloned()
    }
}

fn to_field<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(Value::Null) | Err(_) => None,
        Ok(value) => Some(value),
    }
}

macro_rules! impl_record {
    ($ty:ty { $($key:literal => $field:ident),* $(,)? } $(, extra = $extra:ident)?) => {
        impl Record for $ty {
            fn field(&self, key: &str) -> Option<Value> {
                match key {
                    $($key => to_field(&self.$field),)*
                    _ => None $(.or_else(|| self.$extra.get(key).cloned()))?,
                }
            }
        }
    };
}

impl_record!(VirtualMachine {
    "id" => id,
    "name" => name,
    "state" => state,
    "instance_name" => instance_name,
    "zone_name" => zone_name,
    "zonename" => zone_name,
    "zone_id" => zone_id,
    "host_name" => host_name,
    "host_id" => host_id,
    "service_offering_name" => service_offering_name,
    "service_offering_id" => service_offering_id,
    "ha_enabled" => ha_enabled,
}, extra = extra);

impl_record!(StorageVolume {
    "name" => name,
    "state" => state,
    "size" => size,
    "zone_name" => zone_name,
    "zone_id" => zone_id,
    "created" => created,
    "type" => volume_type,
    "attached" => attached,
}, extra = extra);

impl_record!(UsageRecord {
    "account" => account,
    "domain" => domain,
    "type" => usage_type,
    "usage" => usage,
});

pub fn project<R: Record + Clone>(records: &[R], filters: &FilterStore) -> Vec<R> {
    records
        .iter()
        .filter(|record| {
            filters
                .iter()
                .all(|(key, value)| record.field(key).as_ref() == Some(value))
        })
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListFilter {
    filters: FilterStore,
    tags: TagStore,
}

impl ListFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.filters.filter(key, value);
    }

    pub fn filter_labeled(
        &mut self,
        label: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) {
        self.filters.filter_labeled(label, key, value);
    }

    pub fn is_filtered_field(&self, key: &str, value: impl Into<Value>) -> bool {
        self.filters.is_filtered_field(key, &value.into())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear_filters();
    }

    pub fn filter_by_tag(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.tags.insert(key, value);
        self.filters.clear_filters();
    }

    pub fn remove_tag_filter(&mut self, key: &str, value: impl Into<Value>) {
        self.tags.remove(key, &value.into());
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub fn tags(&self) -> &TagStore {
        &self.tags
    }

    pub fn project<R: Record + Clone>(&self, records: &[R]) -> Vec<R> {
        project(records, &self.filters)
    }

    pub fn filter_params(&self, keys: &[&str]) -> Vec<(String, String)> {
        self.filters
            .iter()
            .filter(|(key, _)| keys.contains(key))
            .map(|(key, value)| (key.to_string(), value_param(value)))
            .collect()
    }
}
