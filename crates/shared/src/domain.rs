use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Identifier as issued by the backend. Some resources use numeric ids,
/// others opaque strings, and both show up in the same listings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResourceId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for ResourceId {
    fn from(value: i64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for ResourceId {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Region {
    pub key: String,
    pub value: String,
}

impl Region {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ResourceId>,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain_id: Option<ResourceId>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: ResourceId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_count: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualMachine {
    pub id: ResourceId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instance_name: Option<String>,
    #[serde(default, alias = "zonename", skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_offering_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_offering_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ha_enabled: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub const STORAGE_CREATED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%z";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageVolume {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    /// Size in bytes. The backend sends it as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_id: Option<ResourceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub volume_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attached: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StorageVolume {
    pub fn size_bytes(&self) -> Option<u64> {
        self.size.as_deref()?.trim().parse().ok()
    }

    pub fn created_at(&self) -> Option<DateTime<FixedOffset>> {
        let raw = self.created.as_deref()?;
        DateTime::parse_from_str(raw, STORAGE_CREATED_FORMAT)
            .or_else(|_| DateTime::parse_from_rfc3339(raw))
            .ok()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsageType {
    RunningVm,
    AllocatedVm,
    Volume,
    VolumeSnapshot,
}

impl UsageType {
    pub const ALL: [UsageType; 4] = [
        UsageType::RunningVm,
        UsageType::AllocatedVm,
        UsageType::Volume,
        UsageType::VolumeSnapshot,
    ];

    pub fn type_id(self) -> u8 {
        match self {
            Self::RunningVm => 1,
            Self::AllocatedVm => 2,
            Self::Volume => 6,
            Self::VolumeSnapshot => 9,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::RunningVm => "Running VM",
            Self::AllocatedVm => "Allocated VM",
            Self::Volume => "Volume",
            Self::VolumeSnapshot => "Volume Snapshot",
        }
    }

    pub fn from_type_id(id: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.type_id() == id)
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub usage_type: Option<String>,
    pub usage: Number,
}

impl UsageRecord {
    pub fn kind(&self) -> Option<UsageType> {
        UsageType::from_label(self.usage_type.as_deref()?)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapacityEntry {
    pub capacity_total: u64,
    pub capacity_used: u64,
    pub percent_used: String,
    #[serde(rename = "type")]
    pub capacity_type: String,
    pub zone_id: ResourceId,
    pub zone_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditingEvent(pub Map<String, Value>);
