use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{
    AuditingEvent, CapacityEntry, Region, StorageVolume, UsageRecord, VirtualMachine,
};

pub const VM_SUMMARY_FEATURES: [&str; 5] = [
    "state",
    "serviceofferingname",
    "hostname",
    "zonename",
    "haenable",
];

pub type VmSummary = BTreeMap<String, BTreeMap<String, u64>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VmPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub virtual_machines: Vec<VirtualMachine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InstanceListing {
    #[serde(default)]
    pub summary: VmSummary,
    #[serde(default)]
    pub vms: VmPage,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageListing {
    #[serde(default)]
    pub storage: Vec<StorageVolume>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageListing {
    #[serde(default)]
    pub usage: Vec<UsageRecord>,
}

pub type CapacityReport = BTreeMap<String, Vec<CapacityEntry>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AuditingPage {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub events: Vec<AuditingEvent>,
}

pub type RegionListing = Vec<Region>;
