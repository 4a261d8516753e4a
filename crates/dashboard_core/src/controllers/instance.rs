use std::collections::BTreeMap;

use shared::{
    domain::{ResourceId, VirtualMachine},
    protocol::{InstanceListing, VmSummary},
};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    page::Page,
    projection::ListFilter,
    tags::value_param,
};

pub const INSTANCE_PATH: &str = "/instance/";
pub const INSTANCE_TITLE: &str = "Instances";
pub const INSTANCE_QUERY_FILTERS: [&str; 4] =
    ["zone_id", "host_id", "service_offering_id", "state"];

#[derive(Debug, Clone, Default)]
struct InstanceData {
    instances: Vec<VirtualMachine>,
    summary: Option<VmSummary>,
    count: Option<u64>,
}

pub struct InstanceController {
    pub title: &'static str,
    pub project_name: String,
    pub project_id: Option<ResourceId>,
    pub page: Page,
    list: ListFilter,
    sent_query: Option<Vec<(String, String)>>,
    data: Resource<InstanceData>,
}

impl Default for InstanceController {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceController {
    pub fn new() -> Self {
        Self {
            title: INSTANCE_TITLE,
            project_name: String::new(),
            project_id: None,
            page: Page::default(),
            list: ListFilter::new(),
            sent_query: None,
            data: Resource::default(),
        }
    }

    pub fn for_project(project_id: ResourceId, project_name: impl Into<String>) -> Self {
        Self {
            project_id: Some(project_id),
            project_name: project_name.into(),
            ..Self::new()
        }
    }

    super::delegate_list_filter!();

    pub fn query_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::new();
        if let Some(project_id) = &self.project_id {
            params.push(("project_id".to_string(), project_id.to_string()));
        }
        params.extend(self.list.filter_params(&INSTANCE_QUERY_FILTERS));
        params.extend(self.list.tags().query_params());
        params.extend(self.page.query_params());
        params
    }

    pub fn request(&mut self) -> (RequestToken, Vec<(String, String)>) {
        let params = self.query_params();
        self.sent_query = Some(params.clone());
        (self.data.begin(), params)
    }

    /// Tags, server-side filters or paging changed since the last listing was
    /// requested, so the rows shown no longer answer the current query.
    pub fn is_stale(&self) -> bool {
        self.sent_query
            .as_ref()
            .is_some_and(|sent| *sent != self.query_params())
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<InstanceListing, FetchError>,
    ) -> bool {
        let result = result.map(|listing| InstanceData {
            count: Some(listing.vms.count),
            summary: Some(listing.summary),
            instances: listing.vms.virtual_machines,
        });
        self.data.complete(token, result)
    }

    pub async fn list_virtual_machines(&mut self, api: &ApiClient) -> Result<(), FetchError> {
        let (token, params) = self.request();
        let result = api.get::<InstanceListing>(INSTANCE_PATH, &params).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(count = self.data.data().instances.len(), "instances loaded");
        }
        outcome
    }

    pub fn get_instances(&self) -> Vec<VirtualMachine> {
        self.list.project(&self.data.data().instances)
    }

    pub fn instances(&self) -> &[VirtualMachine] {
        &self.data.data().instances
    }

    pub fn vm_count(&self) -> Option<&VmSummary> {
        self.data.data().summary.as_ref()
    }

    pub fn total_count(&self) -> Option<u64> {
        self.data.data().count
    }

    pub fn zone_counts(&self) -> BTreeMap<String, u64> {
        self.vm_count()
            .and_then(|summary| summary.get("zonename"))
            .cloned()
            .unwrap_or_default()
    }

    pub fn facet(&self, key: &str) -> BTreeMap<String, usize> {
        use crate::projection::Record;

        let mut counts = BTreeMap::new();
        for vm in &self.data.data().instances {
            if let Some(value) = vm.field(key) {
                *counts.entry(value_param(&value)).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn state(&self) -> &FetchState {
        self.data.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.data.error_message()
    }
}
