use shared::{
    domain::{ResourceId, StorageVolume},
    protocol::StorageListing,
};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    page::Page,
    projection::ListFilter,
};

pub const STORAGE_PATH: &str = "/storage/";
pub const STORAGE_TITLE: &str = "Storage";
pub const STORAGE_QUERY_FILTERS: [&str; 2] = ["zone_id", "state"];

pub struct StorageController {
    pub title: &'static str,
    pub project_name: String,
    pub project_id: Option<ResourceId>,
    pub page: Page,
    list: ListFilter,
    sent_query: Option<Vec<(String, String)>>,
    storage: Resource<Vec<StorageVolume>>,
}

impl Default for StorageController {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageController {
    pub fn new() -> Self {
        Self {
            title: STORAGE_TITLE,
            project_name: String::new(),
            project_id: None,
            page: Page::default(),
            list: ListFilter::new(),
            sent_query: None,
            storage: Resource::default(),
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
        params.extend(self.list.filter_params(&STORAGE_QUERY_FILTERS));
        params.extend(self.list.tags().query_params());
        params.extend(self.page.query_params());
        params
    }

    pub fn request(&mut self) -> (RequestToken, Vec<(String, String)>) {
        let params = self.query_params();
        self.sent_query = Some(params.clone());
        (self.storage.begin(), params)
    }

    pub fn is_stale(&self) -> bool {
        self.sent_query
            .as_ref()
            .is_some_and(|sent| *sent != self.query_params())
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<StorageListing, FetchError>,
    ) -> bool {
        self.storage.complete(token, result.map(|listing| listing.storage))
    }

    pub async fn list_storage(&mut self, api: &ApiClient) -> Result<(), FetchError> {
        let (token, params) = self.request();
        let result = api.get::<StorageListing>(STORAGE_PATH, &params).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(count = self.storage.data().len(), "storage loaded");
        }
        outcome
    }

    pub fn storage(&self) -> &[StorageVolume] {
        self.storage.data()
    }

    pub fn get_storage(&self) -> Vec<StorageVolume> {
        self.list.project(self.storage.data())
    }

    pub fn total_size(&self) -> u64 {
        self.get_storage()
            .iter()
            .filter_map(StorageVolume::size_bytes)
            .sum()
    }

    pub fn state(&self) -> &FetchState {
        self.storage.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.storage.error_message()
    }
}
