use std::collections::BTreeMap;

use serde_json::Value;

use shared::{
    domain::{UsageRecord, User},
    protocol::UsageListing,
};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    filters::FilterStore,
    projection::project,
    route::Route,
};

pub const USAGE_PATH: &str = "/usage_record/";

pub struct UsageController {
    pub title: &'static str,
    filters: FilterStore,
    records: Resource<Option<Vec<UsageRecord>>>,
}

impl Default for UsageController {
    fn default() -> Self {
        Self::new()
    }
}

impl UsageController {
    pub fn new() -> Self {
        Self {
            title: Route::Usage.context(),
            filters: FilterStore::new(),
            records: Resource::default(),
        }
    }

    pub fn request(&mut self, user: &User) -> (RequestToken, Vec<(String, String)>) {
        (self.records.begin(), super::account_scope(user))
    }

    pub fn apply(&mut self, token: RequestToken, result: Result<UsageListing, FetchError>) -> bool {
        self.records.complete(token, result.map(|listing| Some(listing.usage)))
    }

    pub fn filter(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.filters.filter(key, value);
    }

    pub fn is_filtered_field(&self, key: &str, value: impl Into<Value>) -> bool {
        self.filters.is_filtered_field(key, &value.into())
    }

    pub fn clear_filters(&mut self) {
        self.filters.clear_filters();
    }

    pub fn filters(&self) -> &FilterStore {
        &self.filters
    }

    pub async fn list_usage_records(
        &mut self,
        api: &ApiClient,
        user: &User,
    ) -> Result<(), FetchError> {
        let (token, params) = self.request(user);
        let result = api.get::<UsageListing>(USAGE_PATH, &params).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(count = self.records().map_or(0, <[_]>::len), "usage records loaded");
        }
        outcome
    }

    pub fn records(&self) -> Option<&[UsageRecord]> {
        self.records.data().as_deref()
    }

    pub fn get_records(&self) -> Vec<UsageRecord> {
        project(self.records().unwrap_or_default(), &self.filters)
    }

    pub fn totals_by_type(&self) -> BTreeMap<String, f64> {
        let mut totals = BTreeMap::new();
        for record in self.get_records() {
            let label = record.usage_type.unwrap_or_default();
            *totals.entry(label).or_insert(0.0) += record.usage.as_f64().unwrap_or_default();
        }
        totals
    }

    pub fn state(&self) -> &FetchState {
        self.records.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.records.error_message()
    }
}
