use shared::{domain::CapacityEntry, protocol::CapacityReport};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    route::Route,
};

pub const CAPACITY_PATH: &str = "/cloud_capacity/";

pub struct CapacityController {
    pub title: &'static str,
    report: Resource<Option<CapacityReport>>,
}

impl Default for CapacityController {
    fn default() -> Self {
        Self::new()
    }
}

impl CapacityController {
    pub fn new() -> Self {
        Self {
            title: Route::Capacity.context(),
            report: Resource::default(),
        }
    }

    pub fn request(&mut self) -> RequestToken {
        self.report.begin()
    }

    pub fn apply(
        &mut self,
        token: RequestToken,
        result: Result<CapacityReport, FetchError>,
    ) -> bool {
        self.report.complete(token, result.map(Some))
    }

    pub async fn get_capacity_report(&mut self, api: &ApiClient) -> Result<(), FetchError> {
        let token = self.request();
        let result = api.get::<CapacityReport>(CAPACITY_PATH, &[]).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(
                zones = self.zones().map_or(0, |zones| zones.len()),
                "capacity report loaded"
            );
        }
        outcome
    }

    pub fn capacity_report(&self) -> Option<&CapacityReport> {
        self.report.data().as_ref()
    }

    pub fn zones(&self) -> Option<Vec<String>> {
        self.capacity_report()
            .map(|report| report.keys().cloned().collect())
    }

    pub fn zone(&self, zone_name: &str) -> &[CapacityEntry] {
        self.capacity_report()
            .and_then(|report| report.get(zone_name))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn state(&self) -> &FetchState {
        self.report.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.report.error_message()
    }
}
