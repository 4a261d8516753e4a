use shared::{domain::AuditingEvent, protocol::AuditingPage};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    page::Page,
    route::Route,
};

pub const AUDITING_PATH: &str = "/auditing_event/";

pub struct AuditingController {
    pub title: &'static str,
    pub page: Page,
    events: Resource<Option<AuditingPage>>,
}

impl Default for AuditingController {
    fn default() -> Self {
        Self::new()
    }
}

impl AuditingController {
    pub fn new() -> Self {
        Self::with_page_size(crate::page::DEFAULT_PAGE_SIZE)
    }

    pub fn with_page_size(items_per_page: u32) -> Self {
        Self {
            title: Route::Auditing.context(),
            page: Page::new(1, items_per_page),
            events: Resource::default(),
        }
    }

    pub fn page_number(&self) -> u32 {
        self.page.number
    }

    pub fn items_per_page(&self) -> u32 {
        self.page.size
    }

    pub fn request(&mut self) -> (RequestToken, Vec<(String, String)>) {
        (self.events.begin(), self.page.query_params().to_vec())
    }

    pub fn apply(&mut self, token: RequestToken, result: Result<AuditingPage, FetchError>) -> bool {
        self.events.complete(token, result.map(Some))
    }

    pub async fn list_events(&mut self, api: &ApiClient) -> Result<(), FetchError> {
        let (token, params) = self.request();
        let result = api.get::<AuditingPage>(AUDITING_PATH, &params).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(page = self.page.number, count = ?self.count(), "auditing events loaded");
        }
        outcome
    }

    pub async fn change_page(
        &mut self,
        api: &ApiClient,
        page_number: u32,
    ) -> Result<(), FetchError> {
        self.page.number = page_number.max(1);
        self.list_events(api).await
    }

    pub fn count(&self) -> Option<u64> {
        self.events.data().as_ref().map(|page| page.count)
    }

    pub fn events(&self) -> Option<&[AuditingEvent]> {
        self.events.data().as_ref().map(|page| page.events.as_slice())
    }

    pub fn state(&self) -> &FetchState {
        self.events.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.events.error_message()
    }
}
