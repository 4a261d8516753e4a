use shared::domain::{Project, User};
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    fetch::{FetchState, RequestToken, Resource},
    route::Route,
};

pub const PROJECT_PATH: &str = "/project/";

pub struct ProjectController {
    pub title: String,
    projects: Resource<Option<Vec<Project>>>,
}

impl ProjectController {
    pub fn new(route_context: Option<&str>) -> Self {
        Self {
            title: route_context
                .unwrap_or(Route::Projects.context())
                .to_string(),
            projects: Resource::default(),
        }
    }

    pub fn request(&mut self, user: &User) -> (RequestToken, Vec<(String, String)>) {
        (self.projects.begin(), super::account_scope(user))
    }

    pub fn apply(&mut self, token: RequestToken, result: Result<Vec<Project>, FetchError>) -> bool {
        self.projects.complete(token, result.map(Some))
    }

    pub async fn list_projects(&mut self, api: &ApiClient, user: &User) -> Result<(), FetchError> {
        let (token, params) = self.request(user);
        let result = api.get::<Vec<Project>>(PROJECT_PATH, &params).await;
        let outcome = result.as_ref().map(|_| ()).map_err(FetchError::clone);
        if self.apply(token, result) && outcome.is_ok() {
            info!(count = self.get_projects().len(), "projects loaded");
        }
        outcome
    }

    pub fn projects(&self) -> Option<&[Project]> {
        self.projects.data().as_deref()
    }

    pub fn get_projects(&self) -> &[Project] {
        self.projects().unwrap_or_default()
    }

    pub fn total_vm_count(&self) -> u64 {
        self.get_projects()
            .iter()
            .filter_map(|project| project.vm_count)
            .sum()
    }

    pub fn state(&self) -> &FetchState {
        self.projects.state()
    }

    pub fn error_message(&self) -> Option<String> {
        self.projects.error_message()
    }
}
