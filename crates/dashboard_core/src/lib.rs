pub mod api;
pub mod config;
pub mod controllers;
pub mod dashboard;
pub mod events;
pub mod fetch;
pub mod filters;
pub mod page;
pub mod projection;
pub mod region;
pub mod route;
pub mod tags;
pub mod user;

pub use api::{ApiClient, ApiTransport, FetchError, HttpTransport};
pub use config::{load_settings, DashboardSettings};
pub use controllers::{
    AuditingController, CapacityController, InstanceController, ProjectController,
    StorageController, UsageController,
};
pub use dashboard::Dashboard;
pub use events::{DashboardEvent, EventBus};
pub use fetch::{FetchState, RequestToken, Resource};
pub use filters::{FilterEntry, FilterStore};
pub use page::Page;
pub use projection::{project, ListFilter, Record};
pub use region::{RegionController, RegionService};
pub use route::Route;
pub use tags::{Tag, TagStore};
pub use user::{UserController, UserService};

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
