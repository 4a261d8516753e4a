use shared::domain::{Region, User};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

use crate::{
    api::{ApiClient, FetchError},
    controllers::{
        AuditingController, CapacityController, InstanceController, ProjectController,
        StorageController, UsageController,
    },
    events::{DashboardEvent, EventBus},
    fetch::FetchState,
    region::{RegionController, RegionService},
    route::Route,
    user::{UserController, UserService},
};

pub struct Dashboard {
    pub api: ApiClient,
    pub events: EventBus,
    inbox: broadcast::Receiver<DashboardEvent>,
    pub regions: RegionService,
    pub users: UserService,
    pub region_view: RegionController,
    pub user_view: UserController,
    pub projects: ProjectController,
    pub instances: InstanceController,
    pub storage: StorageController,
    pub usage: UsageController,
    pub capacity: CapacityController,
    pub auditing: AuditingController,
    route: Route,
}

impl Dashboard {
    pub fn new(api: ApiClient, items_per_page: u32) -> Self {
        let events = EventBus::new();
        let inbox = events.subscribe();
        let regions = RegionService::new(api.region(), events.clone());
        let region_view = RegionController::new(&regions);
        let mut instances = InstanceController::new();
        instances.page.size = items_per_page;
        let mut storage = StorageController::new();
        storage.page.size = items_per_page;

        Self {
            api,
            events,
            inbox,
            regions,
            users: UserService::new(),
            region_view,
            user_view: UserController::new(),
            projects: ProjectController::new(None),
            instances,
            storage,
            usage: UsageController::new(),
            capacity: CapacityController::new(),
            auditing: AuditingController::with_page_size(items_per_page),
            route: Route::Projects,
        }
    }

    pub async fn start(&mut self) -> Result<(), FetchError> {
        self.regions.load_regions(&self.api).await?;
        self.region_view.sync(&self.regions);
        self.user_view
            .load_user(&mut self.users, &self.api, &self.events)
            .await?;
        self.process_events().await;
        Ok(())
    }

    pub fn route(&self) -> Route {
        self.route
    }

    pub fn navigate(&mut self, route: Route) {
        self.route = route;
    }

    pub fn current_user(&self) -> Option<&User> {
        self.user_view.user.as_ref()
    }

    pub async fn change_region(&mut self, region: Region) -> bool {
        let changed = self
            .region_view
            .change_region(&mut self.regions, &mut self.api, region);
        if changed {
            self.process_events().await;
        }
        changed
    }

    pub async fn process_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let event = match self.inbox.try_recv() {
                Ok(event) => event,
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "dashboard events dropped");
                    continue;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            };
            self.handle_event(&event).await;
            handled += 1;
        }
        handled
    }

    async fn handle_event(&mut self, event: &DashboardEvent) {
        match event {
            DashboardEvent::RegionChanged(region) => {
                info!(region = %region.key, "reloading region scoped views");
                self.region_view.on_event(event, &self.regions);
                if let Err(err) = self
                    .user_view
                    .on_region_changed(&mut self.users, &self.api, &self.events)
                    .await
                {
                    warn!(error = %err, "failed to reload user after region change");
                }
                if let Some(route) = self.user_view.take_navigation() {
                    self.route = route;
                }
                self.reload_loaded_views().await;
            }
            DashboardEvent::UserLoaded(user) => {
                if *self.projects.state() != FetchState::Idle {
                    let result = self.projects.list_projects(&self.api, user).await;
                    log_failure("projects", result);
                }
            }
        }
    }

    async fn reload_loaded_views(&mut self) {
        if *self.instances.state() != FetchState::Idle {
            let result = self.instances.list_virtual_machines(&self.api).await;
            log_failure("instances", result);
        }
        if *self.storage.state() != FetchState::Idle {
            let result = self.storage.list_storage(&self.api).await;
            log_failure("storage", result);
        }
        if *self.capacity.state() != FetchState::Idle {
            let result = self.capacity.get_capacity_report(&self.api).await;
            log_failure("capacity", result);
        }
        if *self.auditing.state() != FetchState::Idle {
            let result = self.auditing.list_events(&self.api).await;
            log_failure("auditing", result);
        }
        if let Some(user) = self.user_view.user.clone() {
            if *self.usage.state() != FetchState::Idle {
                let result = self.usage.list_usage_records(&self.api, &user).await;
                log_failure("usage", result);
            }
        }
    }
}

fn log_failure(view: &str, result: Result<(), FetchError>) {
    if let Err(err) = result {
        warn!(view, error = %err, "reload failed");
    }
}
