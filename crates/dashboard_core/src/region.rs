use shared::domain::Region;
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    events::{DashboardEvent, EventBus},
};

pub const SELECTOR_OPEN_CLASS: &str = "sidebar-open";

pub struct RegionService {
    regions: Vec<Region>,
    current: Region,
    events: EventBus,
}

impl RegionService {
    pub fn new(default_key: &str, events: EventBus) -> Self {
        Self {
            regions: Vec::new(),
            current: Region::new(default_key, default_key),
            events,
        }
    }

    pub async fn load_regions(&mut self, api: &ApiClient) -> Result<&[Region], FetchError> {
        let regions: Vec<Region> = api.get_url(&api.regions_url(), &[]).await?;
        if let Some(known) = regions.iter().find(|r| r.key == self.current.key) {
            self.current = known.clone();
        }
        info!(count = regions.len(), "regions loaded");
        self.regions = regions;
        Ok(&self.regions)
    }

    pub fn list_regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn get_current_region(&self) -> &Region {
        &self.current
    }

    /// Switches the current region and announces it. Selecting the region
    /// that is already current does nothing and returns `false`.
    pub fn change_current_region(&mut self, region: Region, api: &mut ApiClient) -> bool {
        if region.key == self.current.key {
            return false;
        }
        info!(from = %self.current.key, to = %region.key, "region changed");
        api.set_region(region.key.clone());
        self.current = region.clone();
        self.events.publish(DashboardEvent::RegionChanged(region));
        true
    }
}

#[derive(Debug, Clone)]
pub struct RegionController {
    pub region_list: Vec<Region>,
    pub current_region: Region,
    pub selector_class: Option<&'static str>,
}

impl RegionController {
    pub fn new(service: &RegionService) -> Self {
        Self {
            region_list: service.list_regions().to_vec(),
            current_region: service.get_current_region().clone(),
            selector_class: None,
        }
    }

    pub fn list_regions(&self) -> &[Region] {
        &self.region_list
    }

    pub fn get_current_region(&self) -> &Region {
        &self.current_region
    }

    pub fn change_region(
        &mut self,
        service: &mut RegionService,
        api: &mut ApiClient,
        region: Region,
    ) -> bool {
        let changed = service.change_current_region(region, api);
        self.sync(service);
        changed
    }

    pub fn toggle_selector(&mut self) {
        self.selector_class = match self.selector_class {
            Some(_) => None,
            None => Some(SELECTOR_OPEN_CLASS),
        };
    }

    pub fn sync(&mut self, service: &RegionService) {
        self.region_list = service.list_regions().to_vec();
        self.current_region = service.get_current_region().clone();
    }

    pub fn on_event(&mut self, event: &DashboardEvent, service: &RegionService) {
        if let DashboardEvent::RegionChanged(_) = event {
            self.sync(service);
            self.toggle_selector();
        }
    }
}
