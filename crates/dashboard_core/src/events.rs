use shared::domain::{Region, User};
use tokio::sync::broadcast;
use tracing::debug;

const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardEvent {
    RegionChanged(Region),
    UserLoaded(User),
}

impl DashboardEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RegionChanged(_) => "region_changed",
            Self::UserLoaded(_) => "user_loaded",
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<DashboardEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, event: DashboardEvent) {
        let name = event.name();
        let delivered = self.tx.send(event).unwrap_or(0);
        debug!(event = name, subscribers = delivered, "event published");
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DashboardEvent> {
        self.tx.subscribe()
    }
}
