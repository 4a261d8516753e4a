use serde::Deserialize;
use shared::domain::User;
use tracing::info;

use crate::{
    api::{ApiClient, FetchError},
    events::{DashboardEvent, EventBus},
    route::Route,
};

pub const CURRENT_USER_PATH: &str = "/current_user/";

/// The backend answers either with the user object or a one-element list.
#[derive(Deserialize)]
#[serde(untagged)]
enum CurrentUserPayload {
    Many(Vec<User>),
    One(User),
}

#[derive(Default)]
pub struct UserService {
    cached: Option<User>,
}

impl UserService {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_current_user(&mut self, api: &ApiClient) -> Result<User, FetchError> {
        if let Some(user) = &self.cached {
            return Ok(user.clone());
        }

        let payload: CurrentUserPayload = api.get(CURRENT_USER_PATH, &[]).await?;
        let user = match payload {
            CurrentUserPayload::One(user) => user,
            CurrentUserPayload::Many(users) => users
                .into_iter()
                .next()
                .ok_or_else(|| FetchError::Decode("empty current user list".into()))?,
        };
        info!(username = %user.username, "current user loaded");
        self.cached = Some(user.clone());
        Ok(user)
    }

    pub fn invalidate(&mut self) {
        self.cached = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct UserController {
    pub user: Option<User>,
    pub error: Option<String>,
    navigation: Option<Route>,
}

impl UserController {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn load_user(
        &mut self,
        service: &mut UserService,
        api: &ApiClient,
        events: &EventBus,
    ) -> Result<(), FetchError> {
        match service.get_current_user(api).await {
            Ok(user) => {
                self.user = Some(user.clone());
                self.error = None;
                events.publish(DashboardEvent::UserLoaded(user));
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.user_message());
                Err(err)
            }
        }
    }

    pub async fn on_region_changed(
        &mut self,
        service: &mut UserService,
        api: &ApiClient,
        events: &EventBus,
    ) -> Result<(), FetchError> {
        service.invalidate();
        self.navigation = Some(Route::Projects);
        self.load_user(service, api, events).await
    }

    pub fn take_navigation(&mut self) -> Option<Route> {
        self.navigation.take()
    }
}
