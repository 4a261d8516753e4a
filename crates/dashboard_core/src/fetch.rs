use tracing::warn;

use crate::api::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading,
    Ready,
    Error(FetchError),
}

#[derive(Debug, Clone)]
pub struct Resource<T> {
    data: T,
    state: FetchState,
    issued: u64,
}

impl<T: Default> Default for Resource<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> Resource<T> {
    pub fn new(initial: T) -> Self {
        Self {
            data: initial,
            state: FetchState::Idle,
            issued: 0,
        }
    }

    pub fn begin(&mut self) -> RequestToken {
        self.issued += 1;
        self.state = FetchState::Loading;
        RequestToken(self.issued)
    }

    /// Applies a completion. Returns `false` when the token is stale and the
    /// result was discarded.
    pub fn complete(&mut self, token: RequestToken, result: Result<T, FetchError>) -> bool {
        if token.0 != self.issued {
            warn!(
                token = token.0,
                latest = self.issued,
                "discarding stale response"
            );
            return false;
        }

        match result {
            Ok(data) => {
                self.data = data;
                self.state = FetchState::Ready;
            }
            Err(err) => {
                self.state = FetchState::Error(err);
            }
        }
        true
    }

    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == FetchState::Loading
    }

    pub fn is_idle(&self) -> bool {
        self.state == FetchState::Idle
    }

    pub fn error(&self) -> Option<&FetchError> {
        match &self.state {
            FetchState::Error(err) => Some(err),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(FetchError::user_message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle_with_initial_data() {
        let resource: Resource<Vec<u8>> = Resource::default();
        assert!(resource.is_idle());
        assert!(resource.data().is_empty());
    }

    #[test]
    fn loading_keeps_last_known_data() {
        let mut resource = Resource::new(vec![1]);
        let first = resource.begin();
        assert!(resource.complete(first, Ok(vec![1, 2])));

        resource.begin();
        assert!(resource.is_loading());
        assert_eq!(resource.data(), &vec![1, 2]);
    }

    #[test]
    fn stale_completion_is_discarded() {
        let mut resource = Resource::new(Vec::<u8>::new());
        let older = resource.begin();
        let newer = resource.begin();

        assert!(resource.complete(newer, Ok(vec![2])));
        assert!(!resource.complete(older, Ok(vec![1])));

        assert_eq!(resource.data(), &vec![2]);
        assert_eq!(resource.state(), &FetchState::Ready);
    }

    #[test]
    fn stale_failure_does_not_mask_pending_request() {
        let mut resource = Resource::new(Vec::<u8>::new());
        let older = resource.begin();
        resource.begin();

        assert!(!resource.complete(older, Err(FetchError::Network("reset".into()))));
        assert!(resource.is_loading());
    }

    #[test]
    fn failure_keeps_last_good_data() {
        let mut resource = Resource::new(Vec::<u8>::new());
        let token = resource.begin();
        resource.complete(token, Ok(vec![7]));

        let token = resource.begin();
        resource.complete(
            token,
            Err(FetchError::Server {
                status: 500,
                message: "boom".into(),
            }),
        );

        assert_eq!(resource.data(), &vec![7]);
        assert!(resource.error().is_some());
        assert_eq!(
            resource.error_message().as_deref(),
            Some("Server error (500): boom")
        );
    }
}
