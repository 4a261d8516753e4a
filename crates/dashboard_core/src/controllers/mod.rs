pub mod auditing;
pub mod capacity;
pub mod instance;
pub mod project;
pub mod storage;
pub mod usage;

pub use auditing::AuditingController;
pub use capacity::CapacityController;
pub use instance::InstanceController;
pub use project::ProjectController;
pub use storage::StorageController;
pub use usage::UsageController;

use shared::domain::User;

macro_rules! delegate_list_filter {
    () => {
        pub fn filter(&mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) {
            self.list.filter(key, value);
        }

        pub fn filter_labeled(
            &mut self,
            label: impl Into<String>,
            key: impl Into<String>,
            value: impl Into<serde_json::Value>,
        ) {
            self.list.filter_labeled(label, key, value);
        }

        pub fn is_filtered_field(&self, key: &str, value: impl Into<serde_json::Value>) -> bool {
            self.list.is_filtered_field(key, value)
        }

        pub fn clear_filters(&mut self) {
            self.list.clear_filters();
        }

        /// Tags are applied by the backend; the shown rows change on the next listing.
        pub fn filter_by_tag(
            &mut self,
            key: impl Into<String>,
            value: impl Into<serde_json::Value>,
        ) {
            self.list.filter_by_tag(key, value);
        }

        pub fn remove_tag_filter(&mut self, key: &str, value: impl Into<serde_json::Value>) {
            self.list.remove_tag_filter(key, value);
        }

        pub fn filters(&self) -> &crate::filters::FilterStore {
            self.list.filters()
        }

        pub fn tags(&self) -> &crate::tags::TagStore {
            self.list.tags()
        }
    };
}

pub(crate) use delegate_list_filter;

fn account_scope(user: &User) -> Vec<(String, String)> {
    match (&user.account_name, user.is_admin) {
        (Some(account), false) => vec![("account".to_string(), account.clone())],
        _ => Vec::new(),
    }
}
