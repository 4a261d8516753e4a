use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: Value,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    fn matches(&self, key: &str, value: &Value) -> bool {
        self.key == key && &self.value == value
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TagStore {
    tags: Vec<Tag>,
}

impl TagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> bool {
        let tag = Tag::new(key, value);
        if self.contains(&tag.key, &tag.value) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    pub fn remove(&mut self, key: &str, value: &Value) -> bool {
        let before = self.tags.len();
        self.tags.retain(|tag| !tag.matches(key, value));
        self.tags.len() != before
    }

    pub fn contains(&self, key: &str, value: &Value) -> bool {
        self.tags.iter().any(|tag| tag.matches(key, value))
    }

    pub fn as_slice(&self) -> &[Tag] {
        &self.tags
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Renders the tags in the backend's `tags[i].key` / `tags[i].value` form.
    pub fn query_params(&self) -> Vec<(String, String)> {
        self.tags
            .iter()
            .enumerate()
            .flat_map(|(i, tag)| {
                [
                    (format!("tags[{i}].key"), tag.key.clone()),
                    (format!("tags[{i}].value"), value_param(&tag.value)),
                ]
            })
            .collect()
    }
}

pub(crate) fn value_param(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
