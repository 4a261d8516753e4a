use std::{collections::HashMap, fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;
use tracing::debug;

pub const SETTINGS_FILE: &str = "dashboard.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardSettings {
    pub api_base_url: String,
    pub default_region: String,
    pub items_per_page: u32,
    pub request_timeout_secs: u64,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:5000".into(),
            default_region: "cme".into(),
            items_per_page: 10,
            request_timeout_secs: 30,
        }
    }
}

impl DashboardSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Defaults, then `dashboard.toml` in the working directory, then the environment.
pub fn load_settings() -> anyhow::Result<DashboardSettings> {
    let mut settings = DashboardSettings::default();
    let path = Path::new(SETTINGS_FILE);
    if path.exists() {
        apply_file(&mut settings, path)?;
    }
    apply_overrides(&mut settings, |name| std::env::var(name).ok());
    Ok(settings)
}

pub fn apply_file(settings: &mut DashboardSettings, path: &Path) -> anyhow::Result<()> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read settings file '{}'", path.display()))?;
    let file_cfg = toml::from_str::<HashMap<String, toml::Value>>(&raw)
        .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
    debug!(path = %path.display(), keys = file_cfg.len(), "settings file loaded");

    apply_overrides(settings, |name| {
        let key = name.strip_prefix("APP__")?.to_ascii_lowercase();
        file_cfg.get(&key).map(|value| match value {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    });
    Ok(())
}

pub fn apply_overrides(
    settings: &mut DashboardSettings,
    lookup: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = lookup("DASHBOARD_API_URL") {
        settings.api_base_url = v;
    }
    if let Some(v) = lookup("APP__API_BASE_URL") {
        settings.api_base_url = v;
    }

    if let Some(v) = lookup("DASHBOARD_REGION") {
        settings.default_region = v;
    }
    if let Some(v) = lookup("APP__DEFAULT_REGION") {
        settings.default_region = v;
    }

    if let Some(v) = lookup("APP__ITEMS_PER_PAGE") {
        if let Ok(parsed) = v.parse::<u32>() {
            settings.items_per_page = parsed;
        }
    }

    if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.request_timeout_secs = parsed;
        }
    }
}
