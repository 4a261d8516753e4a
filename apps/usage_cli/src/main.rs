use anyhow::{anyhow, Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use dashboard_core::{load_settings, ApiClient, Dashboard, Route};
use serde::Serialize;
use serde_json::{json, Value};
use shared::domain::ResourceId;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Query the IaaS usage dashboard from the terminal")]
struct Args {
    /// Backend base URL; overrides dashboard.toml and the environment.
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    page_size: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Regions,
    User,
    Projects,
    Instances(ListArgs),
    Storage(ListArgs),
    Usage,
    Capacity,
    Events {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(ClapArgs, Debug)]
struct ListArgs {
    #[arg(long)]
    project_id: Option<String>,
    /// Field filter as key=value; repeatable, combined with AND.
    #[arg(long = "filter", value_parser = parse_pair)]
    filters: Vec<(String, Value)>,
    /// Tag filter as key=value; repeatable.
    #[arg(long = "tag", value_parser = parse_pair)]
    tags: Vec<(String, Value)>,
}

/// Splits `key=value`. The value is read as JSON when it parses (numbers,
/// booleans), otherwise kept as a string.
fn parse_pair(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    let value = serde_json::from_str::<Value>(value)
        .ok()
        .filter(|v| !v.is_object() && !v.is_array())
        .unwrap_or_else(|| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

fn project_id(raw: &str) -> ResourceId {
    raw.parse::<i64>()
        .map(ResourceId::Number)
        .unwrap_or_else(|_| ResourceId::from(raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings()?;
    if let Some(url) = args.api_url {
        settings.api_base_url = url;
    }
    if let Some(region) = args.region {
        settings.default_region = region;
    }
    if let Some(page_size) = args.page_size {
        settings.items_per_page = page_size;
    }
    info!(api = %settings.api_base_url, region = %settings.default_region, "starting");

    let api = ApiClient::over_http(
        &settings.api_base_url,
        settings.default_region.clone(),
        settings.request_timeout(),
    )?;
    let mut dashboard = Dashboard::new(api, settings.items_per_page);
    dashboard
        .start()
        .await
        .map_err(|err| anyhow!(err.user_message()))
        .context("failed to load regions and current user")?;

    let user = dashboard
        .current_user()
        .cloned()
        .ok_or_else(|| anyhow!("backend returned no current user"))?;

    match args.command {
        Command::Regions => print_json(&json!({
            "current": dashboard.region_view.get_current_region(),
            "regions": dashboard.region_view.list_regions(),
        })),
        Command::User => print_json(&user),
        Command::Projects => {
            dashboard.navigate(Route::Projects);
            dashboard
                .projects
                .list_projects(&dashboard.api, &user)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": dashboard.projects.title,
                "projects": dashboard.projects.get_projects(),
            }))
        }
        Command::Instances(list) => {
            dashboard.navigate(Route::Instances);
            let ctrl = &mut dashboard.instances;
            if let Some(id) = list.project_id.as_deref() {
                ctrl.project_id = Some(project_id(id));
            }
            for (key, value) in list.tags {
                ctrl.filter_by_tag(key, value);
            }
            for (key, value) in list.filters {
                ctrl.filter(key, value);
            }
            ctrl.list_virtual_machines(&dashboard.api)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": ctrl.title,
                "count": ctrl.total_count(),
                "summary": ctrl.vm_count(),
                "filters": ctrl.filters(),
                "tags": ctrl.tags(),
                "instances": ctrl.get_instances(),
            }))
        }
        Command::Storage(list) => {
            dashboard.navigate(Route::Storage);
            let ctrl = &mut dashboard.storage;
            if let Some(id) = list.project_id.as_deref() {
                ctrl.project_id = Some(project_id(id));
            }
            for (key, value) in list.tags {
                ctrl.filter_by_tag(key, value);
            }
            for (key, value) in list.filters {
                ctrl.filter(key, value);
            }
            ctrl.list_storage(&dashboard.api)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": ctrl.title,
                "total_size": ctrl.total_size(),
                "filters": ctrl.filters(),
                "tags": ctrl.tags(),
                "storage": ctrl.get_storage(),
            }))
        }
        Command::Usage => {
            dashboard.navigate(Route::Usage);
            dashboard
                .usage
                .list_usage_records(&dashboard.api, &user)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": dashboard.usage.title,
                "totals": dashboard.usage.totals_by_type(),
                "records": dashboard.usage.get_records(),
            }))
        }
        Command::Capacity => {
            dashboard.navigate(Route::Capacity);
            dashboard
                .capacity
                .get_capacity_report(&dashboard.api)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": dashboard.capacity.title,
                "zones": dashboard.capacity.zones(),
                "report": dashboard.capacity.capacity_report(),
            }))
        }
        Command::Events { page } => {
            dashboard.navigate(Route::Auditing);
            dashboard
                .auditing
                .change_page(&dashboard.api, page)
                .await
                .map_err(|err| anyhow!(err.user_message()))?;
            print_json(&json!({
                "title": dashboard.auditing.title,
                "page": dashboard.auditing.page_number(),
                "items_per_page": dashboard.auditing.items_per_page(),
                "count": dashboard.auditing.count(),
                "events": dashboard.auditing.events(),
            }))
        }
    }
}
