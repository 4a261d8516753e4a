use super::*;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use shared::{
    domain::{Region, ResourceId, User},
    protocol::InstanceListing,
};
use std::{collections::HashMap, sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::Mutex};

type Params = HashMap<String, String>;

#[derive(Debug, Clone)]
struct RecordedRequest {
    resource: &'static str,
    region: String,
    params: Params,
}

#[derive(Clone, Default)]
struct BackendState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    fail_instances: Arc<Mutex<bool>>,
}

impl BackendState {
    async fn record(&self, resource: &'static str, region: String, params: Params) {
        self.requests.lock().await.push(RecordedRequest {
            resource,
            region,
            params,
        });
    }

    async fn requests_for(&self, resource: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .await
            .iter()
            .filter(|r| r.resource == resource)
            .cloned()
            .collect()
    }
}

async fn regions() -> Json<Value> {
    Json(json!([
        {"key": "cme", "value": "RJCME"},
        {"key": "rjo", "value": "RJOFFICE"}
    ]))
}

async fn current_user(
    State(state): State<BackendState>,
    Path(region): Path<String>,
) -> Json<Value> {
    state.record("current_user", region.clone(), Params::new()).await;
    Json(json!([{"id": "1", "username": format!("user-{region}")}]))
}

async fn projects(
    State(state): State<BackendState>,
    Path(region): Path<String>,
    Query(params): Query<Params>,
) -> Json<Value> {
    state.record("project", region, params).await;
    Json(json!([{"id": 1, "name": "name", "vm_count": 1, "account": "account"}]))
}

async fn instances(
    State(state): State<BackendState>,
    Path(region): Path<String>,
    Query(params): Query<Params>,
) -> (StatusCode, Json<Value>) {
    state.record("instance", region, params).await;
    if *state.fail_instances.lock().await {
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"message": "cloudstack unavailable"})),
        );
    }
    (
        StatusCode::OK,
        Json(json!({
            "summary": {"zonename": {"a": 1, "b": 1}},
            "vms": {"count": 2, "virtual_machines": [
                {"id": 1, "zonename": "a", "zone_id": 1},
                {"id": 2, "zonename": "b", "zone_id": 2}
            ]}
        })),
    )
}

async fn storage(
    State(state): State<BackendState>,
    Path(region): Path<String>,
    Query(params): Query<Params>,
) -> Json<Value> {
    state.record("storage", region, params).await;
    Json(json!({"storage": [{
        "name": "ROOT-3145", "state": "Ready", "size": "1287589", "zone_name": "zone",
        "zone_id": 1, "created": "2015-09-18T14:08:30-0300", "type": "ROOT", "attached": true
    }]}))
}

async fn usage_records(
    State(state): State<BackendState>,
    Path(region): Path<String>,
    Query(params): Query<Params>,
) -> Json<Value> {
    state.record("usage_record", region, params).await;
    Json(json!({"usage": [{"account": "db", "domain": "ROOT", "type": "Volume", "usage": 15432}]}))
}

async fn cloud_capacity(
    State(state): State<BackendState>,
    Path(region): Path<String>,
) -> Json<Value> {
    state.record("cloud_capacity", region, Params::new()).await;
    Json(json!({"zone_name": [
        {"capacity_total": 100, "capacity_used": 10, "percent_used": "10.0", "type": "Memory",
         "zone_id": "1", "zone_name": "zone_name"},
        {"capacity_total": 100, "capacity_used": 10, "percent_used": "10.0", "type": "CPU",
         "zone_id": "1", "zone_name": "zone_name"}
    ]}))
}

async fn auditing_events(
    State(state): State<BackendState>,
    Path(region): Path<String>,
    Query(params): Query<Params>,
) -> Json<Value> {
    state.record("auditing_event", region, params).await;
    Json(json!({"count": 2, "events": [{}, {}]}))
}

async fn spawn_backend() -> anyhow::Result<(String, BackendState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = BackendState::default();
    let app = Router::new()
        .route("/api/v1/region/", get(regions))
        .route("/api/v1/:region/current_user/", get(current_user))
        .route("/api/v1/:region/project/", get(projects))
        .route("/api/v1/:region/instance/", get(instances))
        .route("/api/v1/:region/storage/", get(storage))
        .route("/api/v1/:region/usage_record/", get(usage_records))
        .route("/api/v1/:region/cloud_capacity/", get(cloud_capacity))
        .route("/api/v1/:region/auditing_event/", get(auditing_events))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}"), state))
}

fn client_for(server_url: &str) -> ApiClient {
    ApiClient::over_http(server_url, "cme", Duration::from_secs(5)).expect("api client")
}

fn admin() -> User {
    User {
        id: None,
        username: "admin".into(),
        account_name: Some("account".into()),
        domain_id: None,
        is_admin: true,
    }
}

fn tenant() -> User {
    User {
        id: None,
        username: "user".into(),
        account_name: Some("acc".into()),
        domain_id: Some(ResourceId::Number(1)),
        is_admin: false,
    }
}

#[test]
fn instance_controller_starts_empty() {
    let ctrl = InstanceController::new();
    assert_eq!(ctrl.title, "Instances");
    assert_eq!(ctrl.project_name, "");
    assert!(ctrl.vm_count().is_none());
    assert!(ctrl.instances().is_empty());
    assert!(ctrl.get_instances().is_empty());
    assert!(ctrl.filters().is_empty());
    assert!(ctrl.tags().is_empty());
    assert_eq!(ctrl.state(), &FetchState::Idle);
}

#[test]
fn instance_filters_are_cleared() {
    let mut ctrl = InstanceController::new();
    ctrl.filter_labeled("Zone", "zone_id", 2);
    ctrl.clear_filters();
    assert!(ctrl.filters().is_empty());
}

#[test]
fn instance_filter_is_removed_if_set_twice() {
    let mut ctrl = InstanceController::new();
    ctrl.filter("zone_id", 1);
    assert!(ctrl.is_filtered_field("zone_id", 1));
    assert!(!ctrl.is_filtered_field("zone_id", 2));
    ctrl.filter("zone_id", 1);
    assert!(!ctrl.is_filtered_field("zone_id", 1));
}

#[tokio::test]
async fn fetches_instances_from_the_server() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();

    ctrl.list_virtual_machines(&api).await.expect("list instances");

    assert_eq!(ctrl.get_instances().len(), 2);
    assert!(ctrl.vm_count().is_some());
    assert_eq!(ctrl.total_count(), Some(2));
    assert_eq!(ctrl.zone_counts().get("a"), Some(&1));
    assert_eq!(ctrl.facet("zonename").len(), 2);
    assert_eq!(ctrl.state(), &FetchState::Ready);

    let sent = backend.requests_for("instance").await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].region, "cme");
    assert_eq!(sent[0].params.get("page").map(String::as_str), Some("1"));
    assert_eq!(sent[0].params.get("page_size").map(String::as_str), Some("10"));
    assert!(!sent[0].params.contains_key("project_id"));
}

#[tokio::test]
async fn zone_filter_narrows_fetched_instances() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();
    ctrl.list_virtual_machines(&api).await.expect("list instances");

    ctrl.filter("zone_id", 1);
    let view = ctrl.get_instances();
    assert_eq!(view.len(), 1);
    assert_eq!(view[0].zone_name.as_deref(), Some("a"));
    assert_eq!(ctrl.instances().len(), 2);

    ctrl.filter("zone_id", 1);
    assert_eq!(ctrl.get_instances().len(), 2);
}

#[tokio::test]
async fn backend_filters_are_sent_with_the_listing() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();
    ctrl.filter("zone_id", 1);
    ctrl.filter("state", "Running");
    ctrl.filter("zonename", "a");

    ctrl.list_virtual_machines(&api).await.expect("list instances");

    let sent = backend.requests_for("instance").await;
    let params = &sent[0].params;
    assert_eq!(params.get("zone_id").map(String::as_str), Some("1"));
    assert_eq!(params.get("state").map(String::as_str), Some("Running"));
    assert!(!params.contains_key("zonename"));
    assert_eq!(params.get("page_size").map(String::as_str), Some("10"));
}

#[tokio::test]
async fn changing_tags_marks_the_listing_stale_until_refetched() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();
    assert!(!ctrl.is_stale());

    ctrl.list_virtual_machines(&api).await.expect("list instances");
    assert!(!ctrl.is_stale());

    ctrl.filter("zonename", "a");
    assert!(!ctrl.is_stale());

    ctrl.filter_by_tag("env", "prod");
    assert!(ctrl.is_stale());

    ctrl.list_virtual_machines(&api).await.expect("list tagged");
    assert!(!ctrl.is_stale());

    ctrl.remove_tag_filter("env", "prod");
    assert!(ctrl.is_stale());
}

#[tokio::test]
async fn tag_filters_are_added_and_other_filters_cleared() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::for_project(ResourceId::from("p-1"), "project");

    ctrl.filter("zone_id", 2);
    ctrl.list_virtual_machines(&api).await.expect("list instances");
    ctrl.filter_by_tag("key", "value");

    assert_eq!(
        serde_json::to_value(ctrl.tags()).expect("tags"),
        json!([{"key": "key", "value": "value"}])
    );
    assert!(ctrl.filters().is_empty());

    ctrl.list_virtual_machines(&api).await.expect("list tagged");
    let sent = backend.requests_for("instance").await;
    let last = &sent.last().expect("request").params;
    assert_eq!(last.get("tags[0].key").map(String::as_str), Some("key"));
    assert_eq!(last.get("tags[0].value").map(String::as_str), Some("value"));
    assert_eq!(last.get("project_id").map(String::as_str), Some("p-1"));
}

#[test]
fn instance_tag_is_removed_from_filters() {
    let mut ctrl = InstanceController::new();
    ctrl.filter_by_tag("key", "value");
    ctrl.filter_by_tag("key2", "value2");

    ctrl.remove_tag_filter("key2", "value2");
    assert_eq!(
        serde_json::to_value(ctrl.tags()).expect("tags"),
        json!([{"key": "key", "value": "value"}])
    );

    ctrl.remove_tag_filter("key2", "value2");
    assert_eq!(ctrl.tags().len(), 1);
}

#[tokio::test]
async fn failed_refetch_keeps_last_good_instances() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();
    ctrl.list_virtual_machines(&api).await.expect("list instances");

    *backend.fail_instances.lock().await = true;
    let err = ctrl
        .list_virtual_machines(&api)
        .await
        .expect_err("server failure");

    assert_eq!(
        err,
        FetchError::Server {
            status: 500,
            message: "cloudstack unavailable".into()
        }
    );
    assert_eq!(ctrl.get_instances().len(), 2);
    assert_eq!(
        ctrl.error_message().as_deref(),
        Some("Server error (500): cloudstack unavailable")
    );
}

#[tokio::test]
async fn older_instance_response_never_overwrites_newer_one() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = InstanceController::new();

    let (older, _) = ctrl.request();
    let (newer, params) = ctrl.request();
    let fresh = api
        .get::<InstanceListing>(controllers::instance::INSTANCE_PATH, &params)
        .await;

    assert!(ctrl.apply(newer, fresh));
    assert!(!ctrl.apply(older, Ok(InstanceListing::default())));
    assert_eq!(ctrl.get_instances().len(), 2);
}

#[test]
fn storage_controller_starts_empty() {
    let ctrl = StorageController::new();
    assert_eq!(ctrl.title, "Storage");
    assert_eq!(ctrl.project_name, "");
    assert!(ctrl.storage().is_empty());
    assert!(ctrl.tags().is_empty());
}

#[tokio::test]
async fn fetches_storage_from_the_server() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = StorageController::new();

    ctrl.list_storage(&api).await.expect("list storage");

    assert_eq!(ctrl.storage().len(), 1);
    assert_eq!(ctrl.total_size(), 1_287_589);
    ctrl.filter("type", "DATADISK");
    assert!(ctrl.get_storage().is_empty());
    ctrl.filter("type", "ROOT");
    assert_eq!(ctrl.get_storage().len(), 1);
}

#[test]
fn storage_query_carries_backend_filters() {
    let mut ctrl = StorageController::new();
    ctrl.filter("zone_id", 1);
    ctrl.filter("type", "ROOT");

    let params = ctrl.query_params();
    assert!(params.contains(&("zone_id".to_string(), "1".to_string())));
    assert!(!params.iter().any(|(key, _)| key == "type"));
}

#[test]
fn storage_tags_are_added_and_removed() {
    let mut ctrl = StorageController::new();
    ctrl.filter_by_tag("key", "value");
    assert_eq!(
        serde_json::to_value(ctrl.tags()).expect("tags"),
        json!([{"key": "key", "value": "value"}])
    );

    ctrl.filter_by_tag("key2", "value2");
    ctrl.remove_tag_filter("key2", "value2");
    assert_eq!(
        serde_json::to_value(ctrl.tags()).expect("tags"),
        json!([{"key": "key", "value": "value"}])
    );
}

#[tokio::test]
async fn lists_projects_for_user() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = ProjectController::new(Some("Projects"));
    assert!(ctrl.projects().is_none());

    ctrl.list_projects(&api, &tenant()).await.expect("list projects");

    assert_eq!(ctrl.title, "Projects");
    assert_eq!(ctrl.projects().map(<[_]>::len), Some(1));
    assert_eq!(ctrl.total_vm_count(), 1);
    let sent = backend.requests_for("project").await;
    assert_eq!(sent[0].params.get("account").map(String::as_str), Some("acc"));
}

#[tokio::test]
async fn lists_usage_records() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = UsageController::new();
    assert_eq!(ctrl.title, "Resource Usage");
    assert!(ctrl.records().is_none());

    ctrl.list_usage_records(&api, &admin()).await.expect("list usage");

    assert_eq!(ctrl.get_records().len(), 1);
    assert_eq!(ctrl.totals_by_type().get("Volume"), Some(&15432.0));

    ctrl.filter("usage", 15432);
    assert_eq!(ctrl.get_records().len(), 1);
    ctrl.filter("account", "other");
    assert!(ctrl.get_records().is_empty());
    assert!(ctrl.totals_by_type().is_empty());
    assert_eq!(ctrl.records().map(<[_]>::len), Some(1));
    let sent = backend.requests_for("usage_record").await;
    assert!(sent[0].params.is_empty());
}

#[tokio::test]
async fn gets_capacity_report() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = CapacityController::new();
    assert_eq!(ctrl.title, "Cloud Capacity by Zone");
    assert!(ctrl.capacity_report().is_none());
    assert!(ctrl.zones().is_none());

    ctrl.get_capacity_report(&api).await.expect("capacity");

    let zones = ctrl.zones().expect("zones");
    assert_eq!(zones, vec!["zone_name".to_string()]);
    assert_eq!(ctrl.zone("zone_name").len(), 2);
    assert!(ctrl.zone("elsewhere").is_empty());
}

#[tokio::test]
async fn lists_auditing_events() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let mut ctrl = AuditingController::new();
    assert_eq!(ctrl.title, "Auditing Events");
    assert_eq!(ctrl.page_number(), 1);
    assert_eq!(ctrl.items_per_page(), 10);
    assert!(ctrl.count().is_none());
    assert!(ctrl.events().is_none());

    ctrl.list_events(&api).await.expect("events");

    assert_eq!(ctrl.events().map(<[_]>::len), Some(2));
    assert_eq!(ctrl.count(), Some(2));

    ctrl.change_page(&api, 0).await.expect("events page");
    let sent = backend.requests_for("auditing_event").await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].params.get("page").map(String::as_str), Some("1"));
}

#[tokio::test]
async fn wrong_payload_shape_is_a_decode_error() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let err = api
        .get::<Vec<shared::domain::Project>>("/auditing_event/", &[])
        .await
        .expect_err("object is not a list");
    assert!(matches!(err, FetchError::Decode(_)));
}

#[tokio::test]
async fn loads_current_user_and_announces_it() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let api = client_for(&server_url);
    let events = EventBus::new();
    let mut rx = events.subscribe();
    let mut service = UserService::new();
    let mut ctrl = UserController::new();

    ctrl.load_user(&mut service, &api, &events)
        .await
        .expect("load user");

    let user = ctrl.user.clone().expect("user");
    assert_eq!(user.username, "user-cme");
    assert_eq!(
        rx.try_recv().expect("event"),
        DashboardEvent::UserLoaded(user)
    );
}

#[test]
fn region_selector_toggles() {
    let service = RegionService::new("r1", EventBus::new());
    let mut ctrl = RegionController::new(&service);
    assert!(ctrl.selector_class.is_none());
    ctrl.toggle_selector();
    assert_eq!(ctrl.selector_class, Some("sidebar-open"));
    ctrl.toggle_selector();
    assert!(ctrl.selector_class.is_none());
}

#[tokio::test]
async fn dashboard_start_populates_regions_and_user() {
    let (server_url, _backend) = spawn_backend().await.expect("spawn backend");
    let mut dashboard = Dashboard::new(client_for(&server_url), 10);

    dashboard.start().await.expect("start");

    assert_eq!(dashboard.region_view.list_regions().len(), 2);
    assert_eq!(
        dashboard.region_view.get_current_region(),
        &Region::new("cme", "RJCME")
    );
    assert_eq!(
        dashboard.current_user().map(|u| u.username.as_str()),
        Some("user-cme")
    );
    assert_eq!(dashboard.route(), Route::Projects);
}

#[tokio::test]
async fn region_change_reloads_dependent_views() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let mut dashboard = Dashboard::new(client_for(&server_url), 10);
    dashboard.start().await.expect("start");
    dashboard
        .instances
        .list_virtual_machines(&dashboard.api)
        .await
        .expect("instances");
    dashboard.navigate(Route::Instances);

    let changed = dashboard
        .change_region(Region::new("rjo", "RJOFFICE"))
        .await;

    assert!(changed);
    assert_eq!(dashboard.api.region(), "rjo");
    assert_eq!(dashboard.region_view.current_region.key, "rjo");
    assert_eq!(dashboard.region_view.selector_class, Some("sidebar-open"));
    assert_eq!(
        dashboard.current_user().map(|u| u.username.as_str()),
        Some("user-rjo")
    );
    assert_eq!(dashboard.route(), Route::Projects);

    let regions: Vec<String> = backend
        .requests_for("instance")
        .await
        .into_iter()
        .map(|r| r.region)
        .collect();
    assert_eq!(regions, vec!["cme".to_string(), "rjo".to_string()]);
    assert!(backend.requests_for("storage").await.is_empty());
}

#[tokio::test]
async fn selecting_the_current_region_changes_nothing() {
    let (server_url, backend) = spawn_backend().await.expect("spawn backend");
    let mut dashboard = Dashboard::new(client_for(&server_url), 10);
    dashboard.start().await.expect("start");

    let changed = dashboard.change_region(Region::new("cme", "RJCME")).await;

    assert!(!changed);
    assert!(dashboard.region_view.selector_class.is_none());
    assert_eq!(backend.requests_for("current_user").await.len(), 1);
}

#[tokio::test]
async fn unreachable_backend_is_a_network_error() {
    let api = ApiClient::over_http("http://127.0.0.1:1", "cme", Duration::from_secs(2))
        .expect("api client");
    let mut ctrl = CapacityController::new();
    let err = ctrl
        .get_capacity_report(&api)
        .await
        .expect_err("nothing listens on port 1");
    assert!(matches!(err, FetchError::Network(_)));
    assert!(ctrl.capacity_report().is_none());
    assert!(ctrl.error_message().is_some());
}
