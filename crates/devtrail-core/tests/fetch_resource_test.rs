#![allow(clippy::unwrap_used)]
// Integration tests for `FetchResource` and `RecordGrid` against a mock backend.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use url::Url;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use devtrail_core::{
    BackendClient, BackendConfig, DeviceEventRecord, ErrorKind, EventRecord, FetchResource,
    GridPhase, GridView, NoToken, RecordGrid, RequestState, StaticToken, TokenProvider,
    device_events_grid_spec, device_events_path,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn client(base: &str, tokens: Arc<dyn TokenProvider>) -> Arc<BackendClient> {
    BackendConfig::new(Url::parse(base).unwrap())
        .build_client(tokens)
        .unwrap()
}

async fn setup() -> (MockServer, Arc<BackendClient>) {
    let server = MockServer::start().await;
    let client = client(&server.uri(), Arc::new(NoToken));
    (server, client)
}

// ── Settling ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_success_settles_with_rows() {
    let server = MockServer::start().await;
    let client = client(&server.uri(), Arc::new(StaticToken::new("secret")));

    Mock::given(method("GET"))
        .and(path("/events"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event_id": 1, "user_email": "a@example.com", "loc_name": "Lab" },
            { "event_id": 2, "user_email": "b@example.com" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let resource = FetchResource::<EventRecord>::new(client, "events");
    assert!(resource.state().is_loading());

    resource.fetch().await.unwrap();

    let state = resource.state();
    let rows = state.data().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].loc_name.as_deref(), Some("Lab"));
    assert_eq!(rows[1].loc_name, None);
    assert!(state.error().is_none());
}

#[tokio::test]
async fn test_fetch_single_object_becomes_one_row() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/7/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "event_id": "e1", "loc": "Dock" })))
        .mount(&server)
        .await;

    let resource = FetchResource::<DeviceEventRecord>::new(client, device_events_path("7"));
    resource.fetch().await.unwrap();

    let state = resource.state();
    let rows = state.data().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].loc.as_deref(), Some("Dock"));
}

#[tokio::test]
async fn test_fetch_status_errors_leave_no_data() {
    for (status, reason) in [(404, "404 Not Found"), (500, "500 Internal Server Error")] {
        let (server, client) = setup().await;

        Mock::given(method("GET"))
            .and(path("/events"))
            .respond_with(ResponseTemplate::new(status).set_body_string("stack trace here"))
            .mount(&server)
            .await;

        let resource = FetchResource::<EventRecord>::new(client, "events");
        resource.fetch().await.unwrap();

        let state = resource.state();
        assert!(!state.is_loading());
        assert!(state.data().is_none());
        let err = state.error().unwrap();
        assert_eq!(err.kind(), ErrorKind::Status(status));
        assert_eq!(err.message(), reason);
    }
}

#[tokio::test]
async fn test_fetch_network_error() {
    // Reserve a port, then free it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}/"), Arc::new(NoToken));
    let resource = FetchResource::<EventRecord>::new(client, "events");
    resource.fetch().await.unwrap();

    let state = resource.state();
    assert_eq!(state.error().unwrap().kind(), ErrorKind::Network);
    assert!(state.data().is_none());
}

#[tokio::test]
async fn test_fetch_bad_row_is_parse_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "event_id": 1 }, 42])))
        .mount(&server)
        .await;

    let resource = FetchResource::<EventRecord>::new(client, "events");
    resource.fetch().await.unwrap();

    assert_eq!(resource.state().error().unwrap().kind(), ErrorKind::Parse);
}

// ── Ordering and cancellation ───────────────────────────────────────

#[tokio::test]
async fn test_newest_invocation_wins_over_late_response() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/1/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{ "event_id": "old" }]))
                .set_delay(Duration::from_millis(300)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/devices/2/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{ "event_id": "new" }])))
        .mount(&server)
        .await;

    let mut resource = FetchResource::<DeviceEventRecord>::new(client, device_events_path("1"));
    let slow = resource.fetch();
    let fast = resource.set_path(device_events_path("2")).unwrap();

    fast.await.unwrap();
    slow.await.unwrap();

    let state = resource.state();
    let rows = state.data().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].event_id.as_deref(), Some("new"));
}

#[tokio::test]
async fn test_same_path_is_not_refetched() {
    let (_server, client) = setup().await;
    let mut resource = FetchResource::<EventRecord>::new(client, "events");
    assert!(resource.set_path("events").is_none());
}

#[tokio::test]
async fn test_drop_cancels_in_flight_request() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/events"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([]))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let resource = FetchResource::<EventRecord>::new(client, "events");
    let rx = resource.subscribe();
    let handle = resource.fetch();
    drop(resource);

    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("task should stop once cancelled")
        .unwrap();
    assert!(matches!(*rx.borrow(), RequestState::Loading));
}

// ── Grid binding ────────────────────────────────────────────────────

#[tokio::test]
async fn test_grid_moves_from_loading_to_ready() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/9/events"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "event_id": "1", "user_id": "u1", "move_time": "2024-12-12 23:59:59", "loc": "Lab" },
            { "event_id": "2", "user_id": "u2", "parent_event_id": "1", "loc": "Shelf" }
        ])))
        .mount(&server)
        .await;

    let mut grid = RecordGrid::mount(client, device_events_path("9"), device_events_grid_spec());
    assert!(matches!(grid.view(), GridView::Loading("Loading events...")));

    assert_eq!(grid.settled().await, GridPhase::Ready);
    let table = grid.table_mut().unwrap();
    assert_eq!(table.visible_rows().len(), 1);
    table.toggle_expanded();
    let visible = table.visible_rows();
    assert_eq!(visible.len(), 2);
    assert_eq!(visible[1].depth, 1);
}

#[tokio::test]
async fn test_grid_failure_shows_literal() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/devices/9/events"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let mut grid = RecordGrid::mount(client, device_events_path("9"), device_events_grid_spec());
    assert_eq!(grid.settled().await, GridPhase::Failed);
    assert!(matches!(
        grid.view(),
        GridView::Failed("Failed to load events.\nPlease try again later.")
    ));
}
