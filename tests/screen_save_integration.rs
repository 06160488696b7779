use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use signage_admin::config::ApiConfig;
use signage_admin::{
    edit_group, edit_screen, parse_assignment, HttpApiClient, RecordingReporter, ReferencePolicy,
    SaveError, WriteStatus,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::net::TcpListener;

// One request as the fake API saw it
#[derive(Debug, Clone)]
struct Received {
    method: &'static str,
    path: String,
    body: Value,
    accept: Option<String>,
    authorization: Option<String>,
}

#[derive(Default)]
struct FakeState {
    screens: HashMap<String, Value>,
    groups: HashMap<String, Value>,
    received: Vec<Received>,
    // error status and body returned by PUT /v1/screens/{id}
    screen_failure: Option<(u16, Value)>,
}

#[derive(Clone, Default)]
struct FakeApi(Arc<Mutex<FakeState>>);

impl FakeApi {
    fn record(&self, method: &'static str, path: String, headers: &HeaderMap, body: Value) {
        let header = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string)
        };
        self.0.lock().received.push(Received {
            method,
            path,
            body,
            accept: header("accept"),
            authorization: header("authorization"),
        });
    }

    fn received(&self) -> Vec<Received> {
        self.0.lock().received.clone()
    }
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "hydra:description": format!("{} not found", what) })),
    )
        .into_response()
}

async fn get_screen(State(api): State<FakeApi>, Path(id): Path<String>) -> Response {
    match api.0.lock().screens.get(&id) {
        Some(screen) => Json(screen.clone()).into_response(),
        None => not_found("Screen"),
    }
}

async fn put_screen(
    State(api): State<FakeApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record("PUT", format!("/v1/screens/{}", id), &headers, body.clone());

    let mut state = api.0.lock();
    if let Some((status, error)) = state.screen_failure.clone() {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_REQUEST);
        return (status, Json(error)).into_response();
    }
    let Some(Value::Object(screen)) = state.screens.get_mut(&id) else {
        return not_found("Screen");
    };
    if let Value::Object(fields) = body {
        screen.extend(fields);
    }
    Json(Value::Object(screen.clone())).into_response()
}

async fn put_screen_groups(
    State(api): State<FakeApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record("PUT", format!("/v1/screens/{}/screen-groups", id), &headers, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn put_region_playlists(
    State(api): State<FakeApi>,
    Path((id, region_id)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let path = format!("/v1/screens/{}/regions/{}/playlists", id, region_id);
    api.record("PUT", path, &headers, body.clone());
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn get_group(State(api): State<FakeApi>, Path(id): Path<String>) -> Response {
    match api.0.lock().groups.get(&id) {
        Some(group) => Json(group.clone()).into_response(),
        None => not_found("Screen group"),
    }
}

async fn put_group(
    State(api): State<FakeApi>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    api.record("PUT", format!("/v1/screen-groups/{}", id), &headers, body.clone());

    let mut state = api.0.lock();
    let Some(Value::Object(group)) = state.groups.get_mut(&id) else {
        return not_found("Screen group");
    };
    if let Value::Object(fields) = body {
        group.extend(fields);
    }
    Json(Value::Object(group.clone())).into_response()
}

// Serve the fake API on an ephemeral port and return a client for it
async fn start(api: FakeApi) -> HttpApiClient {
    let app = Router::new()
        .route("/v1/screens/:id", get(get_screen).put(put_screen))
        .route("/v1/screens/:id/screen-groups", put(put_screen_groups))
        .route(
            "/v1/screens/:id/regions/:region_id/playlists",
            put(put_region_playlists),
        )
        .route("/v1/screen-groups/:id", get(get_group).put(put_group))
        .with_state(api);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ApiConfig {
        base_url: format!("http://{}/", address),
        timeout_secs: 5,
        token: Some("secret".to_string()),
    };
    HttpApiClient::from_config(&config).unwrap()
}

fn lobby_screen() -> Value {
    json!({
        "@id": "/v1/screens/s1",
        "title": "Lobby",
        "description": "Main entrance",
        "size": "55",
        "layout": "/v1/layouts/l1",
        "dimensions": {"width": 1920, "height": 1080},
        "regions": ["/v1/layouts/regions/r1", "/v1/layouts/regions/r2"],
        "inScreenGroups": "/v1/screens/s1/screen-groups",
        "enableColorSchemeChange": false
    })
}

fn fake_api() -> FakeApi {
    let api = FakeApi::default();
    api.0.lock().screens.insert("s1".to_string(), lobby_screen());
    api.0.lock().groups.insert(
        "g1".to_string(),
        json!({"@id": "/v1/screen-groups/g1", "title": "Foyer"}),
    );
    api
}

#[tokio::test]
async fn test_screen_save_over_http() {
    let api = fake_api();
    let client = Arc::new(start(api.clone()).await);
    let reporter = Arc::new(RecordingReporter::new());

    println!("📝 Editing screen s1 with groups and playlists in two regions");
    let edits = vec![
        parse_assignment("title=Lobby east").unwrap(),
        parse_assignment(r#"dimensions.width="1280""#).unwrap(),
        parse_assignment(
            r#"inScreenGroups=["/v1/screen-groups/g1", {"@id": "/v1/screen-groups/g2"}]"#,
        )
        .unwrap(),
        parse_assignment(
            r#"playlists=[
                {"@id": "/v1/playlists/p1", "region": "/v1/layouts/regions/r1"},
                {"@id": "/v1/playlists/p2", "region": "/v1/layouts/regions/r2"},
                {"@id": "/v1/playlists/p3", "region": "/v1/layouts/regions/r1"}
            ]"#,
        )
        .unwrap(),
    ];

    let report = edit_screen(
        client,
        reporter.clone(),
        ReferencePolicy::Reject,
        "s1",
        &edits,
    )
    .await
    .unwrap();

    assert!(report.is_success(), "report: {:?}", report);
    assert_eq!(report.primary, WriteStatus::Succeeded);
    assert_eq!(report.groups, WriteStatus::Succeeded);
    assert_eq!(report.regions.len(), 2);

    let received = api.received();
    assert_eq!(received.len(), 4);
    for request in &received {
        assert_eq!(request.method, "PUT");
        assert_eq!(request.accept.as_deref(), Some("application/ld+json"));
        assert_eq!(request.authorization.as_deref(), Some("Bearer secret"));
    }

    println!("🔍 The screen write goes first with coerced dimensions");
    assert_eq!(received[0].path, "/v1/screens/s1");
    assert_eq!(received[0].body["title"], "Lobby east");
    assert_eq!(received[0].body["dimensions"], json!({"width": 1280, "height": 1080}));
    assert!(received[0].body.get("playlists").is_none());

    let by_path: HashMap<&str, &Value> = received[1..]
        .iter()
        .map(|r| (r.path.as_str(), &r.body))
        .collect();
    assert_eq!(by_path["/v1/screens/s1/screen-groups"], &json!(["g1", "g2"]));
    assert_eq!(
        by_path["/v1/screens/s1/regions/r1/playlists"],
        &json!([{"playlist": "p1", "weight": 0}, {"playlist": "p3", "weight": 1}])
    );
    assert_eq!(
        by_path["/v1/screens/s1/regions/r2/playlists"],
        &json!([{"playlist": "p2", "weight": 0}])
    );

    // Regions are written one after the other, first-seen region first
    let region_paths: Vec<&str> = received
        .iter()
        .map(|r| r.path.as_str())
        .filter(|p| p.contains("/regions/"))
        .collect();
    assert_eq!(
        region_paths,
        vec![
            "/v1/screens/s1/regions/r1/playlists",
            "/v1/screens/s1/regions/r2/playlists"
        ]
    );

    let messages: Vec<String> = reporter.reported().into_iter().map(|r| r.message).collect();
    assert_eq!(messages[0], "Screen saved");
    assert!(messages.contains(&"Groups saved".to_string()));
    assert!(messages.contains(&"Playlists saved".to_string()));
    assert!(reporter.errors().is_empty());
    println!("✅ Screen, groups and playlists saved");
}

#[tokio::test]
async fn test_rejected_screen_write_stops_the_cycle() {
    let api = fake_api();
    api.0.lock().screen_failure = Some((
        422,
        json!({"hydra:description": "dimensions.width: This value should be positive."}),
    ));
    let client = Arc::new(start(api.clone()).await);
    let reporter = Arc::new(RecordingReporter::new());

    let edits = vec![
        parse_assignment(r#"inScreenGroups=["/v1/screen-groups/g1"]"#).unwrap(),
        parse_assignment(
            r#"playlists=[{"@id": "/v1/playlists/p1", "region": "/v1/layouts/regions/r1"}]"#,
        )
        .unwrap(),
    ];
    let report = edit_screen(
        client,
        reporter.clone(),
        ReferencePolicy::Reject,
        "s1",
        &edits,
    )
    .await
    .unwrap();

    assert!(!report.is_success());
    assert_eq!(report.primary, WriteStatus::Failed);
    assert_eq!(report.groups, WriteStatus::Idle);
    assert!(report.regions.is_empty());
    match &report.errors[..] {
        [SaveError::PrimaryWrite(detail)] => {
            assert_eq!(detail.status, Some(422));
            assert_eq!(
                detail.message().as_deref(),
                Some("dimensions.width: This value should be positive.")
            );
        }
        other => panic!("unexpected errors {:?}", other),
    }

    // Nothing but the rejected screen write reached the server
    assert_eq!(api.received().len(), 1);

    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "An error occurred saving the screen:");
    println!("✅ Primary failure reported, dependent writes withheld");
}

#[tokio::test]
async fn test_empty_playlist_list_clears_every_region() {
    let api = fake_api();
    let client = Arc::new(start(api.clone()).await);
    let reporter = Arc::new(RecordingReporter::new());

    let edits = vec![parse_assignment("playlists=[]").unwrap()];
    let report = edit_screen(
        client,
        reporter.clone(),
        ReferencePolicy::Reject,
        "s1",
        &edits,
    )
    .await
    .unwrap();

    assert!(report.is_success());
    // Memberships were never edited, so no group write
    assert_eq!(report.groups, WriteStatus::Idle);

    let received = api.received();
    let cleared: Vec<(&str, &Value)> = received
        .iter()
        .filter(|r| r.path.contains("/regions/"))
        .map(|r| (r.path.as_str(), &r.body))
        .collect();
    assert_eq!(
        cleared,
        vec![
            ("/v1/screens/s1/regions/r1/playlists", &json!([])),
            ("/v1/screens/s1/regions/r2/playlists", &json!([])),
        ]
    );
    assert!(!received.iter().any(|r| r.path.ends_with("/screen-groups")));
}

#[tokio::test]
async fn test_missing_screen_fails_before_any_write() {
    let api = fake_api();
    let client = Arc::new(start(api.clone()).await);
    let reporter = Arc::new(RecordingReporter::new());

    let result = edit_screen(client, reporter.clone(), ReferencePolicy::Reject, "s404", &[]).await;

    assert!(result.is_err());
    assert!(api.received().is_empty());
    let errors = reporter.errors();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].message, "An error occurred loading the screen: s404");
    assert_eq!(errors[0].detail.as_ref().and_then(|d| d.status), Some(404));
}

#[tokio::test]
async fn test_group_save_over_http() {
    let api = fake_api();
    let client = Arc::new(start(api.clone()).await);
    let reporter = Arc::new(RecordingReporter::new());

    let edits = vec![
        parse_assignment("title=Foyer west").unwrap(),
        parse_assignment("description=Next to the stairs").unwrap(),
    ];
    let saved = edit_group(client, reporter.clone(), "g1", &edits).await.unwrap();

    assert_eq!(saved.title, "Foyer west");
    let received = api.received();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].path, "/v1/screen-groups/g1");
    assert_eq!(received[0].body["title"], "Foyer west");
    assert_eq!(received[0].body["description"], "Next to the stairs");
    assert_eq!(reporter.reported()[0].message, "Group saved");
}
