use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use jukebox::auth::Auth;
use jukebox::enrich::{EnrichError, Enricher, TitleSource};
use jukebox::http::{build_router, state::AppState};
use jukebox::identity::HostAddress;
use jukebox::queue::{QueueController, QueueStore};

const HOST: &str = "127.0.0.1";
const GUEST: &str = "192.168.1.50";
const WATCH_X: &str = "https://www.youtube.com/watch?v=xxxxxxxxxxx";

struct Titled(&'static str);

#[async_trait]
impl TitleSource for Titled {
    fn name(&self) -> &'static str {
        "titled"
    }

    async fn title(&self, _link: &str) -> Result<String, EnrichError> {
        Ok(self.0.to_string())
    }
}

fn make_state_with(enricher: Enricher, trust_proxy: bool) -> AppState {
    AppState {
        queue: QueueController::new(
            Arc::new(QueueStore::new()),
            HostAddress::Ip(HOST.parse().unwrap()),
        ),
        enricher: Arc::new(enricher),
        auth: Arc::new(Auth::open()),
        trust_proxy,
        library: None,
        public_dir: None,
    }
}

fn make_state() -> AppState {
    make_state_with(Enricher::offline(), false)
}

fn request(method: &str, uri: &str, from: &str, body: Option<Value>) -> Request<Body> {
    let peer: SocketAddr = SocketAddr::new(from.parse().unwrap(), 41234);
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .extension(ConnectInfo(peer));
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(state: &AppState, req: Request<Body>) -> (StatusCode, Value) {
    let response = build_router(state.clone()).oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn add(state: &AppState, from: &str, url: &str) -> (StatusCode, Value) {
    send(state, request("POST", "/api/add", from, Some(json!({ "videoUrl": url })))).await
}

async fn queue_titles(state: &AppState) -> Vec<String> {
    let (_, body) = send(state, request("GET", "/api/queue", GUEST, None)).await;
    body["queue"]
        .as_array()
        .unwrap()
        .iter()
        .map(|i| i["title"].as_str().unwrap().to_string())
        .collect()
}

// ── GET /api/status ───────────────────────────────────────────────────────────

#[tokio::test]
async fn status_reports_host_for_loopback() {
    let (status, body) = send(&make_state(), request("GET", "/api/status", HOST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isHost"], true);
    assert_eq!(body["yourIp"], HOST);
}

#[tokio::test]
async fn status_reports_guest() {
    let (status, body) = send(&make_state(), request("GET", "/api/status", GUEST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["isHost"], false);
    assert_eq!(body["yourIp"], GUEST);
}

#[tokio::test]
async fn status_normalizes_mapped_peer() {
    let (_, body) = send(&make_state(), request("GET", "/api/status", "::ffff:192.168.1.50", None)).await;
    assert_eq!(body["yourIp"], GUEST);
}

#[tokio::test]
async fn forwarded_header_spoof_ignored_without_trust_proxy() {
    let state = make_state();
    let mut req = request("GET", "/api/status", GUEST, None);
    req.headers_mut().insert("x-forwarded-for", HOST.parse().unwrap());
    let (_, body) = send(&state, req).await;
    assert_eq!(body["isHost"], false);
}

#[tokio::test]
async fn forwarded_header_honoured_behind_proxy() {
    let state = make_state_with(Enricher::offline(), true);
    let mut req = request("GET", "/api/status", HOST, None);
    req.headers_mut().insert("x-forwarded-for", GUEST.parse().unwrap());
    let (_, body) = send(&state, req).await;
    assert_eq!(body["isHost"], false);
    assert_eq!(body["yourIp"], GUEST);
}

// ── GET /api/queue ────────────────────────────────────────────────────────────

#[tokio::test]
async fn queue_starts_empty() {
    let (status, body) = send(&make_state(), request("GET", "/api/queue", GUEST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["queue"], json!([]));
    assert_eq!(body["currentlyPlaying"], Value::Null);
}

// ── POST /api/add ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_rejects_foreign_links() {
    let state = make_state();
    let (status, body) = add(&state, GUEST, "https://example.com/video").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("Invalid URL"));
    assert!(queue_titles(&state).await.is_empty());
}

#[tokio::test]
async fn add_requires_video_url() {
    let state = make_state();
    let (status, body) = send(&state, request("POST", "/api/add", GUEST, Some(json!({})))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn add_rejects_malformed_json() {
    let state = make_state();
    let mut req = request("POST", "/api/add", GUEST, None);
    *req.body_mut() = Body::from("{not json");
    let (status, body) = send(&state, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn add_with_failed_enrichment_uses_video_id() {
    let state = make_state();
    let (status, body) = add(&state, GUEST, WATCH_X).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["video"]["title"], "xxxxxxxxxxx");
    assert_eq!(body["video"]["kind"], "video-link");
    assert_eq!(body["video"]["externalId"], "xxxxxxxxxxx");
    assert_eq!(body["video"]["sourceUrl"], WATCH_X);
    assert!(body["message"].as_str().unwrap().contains("warning"));
}

#[tokio::test]
async fn add_with_enrichment_uses_fetched_title() {
    let enricher = Enricher::new(vec![Box::new(Titled("Real Title"))], Duration::from_secs(1));
    let state = make_state_with(enricher, false);
    let (status, body) = add(&state, GUEST, WATCH_X).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["video"]["title"], "Real Title");
    assert_eq!(body["message"], "Video added successfully");
}

#[tokio::test]
async fn add_library_track() {
    let state = make_state();
    let track = json!({
        "kind": "library-track",
        "externalId": "jf-123",
        "title": "Blue in Green",
        "artist": "Miles Davis",
        "coverReference": "jf-123",
    });
    let (status, body) = send(&state, request("POST", "/api/add", GUEST, Some(track))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["video"]["kind"], "library-track");
    assert_eq!(body["video"]["artist"], "Miles Davis");
    assert_eq!(body["video"]["coverReference"], "jf-123");
    assert!(body["video"].get("sourceUrl").is_none());
}

#[tokio::test]
async fn add_library_track_requires_external_id() {
    let state = make_state();
    let track = json!({ "kind": "library-track", "title": "No id" });
    let (status, _) = send(&state, request("POST", "/api/add", GUEST, Some(track))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(queue_titles(&state).await.is_empty());
}

#[tokio::test]
async fn add_unknown_kind_rejected() {
    let state = make_state();
    let item = json!({ "kind": "podcast-episode", "externalId": "p1" });
    let (status, _) = send(&state, request("POST", "/api/add", GUEST, Some(item))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn queue_preserves_submission_order() {
    let state = make_state();
    for id in ["aaa", "bbb", "ccc"] {
        add(&state, GUEST, &format!("https://youtu.be/{id}")).await;
    }
    assert_eq!(queue_titles(&state).await, ["aaa", "bbb", "ccc"]);
}

// ── POST /api/next ────────────────────────────────────────────────────────────

#[tokio::test]
async fn next_rejects_guest() {
    let (status, body) = send(&make_state(), request("POST", "/api/next", GUEST, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("Only the host"));
}

#[tokio::test]
async fn next_on_empty_queue_returns_null() {
    let (status, body) = send(&make_state(), request("POST", "/api/next", HOST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextVideo"], Value::Null);
}

#[tokio::test]
async fn guest_adds_host_plays_scenario() {
    let state = make_state();

    let (status, _) = add(&state, GUEST, WATCH_X).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(&state, request("POST", "/api/next", GUEST, None)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(queue_titles(&state).await, ["xxxxxxxxxxx"]);

    let (status, body) = send(&state, request("POST", "/api/next", HOST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextVideo"]["title"], "xxxxxxxxxxx");
    let (_, snapshot) = send(&state, request("GET", "/api/queue", GUEST, None)).await;
    assert_eq!(snapshot["queue"], json!([]));
    assert_eq!(snapshot["currentlyPlaying"]["title"], "xxxxxxxxxxx");

    let (status, body) = send(&state, request("POST", "/api/next", HOST, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["nextVideo"], Value::Null);
    let (_, snapshot) = send(&state, request("GET", "/api/queue", GUEST, None)).await;
    assert_eq!(snapshot["currentlyPlaying"], Value::Null);
}

// ── POST /api/delete ──────────────────────────────────────────────────────────

async fn abc(state: &AppState) {
    for id in ["A", "B", "C"] {
        add(state, GUEST, &format!("https://youtu.be/{id}")).await;
    }
}

#[tokio::test]
async fn delete_rejects_guest() {
    let state = make_state();
    abc(&state).await;
    let (status, body) = send(&state, request("POST", "/api/delete", GUEST, Some(json!({ "index": 1 })))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["message"].as_str().unwrap().contains("Only the host"));
    assert_eq!(queue_titles(&state).await, ["A", "B", "C"]);
}

#[tokio::test]
async fn delete_rejects_guest_even_without_index() {
    let (status, _) = send(&make_state(), request("POST", "/api/delete", GUEST, Some(json!({})))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn delete_index_zero_rejected() {
    let state = make_state();
    abc(&state).await;
    let (status, body) = send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": 0 })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid index");
    assert!(body["reason"].as_str().unwrap().contains("index 0"));
}

#[tokio::test]
async fn delete_out_of_range_rejected() {
    let state = make_state();
    abc(&state).await;
    for index in [3, -1] {
        let (status, body) =
            send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": index })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["reason"].as_str().unwrap().contains("out of range"));
    }
    assert_eq!(queue_titles(&state).await, ["A", "B", "C"]);
}

#[tokio::test]
async fn delete_non_integer_index_rejected() {
    let state = make_state();
    abc(&state).await;
    for index in [json!(1.5), json!("one"), json!(true), json!([1])] {
        let (status, body) =
            send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": index })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{index}");
        assert_eq!(body["message"], "Invalid index");
        assert_eq!(body["reason"], "index must be an integer");
    }
    assert_eq!(queue_titles(&state).await, ["A", "B", "C"]);
}

#[tokio::test]
async fn delete_accepts_numeric_string_and_integral_float() {
    let state = make_state();
    abc(&state).await;

    let (status, _) = send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": "2" })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue_titles(&state).await, ["A", "B"]);

    let (status, _) = send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": 1.0 })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(queue_titles(&state).await, ["A"]);
}

#[tokio::test]
async fn delete_huge_index_is_out_of_range() {
    let state = make_state();
    abc(&state).await;
    for index in [json!(u64::MAX), json!(1e30), json!("99999999999999999999")] {
        let (status, body) =
            send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": index })))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{index}");
        assert!(body["reason"].as_str().unwrap().contains("out of range"), "{index}");
    }
    assert_eq!(queue_titles(&state).await, ["A", "B", "C"]);
}

#[tokio::test]
async fn delete_then_reserved_scenario() {
    let state = make_state();
    abc(&state).await;

    let (status, body) = send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": 1 })))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(queue_titles(&state).await, ["A", "C"]);

    let (status, _) = send(&state, request("POST", "/api/delete", HOST, Some(json!({ "index": 0 })))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(queue_titles(&state).await, ["A", "C"]);
}

// ── routing ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn library_proxy_without_library_is_404() {
    let (status, _) = send(&make_state(), request("GET", "/api/library/Items/1", GUEST, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_path_without_public_dir_is_404() {
    let response = build_router(make_state())
        .oneshot(request("GET", "/index.html", GUEST, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn static_files_served_from_public_dir() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("index.html"), "<h1>jukebox</h1>").unwrap();
    let mut state = make_state();
    state.public_dir = Some(dir.path().to_path_buf());

    let response = build_router(state)
        .oneshot(request("GET", "/index.html", GUEST, None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"<h1>jukebox</h1>");
}
