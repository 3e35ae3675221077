//! Preview / administration API over a real listener.

mod common;

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};

use common::{RecordingTransport, at, device, schedule};
use dotmate::renderers::{self, RenderContext};
use dotmate::schedule::ScheduleEngine;
use dotmate::schedule::clock::ManualClock;
use dotmate::server::{self, AppState};

struct TestServer {
    base: String,
    transport: Arc<RecordingTransport>,
    client: reqwest::Client,
}

async fn start(transport: RecordingTransport) -> TestServer {
    let clock = Arc::new(ManualClock::new(at(2024, 1, 1, 9, 30)));
    let registry = Arc::new(renderers::default_registry());
    let transport = Arc::new(transport);
    let context = RenderContext::offline().with_clock(clock);
    let engine = Arc::new(ScheduleEngine::new(registry.clone(), transport.clone(), context));
    let devices = vec![device(
        "office",
        "ABCD",
        vec![schedule(Some("0 12 * * *"), "text", json!({"message": "lunch"}))],
    )];

    let state = Arc::new(AppState::load(registry, engine, devices).unwrap());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, server::router(state)).await.unwrap();
    });

    TestServer {
        base: format!("http://{}", addr),
        transport,
        client: reqwest::Client::new(),
    }
}

impl TestServer {
    async fn post(&self, path: &str, body: Value) -> reqwest::Response {
        self.client
            .post(format!("{}{}", self.base, path))
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{}", self.base, path))
            .send()
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn test_list_renderers() {
    let server = start(RecordingTransport::default()).await;

    let res = server.get("/api/renderers").await;
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    let types: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["type"].as_str().unwrap())
        .collect();
    assert_eq!(types.len(), 8);
    assert!(types.contains(&"title_image"));

    let text = body
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["type"] == "text")
        .unwrap();
    assert_eq!(text["params"][0], json!({"name": "message", "type": "string", "required": true}));
}

#[tokio::test]
async fn test_preview_bitmap_is_png() {
    let server = start(RecordingTransport::default()).await;

    let res = server
        .post("/api/renderers/title_image/preview", json!({"main_title": "Lunch"}))
        .await;
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["content-type"], "image/png");

    let bytes = res.bytes().await.unwrap();
    assert_eq!(&bytes[..8], b"\x89PNG\r\n\x1a\n");
    assert_eq!(server.transport.count(), 0);
}

#[tokio::test]
async fn test_preview_text_is_json() {
    let server = start(RecordingTransport::default()).await;

    let res = server
        .post("/api/renderers/text/preview", json!({"message": "hi"}))
        .await;
    assert_eq!(res.status(), 200);

    let body: Value = res.json().await.unwrap();
    assert_eq!(body["body"], "hi");
    assert_eq!(body["signature"], "09:30");
}

#[tokio::test]
async fn test_preview_rejects_bad_requests() {
    let server = start(RecordingTransport::default()).await;

    let missing = server.post("/api/renderers/title_image/preview", json!({})).await;
    assert_eq!(missing.status(), 400);
    let body: Value = missing.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("main_title"));

    let unknown = server.post("/api/renderers/nope/preview", json!({})).await;
    assert_eq!(unknown.status(), 400);
}

#[tokio::test]
async fn test_local_file_params_refused() {
    let server = start(RecordingTransport::default()).await;

    let preview = server
        .post("/api/renderers/image/preview", json!({"image_path": "/etc/passwd"}))
        .await;
    assert_eq!(preview.status(), 400);
    let body: Value = preview.json().await.unwrap();
    assert!(body["error"].as_str().unwrap().contains("image_path"));

    let push = server
        .post("/api/devices/office/push/image", json!({"image_path": "/etc/passwd"}))
        .await;
    assert_eq!(push.status(), 400);
    assert_eq!(server.transport.count(), 0);
}

#[tokio::test]
async fn test_push_delivers_to_device() {
    let server = start(RecordingTransport::default()).await;

    let res = server
        .post("/api/devices/office/push/text", json!({"message": "now"}))
        .await;
    assert_eq!(res.status(), 200);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body, json!({"device_id": "ABCD", "type": "text", "payload": "text"}));

    assert_eq!(server.transport.device_ids(), vec!["ABCD"]);
}

#[tokio::test]
async fn test_push_errors() {
    let server = start(RecordingTransport::failing()).await;

    let ghost = server.post("/api/devices/ghost/push/text", json!({"message": "x"})).await;
    assert_eq!(ghost.status(), 404);

    let rejected = server.post("/api/devices/ABCD/push/text", json!({"message": "x"})).await;
    assert_eq!(rejected.status(), 502);
}

#[tokio::test]
async fn test_list_schedules() {
    let server = start(RecordingTransport::default()).await;

    let body: Value = server.get("/api/schedules").await.json().await.unwrap();
    assert_eq!(body[0]["device_id"], "ABCD");
    assert_eq!(body[0]["type"], "text");
    assert_eq!(body[0]["state"], "scheduled");
    assert_eq!(body[0]["cron"], "0 12 * * *");
}

#[tokio::test]
async fn test_state_load_rejects_bad_cron() {
    let registry = Arc::new(renderers::default_registry());
    let engine = Arc::new(ScheduleEngine::new(
        registry.clone(),
        Arc::new(RecordingTransport::default()),
        RenderContext::offline(),
    ));
    let devices = vec![device(
        "office",
        "ABCD",
        vec![schedule(Some("0 25 * * *"), "text", json!({"message": "x"}))],
    )];

    assert!(AppState::load(registry, engine, devices).is_err());
}
