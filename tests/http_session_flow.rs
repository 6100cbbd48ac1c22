use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use index_checker::config::{CheckerConfig, ServerConfig};
use index_checker::routes::build_router;
use index_checker::state::AppState;

fn app_with(config: CheckerConfig) -> Router {
    build_router(Arc::new(AppState::with_config(config)))
}

fn app() -> Router {
    app_with(CheckerConfig::default())
}

fn document() -> Value {
    json!({
        "exam": "reading-07",
        "passages": [
            {
                "passage_id": "R1",
                "title": "Honey bees",
                "text": "x".repeat(100),
                "groups": [
                    {
                        "group_id": "G1",
                        "type": "mcq",
                        "items": [
                            { "item_id": "A", "number": 1, "prompt": "First?",
                              "answer": { "type": "span", "value": "aa", "start_index": 10, "stop_index": 20 } },
                            { "item_id": "B", "number": 2, "prompt": "Second?",
                              "answer": { "type": "span", "value": "bb", "start_index": 15, "stop_index": 25 } }
                        ]
                    },
                    {
                        "group_id": "G2",
                        "type": "gap_fill",
                        "items": [
                            { "item_id": "C", "number": 3,
                              "answer": { "type": "span", "value": "cc", "start_index": 5, "stop_index": 5 } }
                        ]
                    }
                ]
            },
            { "passage_id": "R2", "text": "second passage", "groups": [] }
        ]
    })
}

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(v) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(v.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).expect("json body") };
    (status, value)
}

async fn upload(app: &Router, id: &str, raw: Vec<u8>) -> (StatusCode, Value) {
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/document?source=reading.json", id))
        .body(Body::from(raw))
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn new_session(app: &Router) -> String {
    let (status, body) = call(app, Method::POST, "/api/v1/sessions", None).await;
    assert_eq!(status, StatusCode::CREATED);
    body["session_id"].as_str().expect("session id").to_string()
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = call(&app(), Method::GET, "/api/v1/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "ok": true }));
}

#[tokio::test]
async fn full_edit_and_export_flow() {
    let app = app();
    let id = new_session(&app).await;

    let (status, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["phase"], "empty");

    let raw = serde_json::to_vec_pretty(&document()).expect("doc bytes");
    let (status, report) = upload(&app, &id, raw.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["phase"], "loaded");
    assert_eq!(report["source"], "reading.json");
    assert_eq!(report["passages"].as_array().map(Vec::len), Some(2));

    let starts: Vec<u64> = report["passage"]["segments"]
        .as_array()
        .expect("segments")
        .iter()
        .filter_map(|s| s["start"].as_u64())
        .collect();
    assert_eq!(starts, vec![0, 10, 15, 20, 25]);
    let shared = &report["passage"]["segments"][2];
    assert_eq!(shared["covering"], json!(["A", "B"]));
    assert_eq!(report["passage"]["items"][2]["status"], "stop_not_after_start");
    assert_eq!(report["passage"]["items"][2]["status_label"], "stop<=start");

    // Selecting B makes it own the overlap.
    let (status, report) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/select", id),
        Some(json!({ "item": "B" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["passage"]["segments"][2]["primary"], "B");

    let (status, report) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/edits/C", id),
        Some(json!({ "start": "40", "stop": 50 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["phase"], "editing");
    assert_eq!(report["pending_edits"], 1);

    let req = Request::builder()
        .uri(format!("/api/v1/sessions/{}/export", id))
        .body(Body::empty())
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::OK);
    let disposition = resp
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    assert_eq!(disposition.as_deref(), Some("attachment; filename=\"patched_R1.json\""));
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let exported: Value = serde_json::from_slice(&bytes).expect("exported json");

    let mut expected = document();
    expected["passages"][0]["groups"][1]["items"][0]["answer"]["start_index"] = json!(40);
    expected["passages"][0]["groups"][1]["items"][0]["answer"]["stop_index"] = json!(50);
    assert_eq!(exported, expected);

    // Export does not clear edits; reset brings back the original span.
    let (_, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(report["pending_edits"], 1);
    assert_eq!(report["exports"], 1);

    let (status, report) = call(&app, Method::DELETE, &format!("/api/v1/sessions/{}/edits/C", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["phase"], "loaded");
    assert_eq!(report["passage"]["items"][2]["effective"], json!({ "start": 5, "stop": 5 }));
}

#[tokio::test]
async fn export_without_edits_round_trips() {
    let app = app();
    let id = new_session(&app).await;
    let raw = serde_json::to_string_pretty(&document()).expect("doc");
    upload(&app, &id, raw.clone().into_bytes()).await;

    let req = Request::builder()
        .uri(format!("/api/v1/sessions/{}/export", id))
        .body(Body::empty())
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    assert_eq!(String::from_utf8_lossy(&bytes), raw);
}

#[tokio::test]
async fn malformed_upload_keeps_previous_document() {
    let app = app();
    let id = new_session(&app).await;
    upload(&app, &id, serde_json::to_vec(&document()).expect("doc")).await;
    call(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/edits/A", id),
        Some(json!({ "start": 1, "stop": 2 })),
    )
    .await;

    let (status, body) = upload(&app, &id, b"{\"passages\": [".to_vec()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "parse_error");

    let (_, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(report["phase"], "editing");
    assert_eq!(report["pending_edits"], 1);
}

#[tokio::test]
async fn new_upload_and_passage_switch_discard_edits() {
    let app = app();
    let id = new_session(&app).await;
    let raw = serde_json::to_vec(&document()).expect("doc");
    upload(&app, &id, raw.clone()).await;
    let edit_uri = format!("/api/v1/sessions/{}/edits/B", id);
    call(&app, Method::PUT, &edit_uri, Some(json!({ "start": 0, "stop": 3 }))).await;

    let (_, report) = upload(&app, &id, raw.clone()).await;
    assert_eq!(report["pending_edits"], 0);

    call(&app, Method::PUT, &edit_uri, Some(json!({ "start": 0, "stop": 3 }))).await;
    let (status, report) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/passage", id),
        Some(json!({ "index": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["pending_edits"], 0);
    assert_eq!(report["passage_index"], 1);
    assert_eq!(report["passage"]["passage_id"], "R2");
}

#[tokio::test]
async fn error_statuses() {
    let app = app();
    let (status, body) = call(&app, Method::GET, "/api/v1/sessions/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "session_not_found");

    let id = new_session(&app).await;
    let (status, body) = call(&app, Method::GET, &format!("/api/v1/sessions/{}/export", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "no_document");

    upload(&app, &id, serde_json::to_vec(&document()).expect("doc")).await;
    let (status, body) = call(
        &app,
        Method::PUT,
        &format!("/api/v1/sessions/{}/edits/ZZ", id),
        Some(json!({ "start": 1, "stop": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "unknown_item");

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/passage", id),
        Some(json!({ "index": 9 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "passage_out_of_range");

    let (status, _) = call(&app, Method::DELETE, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_upload_is_rejected() {
    let app = app_with(CheckerConfig {
        server: ServerConfig { max_upload_bytes: 64, ..ServerConfig::default() },
        ..CheckerConfig::default()
    });
    let id = new_session(&app).await;
    let (status, body) = upload(&app, &id, serde_json::to_vec(&document()).expect("doc")).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "payload_too_large");
}

#[tokio::test]
async fn malformed_request_bodies_use_error_envelope() {
    let app = app();
    let id = new_session(&app).await;
    upload(&app, &id, serde_json::to_vec(&document()).expect("doc")).await;

    // Wrong field type.
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/v1/sessions/{}/passage", id),
        Some(json!({ "index": -1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["ok"], false);
    assert_eq!(body["error"]["code"], "invalid_body");

    // Missing Content-Type.
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/select", id))
        .body(Body::from(json!({ "item": "A" }).to_string()))
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"]["code"], "invalid_body");

    // Not JSON at all.
    let req = Request::builder()
        .method(Method::POST)
        .uri(format!("/api/v1/sessions/{}/filter", id))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{group_id"))
        .expect("request");
    let resp = app.clone().oneshot(req).await.expect("response");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.expect("body");
    let body: Value = serde_json::from_slice(&bytes).expect("json body");
    assert_eq!(body["error"]["code"], "invalid_body");

    // The session is untouched by rejected requests.
    let (_, report) = call(&app, Method::GET, &format!("/api/v1/sessions/{}", id), None).await;
    assert_eq!(report["passage_index"], 0);
    assert!(report["passage"]["active_item"].is_null());
}
