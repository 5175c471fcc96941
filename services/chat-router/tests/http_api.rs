use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use chat_router::{config::Config, http, state::AppState, stream};
use chat_router_service::Service;
use chat_router_store::Store;
use chat_router_trigger::NoopTrigger;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

// These tests exercise the router directly (no bound TCP socket), the
// same way the receiver's control-api tests drive `build_router`.
fn test_app() -> axum::Router {
    let service = Service::new(Store::open_in_memory().unwrap());
    let (_shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let app_state = AppState::new(service, Arc::new(NoopTrigger), Config::from_env(), shutdown_rx);
    let router = stream::mount(http::build_api_router());
    http::with_middleware(router).with_state(app_state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ingest_then_fetch_unified_timeline() {
    let app = test_app();

    let ingest_body = json!({
        "platform": "telegram",
        "platformMessageId": "m1",
        "platformChatId": "c1",
        "senderName": "Alice",
        "senderId": "u1",
        "text": "hello",
        "timestamp": 1700000000000_i64,
    });
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/messages")
                .header("content-type", "application/json")
                .body(Body::from(ingest_body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = body_json(response).await;
    assert_eq!(created["platformMessageId"], "m1");
    assert!(created["id"].is_i64());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/timeline")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let timeline = body_json(response).await;
    assert_eq!(timeline.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn missing_conversation_returns_404_with_error_envelope() {
    let app = test_app();
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/conversations/telegram/missing")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Conversation not found");
}

#[tokio::test]
async fn ingest_missing_sender_name_returns_400() {
    let app = test_app();
    let body = json!({
        "platform": "telegram",
        "platformMessageId": "m1",
        "platformChatId": "c1",
        "senderName": "",
        "senderId": "u1",
        "timestamp": 0,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/messages")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ingest_missing_timestamp_returns_400_error_envelope_not_422() {
    let app = test_app();
    // `timestamp` entirely absent — the extractor-level failure has to
    // come back through the same `{"error": ...}` contract as a
    // service-level validation failure, not axum's default rejection.
    let body = json!({
        "platform": "telegram",
        "platformMessageId": "m1",
        "platformChatId": "c1",
        "senderName": "Alice",
        "senderId": "u1",
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/messages")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn health_reports_zero_counts_on_fresh_store() {
    let app = test_app();
    let response = app
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["ok"], true);
    assert_eq!(body["messageCount"], 0);
}
