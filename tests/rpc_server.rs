mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{harness, FakeBrowser};
use serde_json::{json, Value};
use tower::ServiceExt;
use webext_harness::RpcServer;

fn router(browser: &Arc<FakeBrowser>) -> Router {
    RpcServer::new(Arc::new(harness(browser))).build()
}

fn rpc_request(method: &str, params: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/rpc")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "method": method, "params": params }).to_string(),
        ))
        .unwrap()
}

async fn call(router: &Router, method: &str, params: Value) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(rpc_request(method, params))
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[tokio::test]
async fn status_endpoint_reports_readiness() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let request = Request::builder()
        .method("GET")
        .uri("/status")
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["success"], true);
    assert_eq!(json["data"]["readiness"]["state"], "uninitialized");
}

#[tokio::test]
async fn tab_commands_round_trip() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let (status, body) = call(&router, "getTabs", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (_, body) = call(&router, "createTab", json!({ "url": "https://example.com/" })).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let (status, body) = call(&router, "pinTab", json!({ "tabId": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["pinned"], true);

    let (status, body) = call(&router, "muteTab", json!({ "tabId": id })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["mutedInfo"]["muted"], true);

    let (_, body) = call(&router, "getTab", json!({ "tabId": 12345 })).await;
    assert!(body["data"].is_null());

    let (_, body) = call(
        &router,
        "resizeWindow",
        json!({ "windowId": 1, "width": 800, "height": 600 }),
    )
    .await;
    assert_eq!(body["data"]["width"], 800);
}

#[tokio::test]
async fn remote_failure_maps_to_bad_gateway_with_message() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let (status, body) = call(&router, "closeTab", json!({ "tabId": 42 })).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "remote_error");
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("Invalid tab ID: 42"));
}

#[tokio::test]
async fn bad_requests_are_rejected() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let (status, body) = call(&router, "teleportTab", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "unknown_method");

    let (status, body) = call(&router, "getTab", json!({ "tab": 1 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "invalid_argument");
}

#[tokio::test]
async fn not_ready_maps_to_conflict() {
    let browser = FakeBrowser::new();
    let router = router(&browser);
    let (status, _) = call(&router, "init", Value::Null).await;
    assert_eq!(status, StatusCode::OK);

    browser.set_url("about:debugging");
    let (status, body) = call(&router, "getWindows", Value::Null).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "not_ready");

    let (status, _) = call(&router, "reset", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&router, "getWindows", Value::Null).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn wait_timeout_is_a_success_with_null_data() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let (status, body) = call(
        &router,
        "waitForTabUrl",
        json!({ "pattern": "never.invalid", "timeoutMs": 50, "intervalMs": 10 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert!(body["data"].is_null());
}

#[tokio::test]
async fn events_are_recorded_and_cleared() {
    let browser = FakeBrowser::new();
    let harness = Arc::new(harness(&browser));
    let router = RpcServer::new(harness.clone()).build();
    harness.init().await.unwrap();
    browser.open_tab("https://example.com/evt");

    let (_, body) = call(&router, "getEvents", json!({ "category": "tab" })).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["type"], "created");
    assert_eq!(browser.calls("getEvents"), 2);

    call(&router, "clearEvents", Value::Null).await;
    let (_, body) = call(&router, "getEvents", json!({ "category": "tab" })).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn extension_message_reply_is_passed_through() {
    let browser = FakeBrowser::new();
    let router = router(&browser);

    let (status, body) = call(
        &router,
        "sendToExtension",
        json!({ "extensionId": common::HELPER_EXTENSION, "message": { "n": 1 } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!({ "echo": { "n": 1 } }));
}
