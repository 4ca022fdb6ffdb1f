mod common;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode},
};
use common::FakeApi;
use lokalise_mcp::web::http::{self, HttpState};
use serde_json::{Value, json};
use tower::ServiceExt;

fn router_for(api: &FakeApi) -> Router {
    http::build_router(HttpState::new(Some(api.service())))
}

async fn send(router: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(value) => {
            builder = builder.header("content-type", "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let response = router.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

#[tokio::test]
async fn health_lists_endpoints() {
    let router = http::build_router(HttpState::new(None));
    let (status, body) = send(router, Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["endpoints"].as_array().unwrap().len(), 3);
    assert!(body["timestamp"].as_str().unwrap().contains('T'));
}

#[tokio::test]
async fn add_key_defaults_to_all_platforms() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-key",
        Some(json!({ "projectName": "Watt", "keyName": "hello", "defaultValue": "Hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(body["result"]["keys"][0]["key_name"], "hello");
    let sent = &api.create_requests()[0].keys[0];
    assert_eq!(sent.platforms.len(), 4);
}

#[tokio::test]
async fn add_key_requires_fields() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-key",
        Some(json!({ "projectName": "Watt", "keyName": "hello" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["required"], json!(["projectName", "keyName", "defaultValue"]));
    assert_eq!(body["optional"], json!(["platforms", "description", "tags"]));
    assert_eq!(api.calls(), common::Calls::default());
}

#[tokio::test]
async fn add_keys_reports_offending_index() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-keys",
        Some(json!({
            "projectName": "Watt",
            "keys": [
                { "keyName": "a", "defaultValue": "A" },
                { "keyName": "b" }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["keyIndex"], 1);
    assert_eq!(body["key"], json!({ "keyName": "b" }));
    assert_eq!(
        body["error"],
        "Invalid key at index 1. keyName and defaultValue are required."
    );
    assert_eq!(api.calls().create_keys, 0);
}

#[tokio::test]
async fn add_keys_without_keys_shows_example() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-keys",
        Some(json!({ "projectName": "Watt", "keys": [] })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["required"], json!(["projectName", "keys"]));
    assert_eq!(body["example"]["keys"][0]["keyName"], "hello_world");
}

#[tokio::test]
async fn add_keys_summarises_batch() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-keys",
        Some(json!({
            "projectName": "Watt",
            "keys": [
                { "keyName": "a", "defaultValue": "A", "platforms": ["web"] },
                { "keyName": "b", "defaultValue": "B", "tags": ["x"] }
            ]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["summary"], json!({ "projectName": "Watt", "keysAdded": 2, "keys": ["a", "b"] }));
    assert_eq!(api.calls().create_keys, 1);
}

#[tokio::test]
async fn missing_credential_is_a_server_error() {
    let router = http::build_router(HttpState::new(None));
    let (status, body) = send(
        router,
        Method::POST,
        "/add-key",
        Some(json!({ "projectName": "Watt", "keyName": "hello", "defaultValue": "Hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "LOKALISE_API_KEY environment variable is required.");
}

#[tokio::test]
async fn operation_failures_carry_remote_details() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    api.fail_create_with(400, json!({ "error": { "message": "Key name is not unique", "code": 400 } }));

    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-key",
        Some(json!({ "projectName": "Watt", "keyName": "hello", "defaultValue": "Hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "invalid key data: Key name is not unique");
    assert_eq!(body["details"]["error"]["code"], 400);
}

#[tokio::test]
async fn unknown_project_is_reported_without_details() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-key",
        Some(json!({ "projectName": "Other", "keyName": "hello", "defaultValue": "Hi" })),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "project named \"Other\" not found");
    assert!(body.get("details").is_none());
}

#[tokio::test]
async fn add_keys_reports_non_object_item_by_index() {
    let api = FakeApi::new().with_project("p1", "Watt", None);
    let (status, body) = send(
        router_for(&api),
        Method::POST,
        "/add-keys",
        Some(json!({
            "projectName": "Watt",
            "keys": [{ "keyName": "a", "defaultValue": "A" }, 42]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["keyIndex"], 1);
    assert_eq!(body["key"], 42);
    assert_eq!(
        body["error"],
        "Invalid key at index 1. keyName and defaultValue are required."
    );
    assert_eq!(api.calls().create_keys, 0);
}
