mod common;

use common::{FakeApi, key, translation};
use lokalise_mcp::mcp::{LokaliseMcpService, MISSING_API_KEY_TEXT, ToolAuditLog};
use rmcp::model::JsonObject;
use serde_json::{Value, json};

fn args(value: Value) -> Option<JsonObject> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn server() -> (FakeApi, LokaliseMcpService) {
    let api = FakeApi::new()
        .with_project("p1", "Watt", Some("Energy dashboard"))
        .with_key(
            "p1",
            key(1, "error_message")
                .tags(&["urgent"])
                .with_translation(translation(11, 1, "en", "Oops"))
                .build(),
        );
    let server = LokaliseMcpService::new(Some(api.service()));
    (api, server)
}

#[tokio::test]
async fn add_keys_summarises_success() {
    let (api, server) = server();
    let text = server
        .call_text(
            "add_lokalise_keys",
            args(json!({ "projectName": "Watt", "keys": [{ "keyName": "hello", "defaultValue": "Hi" }] })),
        )
        .await;

    assert!(text.starts_with("Successfully added 1 key(s) to project \"Watt\". Result: {"), "{text}");
    assert_eq!(api.calls().create_keys, 1);
}

#[tokio::test]
async fn missing_arguments_use_fixed_texts() {
    let (api, server) = server();
    assert_eq!(
        server.call_text("add_lokalise_keys", args(json!({ "projectName": "Watt", "keys": [] }))).await,
        "Error: projectName and at least one key are required."
    );
    assert_eq!(
        server.call_text("manage_lokalise_translations", args(json!({ "projectName": "Watt" }))).await,
        "Error: projectName and at least one translation item are required."
    );
    assert_eq!(
        server.call_text("search_lokalise_keys", None).await,
        "Error: projectName and search criteria are required."
    );
    assert_eq!(api.calls(), common::Calls::default());
}

#[tokio::test]
async fn operation_errors_become_error_text() {
    let (_api, server) = server();
    let text = server
        .call_text(
            "delete_lokalise_keys",
            args(json!({ "projectName": "Watt", "keys": [{ "keyName": "missing" }] })),
        )
        .await;
    assert_eq!(text, "Error: key named \"missing\" not found in project \"Watt\"");

    let unknown = server.call_text("rename_everything", None).await;
    assert_eq!(unknown, "Error: Unknown tool: rename_everything");
}

#[tokio::test]
async fn search_renders_readable_blocks() {
    let (_api, server) = server();
    let text = server
        .call_text(
            "search_lokalise_keys",
            args(json!({ "projectName": "Watt", "criteria": { "tags": ["urgent"] }, "limit": 5 })),
        )
        .await;

    assert!(text.starts_with("Search Results for \"Watt\"\nFound 1 key(s) matching criteria"), "{text}");
    assert!(text.contains("Key: error_message"));
    assert!(text.contains("Translations: en: \"Oops\""));
    assert!(text.contains("Match reasons: Has tags: urgent"));
}

#[tokio::test]
async fn invalid_limit_is_reported() {
    let (_api, server) = server();
    let text = server
        .call_text(
            "search_lokalise_keys",
            args(json!({ "projectName": "Watt", "criteria": {}, "limit": 0 })),
        )
        .await;
    assert!(text.starts_with("Error: limit must be a positive number"), "{text}");
}

#[tokio::test]
async fn projects_listing_mentions_filter() {
    let (_api, server) = server();
    let text =
        server.call_text("search_available_projects", args(json!({ "searchTerm": "energy" }))).await;
    assert!(text.starts_with("Available Projects (filtered by: \"energy\")\nFound 1 project(s)"), "{text}");
    assert!(text.contains("ID: p1"));
}

#[tokio::test]
async fn no_credential_means_fixed_error() {
    let server = LokaliseMcpService::new(None);
    assert_eq!(server.call_text("search_available_projects", None).await, MISSING_API_KEY_TEXT);
}

#[tokio::test]
async fn audit_log_records_failure_kind() {
    let dir = tempfile::tempdir().unwrap();
    let audit = ToolAuditLog::open(dir.path().join("logs/tools.log")).await.unwrap();
    let (_api, server) = server();
    let server = server.with_audit_log(audit.clone());

    server
        .call_text(
            "delete_lokalise_keys",
            args(json!({ "projectName": "Watt", "keys": [{ "keyName": "missing" }] })),
        )
        .await;
    server.call_text("search_available_projects", args(json!({}))).await;

    let content = tokio::fs::read_to_string(audit.path()).await.unwrap();
    let entries: Vec<Value> = content.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(entries.len(), 4);
    assert_eq!(entries[1]["category"], "error");
    assert_eq!(entries[1]["details"]["kind"], "not_found");
    assert_eq!(entries[3]["category"], "response");
    assert!(entries[3]["details"].get("kind").is_none());
}
