//! Contract Test: /api/cmd/*

use crate::support::agent::{action, build_app};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn init_with_empty_cmd_fails() {
    let (state, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/cmd/init",
        json!({ "name": "c", "cmd_components": [] }),
    )
    .await;

    assert_eq!(
        error,
        "invalid configuration - cannot create command endpoint [c] - cmd is empty"
    );
    assert!(state.commands.registry().is_empty().await);
}

#[tokio::test]
async fn init_with_blank_name_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/cmd/init",
        json!({ "name": " ", "cmd_components": ["sleep", "1"] }),
    )
    .await;

    assert_eq!(
        error,
        "invalid configuration - cannot create command endpoint - name is empty"
    );
}

#[tokio::test]
async fn init_with_missing_binary_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/cmd/init",
        json!({ "name": "c", "cmd_components": ["/nonexistent/test-agent-binary"] }),
    )
    .await;

    assert!(error.starts_with("launch failed - cannot start command endpoint [c]"), "{}", error);
}

#[tokio::test]
async fn shutdown_unknown_endpoint_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(&app, "/api/cmd/shutdown", json!({ "name": "ghost" })).await;

    assert_eq!(error, "command endpoint [ghost] not found");
}
