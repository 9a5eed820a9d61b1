//! Contract Test: /api/agent/*

use crate::support::agent::{build_app, get_json, post_json, post_raw};
use axum::http::StatusCode;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn status_reports_version() {
    let (_, app) = build_app(Duration::from_secs(1));

    let (status, body) = get_json(&app, "/api/agent/status").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "version": test_agent::VERSION }));
}

#[tokio::test]
async fn shutdown_acknowledges_and_requests_shutdown() {
    let (state, app) = build_app(Duration::from_secs(1));

    let (status, body) = post_json(&app, "/api/agent/shutdown", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({}));
    assert!(state.shutdown.is_shutdown_requested());
}

#[tokio::test]
async fn malformed_body_is_reported_as_error_string() {
    let (_, app) = build_app(Duration::from_secs(1));

    let (status, body) = post_raw(&app, "/api/http/client/send", "{not json").await;

    assert_eq!(status, StatusCode::OK);
    let error = body["error"].as_str().unwrap();
    assert!(error.starts_with("invalid action - malformed request"), "{}", error);
}

#[tokio::test]
async fn malformed_init_is_reported_as_invalid_configuration() {
    let (state, app) = build_app(Duration::from_secs(1));

    let (status, body) = post_raw(
        &app,
        "/api/http/server/init",
        r#"{"name":"s","port":70000}"#,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with("invalid configuration - malformed request"),
        "{}",
        error
    );
    assert!(state.http_servers.registry().is_empty().await);

    let (_, body) = post_raw(&app, "/api/cmd/init", "{not json").await;
    let error = body["error"].as_str().unwrap();
    assert!(
        error.starts_with("invalid configuration - malformed request"),
        "{}",
        error
    );
}

#[tokio::test]
async fn unknown_route_is_not_found() {
    let (_, app) = build_app(Duration::from_secs(1));

    let (status, _) = post_json(&app, "/api/unknown", json!({})).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}
