//! Contract Test: /api/http/client/*

use crate::support::agent::{action, build_app};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn init_with_blank_name_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/http/client/init",
        json!({ "name": "", "base_url": "http://localhost" }),
    )
    .await;

    assert_eq!(
        error,
        "invalid configuration - cannot create HTTP client endpoint - name is empty"
    );
}

#[tokio::test]
async fn init_twice_keeps_second_configuration() {
    let (state, app) = build_app(Duration::from_secs(1));

    for base_url in ["http://first.invalid", "http://second.invalid"] {
        let error = action(
            &app,
            "/api/http/client/init",
            json!({ "name": "a", "base_url": base_url }),
        )
        .await;
        assert_eq!(error, "");
    }

    let registry = state.http_clients.registry();
    assert_eq!(registry.names().await, vec!["a".to_string()]);
    assert_eq!(
        registry.get("a").await.unwrap().base_url(),
        "http://second.invalid"
    );
}

#[tokio::test]
async fn send_to_unknown_endpoint_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/http/client/send",
        json!({ "endpoint_name": "ghost", "method": "GET" }),
    )
    .await;

    assert_eq!(error, "HTTP client endpoint [ghost] not found");
}

#[tokio::test]
async fn send_without_method_fails_synchronously() {
    let (_, app) = build_app(Duration::from_secs(1));
    action(
        &app,
        "/api/http/client/init",
        json!({ "name": "a", "base_url": "http://localhost" }),
    )
    .await;

    let error = action(
        &app,
        "/api/http/client/send",
        json!({ "endpoint_name": "a", "path": "/x" }),
    )
    .await;

    assert_eq!(
        error,
        "invalid action - send action is invalid - missing HTTP method"
    );
}

#[tokio::test]
async fn receive_without_send_times_out() {
    let (_, app) = build_app(Duration::from_millis(150));
    action(
        &app,
        "/api/http/client/init",
        json!({ "name": "a", "base_url": "http://localhost" }),
    )
    .await;

    let error = action(
        &app,
        "/api/http/client/receive",
        json!({ "endpoint_name": "a", "status_code": 200 }),
    )
    .await;

    assert_eq!(
        error,
        "receive action timed out - no response received for validation"
    );
}
