//! Contract Test: /api/http/server/*

use crate::support::agent::{action, build_app};
use crate::support::http::free_port;
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn init_starts_listener_on_requested_port() {
    let (state, app) = build_app(Duration::from_secs(1));
    let port = free_port();

    let error = action(
        &app,
        "/api/http/server/init",
        json!({ "name": "s", "port": port }),
    )
    .await;

    assert_eq!(error, "");
    let endpoint = state.http_servers.registry().get("s").await.unwrap();
    assert_eq!(endpoint.local_addr().await.unwrap().port(), port);
    state.shutdown_endpoints().await;
}

#[tokio::test]
async fn init_on_busy_port_fails() {
    let (state, app) = build_app(Duration::from_secs(1));
    let busy = std::net::TcpListener::bind("0.0.0.0:0").unwrap();
    let port = busy.local_addr().unwrap().port();

    let error = action(
        &app,
        "/api/http/server/init",
        json!({ "name": "s", "port": port }),
    )
    .await;

    assert!(
        error.starts_with("invalid configuration - cannot start HTTP server endpoint [s]"),
        "{}",
        error
    );
    assert!(state.http_servers.registry().is_empty().await);
}

#[tokio::test]
async fn receive_on_unknown_endpoint_fails() {
    let (_, app) = build_app(Duration::from_secs(1));

    let error = action(
        &app,
        "/api/http/server/receive",
        json!({ "endpoint_name": "ghost", "path": "/" }),
    )
    .await;

    assert_eq!(error, "HTTP server endpoint [ghost] not found");
}

#[tokio::test]
async fn send_without_waiting_request_times_out() {
    let (state, app) = build_app(Duration::from_millis(150));
    action(
        &app,
        "/api/http/server/init",
        json!({ "name": "s", "port": 0 }),
    )
    .await;

    let error = action(
        &app,
        "/api/http/server/send",
        json!({ "endpoint_name": "s", "status_code": 200 }),
    )
    .await;

    assert_eq!(
        error,
        "send action timed out - no request waiting for a response"
    );
    state.shutdown_endpoints().await;
}
