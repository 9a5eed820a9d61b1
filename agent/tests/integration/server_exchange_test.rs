//! 疑似HTTPサーバー経由のリクエスト受信とレスポンス返却

use crate::support::agent::{action, build_app};
use serde_json::json;
use std::time::Duration;

#[tokio::test]
async fn external_request_is_validated_and_answered() {
    let (state, app) = build_app(Duration::from_secs(5));
    let error = action(
        &app,
        "/api/http/server/init",
        json!({ "name": "orders", "port": 0 }),
    )
    .await;
    assert_eq!(error, "");
    let addr = state
        .http_servers
        .registry()
        .get("orders")
        .await
        .unwrap()
        .local_addr()
        .await
        .unwrap();

    let external = tokio::spawn(async move {
        let response = reqwest::get(format!(
            "http://127.0.0.1:{}/orders?status=open",
            addr.port()
        ))
        .await
        .unwrap();
        (response.status(), response.text().await.unwrap())
    });

    let error = action(
        &app,
        "/api/http/server/receive",
        json!({
            "endpoint_name": "orders",
            "path": "orders",
            "method": "GET",
            "query_params": { "status": ["open"] }
        }),
    )
    .await;
    assert_eq!(error, "");

    let error = action(
        &app,
        "/api/http/server/send",
        json!({
            "endpoint_name": "orders",
            "status_code": 200,
            "payload": "{\"ok\":true}"
        }),
    )
    .await;
    assert_eq!(error, "");

    let (status, body) = external.await.unwrap();
    assert_eq!(status, reqwest::StatusCode::OK);
    assert_eq!(body, "{\"ok\":true}");
    state.shutdown_endpoints().await;
}

#[tokio::test]
async fn mismatching_request_reports_every_facet() {
    let (state, app) = build_app(Duration::from_secs(5));
    action(
        &app,
        "/api/http/server/init",
        json!({ "name": "s", "port": 0 }),
    )
    .await;
    let addr = state
        .http_servers
        .registry()
        .get("s")
        .await
        .unwrap()
        .local_addr()
        .await
        .unwrap();

    let external = tokio::spawn(async move {
        reqwest::Client::new()
            .post(format!("http://127.0.0.1:{}/items?tag=a", addr.port()))
            .header("content-type", "application/json")
            .body(r#"{"id":1}"#)
            .send()
            .await
            .unwrap()
            .status()
    });

    let error = action(
        &app,
        "/api/http/server/receive",
        json!({
            "endpoint_name": "s",
            "path": "items",
            "method": "PUT",
            "query_params": { "tag": ["a", "b"] },
            "payload": "{\"id\":2}",
            "payload_type": "json"
        }),
    )
    .await;
    let lines: Vec<&str> = error.lines().collect();
    assert_eq!(lines.len(), 3, "{}", error);
    assert!(error.contains("method mismatch - expected [PUT] but received [POST]"));
    assert!(error.contains("query param <tag> values mismatch"));
    assert!(error.contains("json validation errors"));

    action(
        &app,
        "/api/http/server/send",
        json!({ "endpoint_name": "s", "status_code": 422 }),
    )
    .await;
    assert_eq!(external.await.unwrap().as_u16(), 422);
    state.shutdown_endpoints().await;
}
