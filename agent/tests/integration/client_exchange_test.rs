//! 疑似HTTPクライアント経由の送信と受信

use crate::support::agent::{action, build_app};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn post_against_real_responder_validates() {
    let responder = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/y"))
        .and(body_string("{}"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&responder)
        .await;
    let (_, app) = build_app(Duration::from_secs(5));

    let error = action(
        &app,
        "/api/http/client/init",
        json!({ "name": "c", "base_url": responder.uri() }),
    )
    .await;
    assert_eq!(error, "");

    let error = action(
        &app,
        "/api/http/client/send",
        json!({ "endpoint_name": "c", "method": "POST", "path": "/y", "payload": "{}" }),
    )
    .await;
    assert_eq!(error, "");

    let error = action(
        &app,
        "/api/http/client/receive",
        json!({ "endpoint_name": "c", "status_code": 201 }),
    )
    .await;
    assert_eq!(error, "");
}

#[tokio::test]
async fn stale_response_is_never_delivered() {
    let responder = MockServer::start().await;
    Mock::given(path("/first"))
        .respond_with(ResponseTemplate::new(201))
        .mount(&responder)
        .await;
    Mock::given(path("/second"))
        .respond_with(ResponseTemplate::new(202))
        .mount(&responder)
        .await;
    let (_, app) = build_app(Duration::from_millis(300));
    action(
        &app,
        "/api/http/client/init",
        json!({ "name": "c", "base_url": responder.uri() }),
    )
    .await;

    for target in ["/first", "/second"] {
        let error = action(
            &app,
            "/api/http/client/send",
            json!({ "endpoint_name": "c", "method": "GET", "path": target }),
        )
        .await;
        assert_eq!(error, "");
        if target == "/first" {
            tokio::time::sleep(Duration::from_millis(900)).await;
        }
    }

    let error = action(
        &app,
        "/api/http/client/receive",
        json!({ "endpoint_name": "c", "status_code": 202 }),
    )
    .await;
    assert_eq!(error, "");
}

#[tokio::test]
async fn json_payload_is_compared_structurally() {
    let responder = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"b":[1,2],"a":"x"}"#, "application/json"),
        )
        .mount(&responder)
        .await;
    let (_, app) = build_app(Duration::from_secs(5));
    action(
        &app,
        "/api/http/client/init",
        json!({ "name": "c", "base_url": responder.uri(), "content_type": "application/json" }),
    )
    .await;

    action(
        &app,
        "/api/http/client/send",
        json!({ "endpoint_name": "c", "method": "GET" }),
    )
    .await;
    let error = action(
        &app,
        "/api/http/client/receive",
        json!({
            "endpoint_name": "c",
            "status_code": 200,
            "payload": "{\"a\": \"x\", \"b\": [1, 2]}",
            "payload_type": "json"
        }),
    )
    .await;

    assert_eq!(error, "");
}
