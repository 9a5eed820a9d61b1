use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::time::Duration;
use test_agent::config::ActionTimeout;
use test_agent::log_broadcast::LogBroadcast;
use test_agent::{api, AppState};
use tower::ServiceExt;

/// 指定したアクションタイムアウトでアプリケーション状態を作る
pub fn test_state(action_timeout: Duration) -> AppState {
    AppState::new(ActionTimeout::new(action_timeout), LogBroadcast::new())
}

/// 状態とRPCルーターの組
pub fn build_app(action_timeout: Duration) -> (AppState, Router) {
    let state = test_state(action_timeout);
    let app = api::create_router(state.clone());
    (state, app)
}

/// JSONをPOSTし、ステータスとJSONボディを返す
pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, post_request(uri, Body::from(body.to_string()))).await
}

/// 任意のボディをPOSTする
pub async fn post_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    send(app, post_request(uri, Body::from(body.to_string()))).await
}

/// GETしてステータスとJSONボディを返す
pub async fn get_json(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

/// アクションRPCを呼び、`error` 文字列を返す
pub async fn action(app: &Router, uri: &str, body: Value) -> String {
    let (status, json) = post_json(app, uri, body).await;
    assert_eq!(status, StatusCode::OK, "unexpected status for {}", uri);
    json["error"]
        .as_str()
        .unwrap_or_else(|| panic!("missing error field in {}", json))
        .to_string()
}

fn post_request(uri: &str, body: Body) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(body)
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}
