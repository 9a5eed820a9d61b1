//! RPCハンドラー
//!
//! テストドライバーからのJSONリクエストを受け取り、サービスに振り分ける。
//! アクションの結果は常にHTTP 200で返し、失敗は `error` 文字列で表す。

pub mod agent;
pub mod cmd;
pub mod http;

use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{
    routing::{get, post},
    Json, Router,
};
use test_agent_common::error::{AgentError, AgentResult};
use test_agent_common::protocol::ActionResponse;
use tower_http::trace::TraceLayer;
use tracing::error;

/// RPCルーターを作成
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/agent/status", get(agent::status))
        .route("/api/agent/shutdown", post(agent::shutdown))
        .route("/api/agent/logs/:listener", get(agent::logs))
        .route("/api/http/client/init", post(http::init_client))
        .route("/api/http/client/send", post(http::client_send))
        .route("/api/http/client/receive", post(http::client_receive))
        .route("/api/http/server/init", post(http::init_server))
        .route("/api/http/server/send", post(http::server_send))
        .route("/api/http/server/receive", post(http::server_receive))
        .route("/api/cmd/init", post(cmd::init_command))
        .route("/api/cmd/shutdown", post(cmd::shutdown_command))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// JSONボディの取り出し。壊れたボディは `InvalidAction` として扱う
pub(crate) fn parse<T>(payload: Result<Json<T>, JsonRejection>) -> AgentResult<T> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AgentError::InvalidAction(malformed(&rejection)))
}

/// 初期化リクエストの取り出し。範囲外のポートなどは `InvalidConfig` になる
pub(crate) fn parse_init<T>(payload: Result<Json<T>, JsonRejection>) -> AgentResult<T> {
    payload
        .map(|Json(request)| request)
        .map_err(|rejection| AgentError::InvalidConfig(malformed(&rejection)))
}

fn malformed(rejection: &JsonRejection) -> String {
    format!("malformed request - {}", rejection.body_text())
}

/// 結果をアクションレスポンスに変換し、失敗はログに残す
pub(crate) fn respond<T>(operation: &str, result: AgentResult<T>) -> Json<ActionResponse> {
    if let Err(err) = &result {
        error!(operation, "{}", err);
    }
    Json(ActionResponse::from_result(result))
}
