//! 外部プロセスのアクション

use super::{parse, parse_init, respond};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use test_agent_common::protocol::{ActionResponse, InitCommandRequest, ShutdownCommandRequest};

/// POST /api/cmd/init
pub async fn init_command(
    State(state): State<AppState>,
    payload: Result<Json<InitCommandRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse_init(payload) {
        Ok(request) => state.commands.init(request).await,
        Err(err) => Err(err),
    };
    respond("init command", result)
}

/// POST /api/cmd/shutdown
pub async fn shutdown_command(
    State(state): State<AppState>,
    payload: Result<Json<ShutdownCommandRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse(payload) {
        Ok(request) => state.commands.shutdown(request).await,
        Err(err) => Err(err),
    };
    respond("shutdown command", result)
}
