//! 疑似HTTPクライアント・サーバーのアクション

use super::{parse, parse_init, respond};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use test_agent_common::protocol::{
    ActionResponse, ClientReceiveRequest, ClientSendRequest, InitClientRequest,
    InitServerRequest, ServerReceiveRequest, ServerSendRequest,
};

/// POST /api/http/client/init
pub async fn init_client(
    State(state): State<AppState>,
    payload: Result<Json<InitClientRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse_init(payload) {
        Ok(request) => state.http_clients.init(request).await,
        Err(err) => Err(err),
    };
    respond("init HTTP client", result)
}

/// POST /api/http/client/send
pub async fn client_send(
    State(state): State<AppState>,
    payload: Result<Json<ClientSendRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse(payload) {
        Ok(request) => state.http_clients.send(request).await,
        Err(err) => Err(err),
    };
    respond("HTTP client send", result)
}

/// POST /api/http/client/receive
pub async fn client_receive(
    State(state): State<AppState>,
    payload: Result<Json<ClientReceiveRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse(payload) {
        Ok(request) => state.http_clients.receive(request).await,
        Err(err) => Err(err),
    };
    respond("HTTP client receive", result)
}

/// POST /api/http/server/init
pub async fn init_server(
    State(state): State<AppState>,
    payload: Result<Json<InitServerRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse_init(payload) {
        Ok(request) => state.http_servers.init(request).await,
        Err(err) => Err(err),
    };
    respond("init HTTP server", result)
}

/// POST /api/http/server/send
pub async fn server_send(
    State(state): State<AppState>,
    payload: Result<Json<ServerSendRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse(payload) {
        Ok(request) => state.http_servers.send(request).await,
        Err(err) => Err(err),
    };
    respond("HTTP server send", result)
}

/// POST /api/http/server/receive
pub async fn server_receive(
    State(state): State<AppState>,
    payload: Result<Json<ServerReceiveRequest>, JsonRejection>,
) -> Json<ActionResponse> {
    let result = match parse(payload) {
        Ok(request) => state.http_servers.receive(request).await,
        Err(err) => Err(err),
    };
    respond("HTTP server receive", result)
}
