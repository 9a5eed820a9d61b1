//! エージェント自体の操作（ステータス、シャットダウン、ログ配信）

use crate::log_broadcast::LogSubscription;
use crate::shutdown::ShutdownController;
use crate::AppState;
use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    Json,
};
use futures::{SinkExt, StreamExt};
use test_agent_common::protocol::{ShutdownResponse, StatusResponse};
use tracing::{debug, info, warn};

/// GET /api/agent/status
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        version: state.version.clone(),
    })
}

/// POST /api/agent/shutdown
///
/// 応答を返したあと、サーバーがエンドポイントを片付けてから終了する。
pub async fn shutdown(State(state): State<AppState>) -> Json<ShutdownResponse> {
    info!("Shutdown requested via RPC");
    state.shutdown.request_shutdown();
    Json(ShutdownResponse {})
}

/// GET /api/agent/logs/:listener (WebSocket)
///
/// 接続中はログ1行ごとにテキストフレームを1つ送る。
pub async fn logs(
    ws: WebSocketUpgrade,
    Path(listener): Path<String>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| {
        let subscription = state.log_broadcast.subscribe(listener);
        stream_logs(socket, subscription, state.shutdown.clone())
    })
}

async fn stream_logs(
    socket: WebSocket,
    mut subscription: LogSubscription,
    shutdown: ShutdownController,
) {
    let (mut sender, mut receiver) = socket.split();
    let listener = subscription.listener().to_string();
    debug!(listener = %listener, "log listener connected");

    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut recv_task => {
                debug!(listener = %listener, "log listener disconnected");
                break;
            }
            _ = shutdown.wait() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
            line = subscription.recv() => {
                let Some(line) = line else { break };
                if sender.send(Message::Text(line)).await.is_err() {
                    debug!(listener = %listener, "log listener gone");
                    break;
                }
            }
        }
    }

    recv_task.abort();
}
