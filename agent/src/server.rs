//! axumサーバー起動・シャットダウンハンドリング

use crate::shutdown::ShutdownController;
use crate::AppState;
use anyhow::Context;
use tracing::{info, warn};

/// RPCサーバーを起動し、シャットダウンシグナルを待機する
///
/// シグナル受信後、接続の受付を止める前に全エンドポイントを停止する。
pub async fn run(state: AppState, bind_addr: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind to {}", bind_addr))?;

    serve(state, listener).await
}

/// バインド済みのリスナーでRPCサーバーを動かす
pub async fn serve(state: AppState, listener: tokio::net::TcpListener) -> anyhow::Result<()> {
    let local_addr = listener.local_addr()?;
    let shutdown = shutdown_signal(state.clone());
    let app = crate::api::create_router(state);

    info!("Test agent listening on {}", local_addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// シグナルを待ってからエンドポイントを片付ける
async fn shutdown_signal(state: AppState) {
    wait_for_signal(state.shutdown.clone()).await;
    state.shutdown_endpoints().await;
    info!("All endpoints shut down");
}

/// シャットダウンシグナルを待機
async fn wait_for_signal(shutdown: ShutdownController) {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler - {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!("failed to install signal handler - {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate => {
            info!("Received SIGTERM, shutting down...");
        }
        _ = shutdown.wait() => {
            info!("Shutdown requested, shutting down...");
        }
    }
}
