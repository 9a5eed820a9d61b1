//! Test Agent
//!
//! テストドライバーからRPCで操作される疑似HTTPクライアント・疑似HTTPサーバー・
//! 外部プロセスを管理し、実際の通信内容を期待値と照合するエージェント

#![warn(missing_docs)]

/// RPCハンドラー
pub mod api;
/// CLIインターフェース
pub mod cli;
/// 設定読み込みとアクションタイムアウト
pub mod config;
/// エンドポイント（HTTPクライアント / HTTPサーバー / 外部プロセス）
pub mod endpoint;
/// ログ配信
pub mod log_broadcast;
/// ロギング初期化
pub mod logging;
/// エンドポイントレジストリ
pub mod registry;
/// タイムアウト付きランデブー
pub mod rendezvous;
/// axumサーバー起動・シャットダウンハンドリング
pub mod server;
/// エンドポイント種別ごとのサービス
pub mod service;
/// Shutdown controller
pub mod shutdown;
/// 検証エンジン
pub mod validation;

use config::ActionTimeout;
use log_broadcast::LogBroadcast;
use service::{CommandService, HttpClientService, HttpServerService};
use shutdown::ShutdownController;
use std::sync::Arc;
use validation::{JsonComparator, StructuralJsonComparator};

/// エージェントのバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// アプリケーション状態
#[derive(Clone)]
pub struct AppState {
    /// エージェントのバージョン
    pub version: String,
    /// アクションタイムアウト（全エンドポイントで共有）
    pub action_timeout: ActionTimeout,
    /// ログ配信
    pub log_broadcast: LogBroadcast,
    /// HTTPクライアントサービス
    pub http_clients: HttpClientService,
    /// HTTPサーバーサービス
    pub http_servers: HttpServerService,
    /// 外部プロセスサービス
    pub commands: CommandService,
    /// Cooperative shutdown controller
    pub shutdown: ShutdownController,
}

impl AppState {
    /// 組み込みのJSON比較器で状態を作成
    pub fn new(action_timeout: ActionTimeout, log_broadcast: LogBroadcast) -> Self {
        Self::with_comparator(
            action_timeout,
            log_broadcast,
            Arc::new(StructuralJsonComparator),
        )
    }

    /// JSON比較器を指定して状態を作成
    pub fn with_comparator(
        action_timeout: ActionTimeout,
        log_broadcast: LogBroadcast,
        comparator: Arc<dyn JsonComparator>,
    ) -> Self {
        Self {
            version: VERSION.to_string(),
            http_clients: HttpClientService::new(action_timeout.clone(), comparator.clone()),
            http_servers: HttpServerService::new(action_timeout.clone(), comparator),
            commands: CommandService::new(),
            action_timeout,
            log_broadcast,
            shutdown: ShutdownController::default(),
        }
    }

    /// 登録中のすべてのエンドポイントを停止する
    pub async fn shutdown_endpoints(&self) {
        tokio::join!(
            self.http_clients.registry().shutdown_all(),
            self.http_servers.registry().shutdown_all(),
            self.commands.registry().shutdown_all(),
        );
    }
}
