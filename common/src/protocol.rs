//! 通信プロトコル定義
//!
//! ドライバー↔エージェント間のRPCメッセージ（JSON）

use crate::error::AgentResult;
use crate::types::{Headers, PayloadType, QueryParams};
use serde::{Deserialize, Serialize};

/// ステータスレスポンス
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// エージェントのバージョン
    pub version: String,
}

/// シャットダウンレスポンス（空）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShutdownResponse {}

/// アクション結果
///
/// 成功時は `error` が空文字列になる。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActionResponse {
    /// エラーメッセージ（成功時は空）
    #[serde(default)]
    pub error: String,
}

impl ActionResponse {
    /// 成功レスポンス
    pub fn ok() -> Self {
        Self::default()
    }

    /// 結果からレスポンスを作成
    pub fn from_result<T>(result: AgentResult<T>) -> Self {
        match result {
            Ok(_) => Self::ok(),
            Err(err) => Self {
                error: err.to_string(),
            },
        }
    }

    /// 成功したか
    pub fn is_ok(&self) -> bool {
        self.error.is_empty()
    }
}

/// HTTPクライアントエンドポイント初期化リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitClientRequest {
    /// エンドポイント名
    pub name: String,
    /// ベースURL
    #[serde(default)]
    pub base_url: String,
    /// デフォルトのContent-Type
    #[serde(default)]
    pub content_type: String,
    /// リクエストタイムアウト（秒、0ならデフォルト10秒）
    #[serde(default)]
    pub timeout_seconds: u64,
}

/// HTTPサーバーエンドポイント初期化リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitServerRequest {
    /// エンドポイント名
    pub name: String,
    /// 待ち受けポート
    pub port: u16,
    /// デフォルトのContent-Type
    #[serde(default)]
    pub content_type: String,
    /// 書き込みタイムアウト（秒、0なら無制限）
    #[serde(default)]
    pub timeout_seconds: u64,
}

/// HTTPクライアント送信アクション
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientSendRequest {
    /// アクション名（ログ用）
    #[serde(default)]
    pub name: String,
    /// 対象エンドポイント名
    pub endpoint_name: String,
    /// HTTPメソッド
    #[serde(default)]
    pub method: String,
    /// URL（空ならエンドポイントのベースURL）
    #[serde(default)]
    pub url: String,
    /// URLに連結するパス
    #[serde(default)]
    pub path: String,
    /// ヘッダー
    #[serde(default)]
    pub headers: Headers,
    /// クエリパラメーター
    #[serde(default)]
    pub query_params: QueryParams,
    /// ペイロード
    #[serde(default)]
    pub payload: String,
}

/// HTTPクライアント受信アクション
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientReceiveRequest {
    /// アクション名（ログ用）
    #[serde(default)]
    pub name: String,
    /// 対象エンドポイント名
    pub endpoint_name: String,
    /// 期待するステータスコード
    pub status_code: u16,
    /// 期待するヘッダー
    #[serde(default)]
    pub headers: Headers,
    /// 期待するペイロード（空なら検証しない）
    #[serde(default)]
    pub payload: String,
    /// ペイロードの比較方法
    #[serde(default)]
    pub payload_type: PayloadType,
}

/// HTTPサーバー送信アクション（レスポンス）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerSendRequest {
    /// アクション名（ログ用）
    #[serde(default)]
    pub name: String,
    /// 対象エンドポイント名
    pub endpoint_name: String,
    /// ステータスコード
    pub status_code: u16,
    /// ヘッダー
    #[serde(default)]
    pub headers: Headers,
    /// ペイロード
    #[serde(default)]
    pub payload: String,
}

/// HTTPサーバー受信アクション（リクエスト検証）
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerReceiveRequest {
    /// アクション名（ログ用）
    #[serde(default)]
    pub name: String,
    /// 対象エンドポイント名
    pub endpoint_name: String,
    /// 期待するパス
    #[serde(default)]
    pub path: String,
    /// 期待するメソッド
    #[serde(default)]
    pub method: String,
    /// 期待するヘッダー
    #[serde(default)]
    pub headers: Headers,
    /// 期待するクエリパラメーター
    #[serde(default)]
    pub query_params: QueryParams,
    /// 期待するペイロード（空なら検証しない）
    #[serde(default)]
    pub payload: String,
    /// ペイロードの比較方法
    #[serde(default)]
    pub payload_type: PayloadType,
}

/// コマンドエンドポイント初期化リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InitCommandRequest {
    /// エンドポイント名
    pub name: String,
    /// 実行ファイルと引数（先頭が実行ファイル）
    #[serde(default)]
    pub cmd_components: Vec<String>,
    /// 起動後の待機時間（ミリ秒、0ならデフォルト1ミリ秒）
    #[serde(default)]
    pub warmup_millis: u64,
}

/// コマンドエンドポイント停止リクエスト
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShutdownCommandRequest {
    /// エンドポイント名
    pub name: String,
}
