//! エンドポイント
//!
//! 疑似HTTPクライアント、疑似HTTPサーバー、外部プロセスの3種類。

pub mod action;
pub mod command;
pub mod http_client;
pub mod http_server;

use test_agent_common::error::{AgentResult, ValidationErrors};

pub use command::CommandEndpoint;
pub use http_client::{HttpClientEndpoint, ReceiveFailure, ReceivedResponse};
pub use http_server::{HttpServerEndpoint, InboundRequest};

/// 受信アクションの結果
///
/// 検証に失敗しても実際に受信したメッセージは返す。合否は呼び出し側が判断する。
#[derive(Debug)]
pub struct Received<T> {
    /// 実際に受信したメッセージ
    pub message: T,
    /// 集約された検証結果
    pub validation: Result<(), ValidationErrors>,
}

impl<T> Received<T> {
    /// 検証に成功したか
    pub fn is_valid(&self) -> bool {
        self.validation.is_ok()
    }

    /// 検証エラーを `AgentError::ValidationMismatch` に変換する
    pub fn into_result(self) -> AgentResult<T> {
        self.validation?;
        Ok(self.message)
    }
}
