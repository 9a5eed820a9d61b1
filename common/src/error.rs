//! エラー型定義
//!
//! 統一エラー型（thiserror使用）
//!
//! RPC層ではすべてのエラーが人間可読な文字列として返される。
//! 呼び出し側は文字列が空かどうかだけで成否を判断する。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// エンドポイントの種類
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
    /// HTTPクライアント
    HttpClient,
    /// HTTPサーバー
    HttpServer,
    /// 外部プロセス
    Command,
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpClient => write!(f, "HTTP client"),
            Self::HttpServer => write!(f, "HTTP server"),
            Self::Command => write!(f, "command"),
        }
    }
}

/// 検証対象のHTTP要素
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// パス
    Path,
    /// メソッド
    Method,
    /// ヘッダー
    Header,
    /// クエリパラメーター
    QueryParam,
    /// ステータスコード
    StatusCode,
    /// ペイロード
    Payload,
}

/// 期待値と実際の値の不一致
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    /// 不一致が見つかった要素
    pub facet: Facet,
    /// 期待値と実際の値を含むメッセージ
    pub message: String,
}

impl Mismatch {
    /// 新しい不一致を作成
    pub fn new(facet: Facet, message: impl Into<String>) -> Self {
        Self {
            facet,
            message: message.into(),
        }
    }
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// 集約された検証エラー
///
/// 独立した検証はすべて実行され、最初の失敗で止まらない。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<Mismatch>);

impl ValidationErrors {
    /// 個々の検証結果から集約する。不一致がなければ `Ok(())`
    pub fn collect<I>(results: I) -> Result<(), ValidationErrors>
    where
        I: IntoIterator<Item = Result<(), Mismatch>>,
    {
        let mismatches: Vec<Mismatch> = results.into_iter().filter_map(Result::err).collect();
        if mismatches.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(mismatches))
        }
    }

    /// 指定した要素の不一致を含むか
    pub fn has_facet(&self, facet: Facet) -> bool {
        self.0.iter().any(|m| m.facet == facet)
    }

    /// 不一致の件数
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// 不一致がないか
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lines: Vec<&str> = self.0.iter().map(|m| m.message.as_str()).collect();
        f.write_str(&lines.join("\n"))
    }
}

/// Agent error type
#[derive(Debug, Error)]
pub enum AgentError {
    /// Bad init parameters (blank name, empty command, bad port)
    #[error("invalid configuration - {0}")]
    InvalidConfig(String),

    /// Malformed send/receive action
    #[error("invalid action - {0}")]
    InvalidAction(String),

    /// Action addressed to an unregistered endpoint
    #[error("{kind} endpoint [{name}] not found")]
    EndpointNotFound {
        /// Registry that was searched
        kind: EndpointKind,
        /// Requested endpoint name
        name: String,
    },

    /// No counterpart arrived for a receive within the action timeout
    #[error("receive action timed out - {0}")]
    ReceiveTimeout(String),

    /// No counterpart arrived for a send within the action timeout
    #[error("send action timed out - {0}")]
    SendTimeout(String),

    /// The real network call failed
    #[error("transport error - {0}")]
    Transport(String),

    /// Actual data did not match the expectation
    #[error("{0}")]
    ValidationMismatch(ValidationErrors),

    /// The external process could not be started
    #[error("launch failed - {0}")]
    LaunchFailed(String),

    /// Graceful shutdown did not finish within the grace period
    #[error("shutdown timeout - {0}")]
    ShutdownTimeout(String),

    /// Configuration loading error
    #[error("configuration error - {0}")]
    Config(String),
}

impl From<ValidationErrors> for AgentError {
    fn from(errors: ValidationErrors) -> Self {
        AgentError::ValidationMismatch(errors)
    }
}

impl From<config::ConfigError> for AgentError {
    fn from(err: config::ConfigError) -> Self {
        AgentError::Config(err.to_string())
    }
}

/// Agent result type
pub type AgentResult<T> = Result<T, AgentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_without_mismatches_is_ok() {
        let result = ValidationErrors::collect(vec![Ok(()), Ok(())]);
        assert!(result.is_ok());
    }

    #[test]
    fn test_collect_keeps_every_mismatch() {
        let result = ValidationErrors::collect(vec![
            Err(Mismatch::new(Facet::Path, "path mismatch")),
            Ok(()),
            Err(Mismatch::new(Facet::Payload, "payload mismatch")),
        ]);

        let errors = result.unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(errors.has_facet(Facet::Path));
        assert!(errors.has_facet(Facet::Payload));
        assert!(!errors.has_facet(Facet::Method));
        assert_eq!(errors.to_string(), "path mismatch\npayload mismatch");
    }

    #[test]
    fn test_endpoint_not_found_message() {
        let err = AgentError::EndpointNotFound {
            kind: EndpointKind::HttpServer,
            name: "orders".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP server endpoint [orders] not found");
    }

    #[test]
    fn test_validation_mismatch_displays_aggregate() {
        let errors = ValidationErrors::collect(vec![Err(Mismatch::new(
            Facet::StatusCode,
            "validation error - status mismatch - expected [201] but received [200]",
        ))])
        .unwrap_err();
        let err = AgentError::from(errors);
        assert_eq!(
            err.to_string(),
            "validation error - status mismatch - expected [201] but received [200]"
        );
    }
}
