//! 送受信アクション
//!
//! RPCごとに生成され、1回のランデブーで破棄される値。

use std::fmt;
use test_agent_common::protocol::{
    ClientReceiveRequest, ClientSendRequest, ServerReceiveRequest, ServerSendRequest,
};
use test_agent_common::types::{Headers, PayloadType, QueryParams, CONTENT_TYPE_HEADER};

/// HTTPクライアントの送信アクション
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientSendAction {
    /// HTTPメソッド
    pub method: String,
    /// URL（空ならエンドポイントのベースURL）
    pub url: String,
    /// パス
    pub path: String,
    /// ヘッダー
    pub headers: Headers,
    /// クエリパラメーター
    pub query_params: QueryParams,
    /// ペイロード
    pub payload: String,
}

/// HTTPクライアントの受信アクション（レスポンスの期待値）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientReceiveAction {
    /// ステータスコード
    pub status_code: u16,
    /// ヘッダー
    pub headers: Headers,
    /// ペイロード
    pub payload: String,
    /// ペイロードの比較方法
    pub payload_type: PayloadType,
}

/// HTTPサーバーの受信アクション（リクエストの期待値）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerReceiveAction {
    /// パス
    pub path: String,
    /// HTTPメソッド
    pub method: String,
    /// ヘッダー
    pub headers: Headers,
    /// クエリパラメーター
    pub query_params: QueryParams,
    /// ペイロード
    pub payload: String,
    /// ペイロードの比較方法
    pub payload_type: PayloadType,
}

/// HTTPサーバーの送信アクション（返すレスポンス）
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerSendAction {
    /// ステータスコード
    pub status_code: u16,
    /// ヘッダー
    pub headers: Headers,
    /// ペイロード
    pub payload: String,
}

impl From<ClientSendRequest> for ClientSendAction {
    fn from(req: ClientSendRequest) -> Self {
        Self {
            method: req.method,
            url: req.url,
            path: req.path,
            headers: req.headers,
            query_params: req.query_params,
            payload: req.payload,
        }
    }
}

impl From<ClientReceiveRequest> for ClientReceiveAction {
    fn from(req: ClientReceiveRequest) -> Self {
        Self {
            status_code: req.status_code,
            headers: req.headers,
            payload: req.payload,
            payload_type: req.payload_type,
        }
    }
}

impl From<ServerReceiveRequest> for ServerReceiveAction {
    fn from(req: ServerReceiveRequest) -> Self {
        Self {
            path: req.path,
            method: req.method,
            headers: req.headers,
            query_params: req.query_params,
            payload: req.payload,
            payload_type: req.payload_type,
        }
    }
}

impl From<ServerSendRequest> for ServerSendAction {
    fn from(req: ServerSendRequest) -> Self {
        Self {
            status_code: req.status_code,
            headers: req.headers,
            payload: req.payload,
        }
    }
}

impl fmt::Display for ClientSendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[method: {}, url: {}, path: '{}', headers: {:?}, query params: {:?}, payload: {}]",
            self.method, self.url, self.path, self.headers, self.query_params, self.payload
        )
    }
}

impl fmt::Display for ServerReceiveAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[method: {}, path: '{}', headers: {:?}, query params: {:?}, payload type: {}, payload: {}]",
            self.method, self.path, self.headers, self.query_params, self.payload_type, self.payload
        )
    }
}

/// Content-Typeヘッダーが（大文字小文字を問わず）設定されているか
pub(crate) fn has_content_type(headers: &Headers) -> bool {
    headers
        .iter()
        .any(|(name, value)| name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER) && !value.trim().is_empty())
}

/// 未設定ならエンドポイントのデフォルトContent-Typeを補う
pub(crate) fn enrich_content_type(headers: &mut Headers, default_content_type: &str) {
    if default_content_type.trim().is_empty() || has_content_type(headers) {
        return;
    }
    headers.retain(|name, _| !name.eq_ignore_ascii_case(CONTENT_TYPE_HEADER));
    headers.insert(
        CONTENT_TYPE_HEADER.to_string(),
        default_content_type.to_string(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_type_is_filled_only_when_missing() {
        let mut headers = Headers::new();
        enrich_content_type(&mut headers, "application/json");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");

        let mut explicit = Headers::from([("content-type".to_string(), "text/plain".to_string())]);
        enrich_content_type(&mut explicit, "application/json");
        assert_eq!(explicit.len(), 1);
        assert_eq!(explicit.get("content-type").unwrap(), "text/plain");
    }

    #[test]
    fn blank_default_content_type_adds_nothing() {
        let mut headers = Headers::new();
        enrich_content_type(&mut headers, " ");
        assert!(headers.is_empty());
    }

    #[test]
    fn blank_content_type_is_replaced() {
        let mut headers = Headers::from([("content-type".to_string(), "".to_string())]);
        enrich_content_type(&mut headers, "text/xml");
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Content-Type").unwrap(), "text/xml");
    }
}
