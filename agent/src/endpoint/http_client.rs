//! 疑似HTTPクライアント
//!
//! `send` はリクエストを組み立てた時点で呼び出し元に戻り、実際の通信は
//! バックグラウンドタスクで行う。結果は次の `receive` にランデブーで渡され、
//! アクションタイムアウト以内に誰も受け取らなければ破棄される。

use crate::config::ActionTimeout;
use crate::endpoint::action::{enrich_content_type, ClientReceiveAction, ClientSendAction};
use crate::endpoint::Received;
use crate::registry::Endpoint;
use crate::rendezvous::Rendezvous;
use crate::validation::{self, JsonComparator};
use async_trait::async_trait;
use axum::body::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use test_agent_common::error::{AgentError, AgentResult, ValidationErrors};
use test_agent_common::protocol::InitClientRequest;
use test_agent_common::types::is_blank;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// `timeout_seconds` が0の場合のリクエストタイムアウト
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// 受信済みのHTTPレスポンス（ボディは読み込み済み）
#[derive(Debug, Clone)]
pub struct ReceivedResponse {
    /// ステータスコード
    pub status: StatusCode,
    /// ヘッダー
    pub headers: HeaderMap,
    /// ボディ
    pub body: Bytes,
}

/// 通信エラー。ヘッダーまで届いていればその時点のレスポンスも運ぶ
#[derive(Debug)]
struct ExchangeError {
    message: String,
    partial: Option<ReceivedResponse>,
}

/// 通信結果
type ResponsePair = Result<ReceivedResponse, ExchangeError>;

/// 受信アクションの失敗
///
/// 通信エラーの場合でも、ステータスとヘッダーを受信できていれば
/// `response` にボディなしのレスポンスが入る。
#[derive(Debug)]
pub struct ReceiveFailure {
    /// 失敗の種類
    pub error: AgentError,
    /// 途中まで受信したレスポンス
    pub response: Option<ReceivedResponse>,
}

impl From<AgentError> for ReceiveFailure {
    fn from(error: AgentError) -> Self {
        Self {
            error,
            response: None,
        }
    }
}

impl From<ReceiveFailure> for AgentError {
    fn from(failure: ReceiveFailure) -> Self {
        failure.error
    }
}

/// 疑似HTTPクライアントエンドポイント
pub struct HttpClientEndpoint {
    name: String,
    base_url: String,
    content_type: String,
    client: reqwest::Client,
    responses: Arc<Rendezvous<ResponsePair>>,
    action_timeout: ActionTimeout,
    comparator: Arc<dyn JsonComparator>,
    cancel: CancellationToken,
}

impl HttpClientEndpoint {
    /// エンドポイントを作成する。名前が空なら `InvalidConfig`
    pub fn new(
        init: &InitClientRequest,
        action_timeout: ActionTimeout,
        comparator: Arc<dyn JsonComparator>,
    ) -> AgentResult<Self> {
        if is_blank(&init.name) {
            return Err(AgentError::InvalidConfig(
                "cannot create HTTP client endpoint - name is empty".to_string(),
            ));
        }

        let timeout = match init.timeout_seconds {
            0 => DEFAULT_CLIENT_TIMEOUT,
            seconds => Duration::from_secs(seconds),
        };
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                AgentError::InvalidConfig(format!(
                    "cannot create HTTP client endpoint [{}] - {}",
                    init.name, e
                ))
            })?;

        Ok(Self {
            name: init.name.clone(),
            base_url: init.base_url.clone(),
            content_type: init.content_type.clone(),
            client,
            responses: Arc::new(Rendezvous::new()),
            action_timeout,
            comparator,
            cancel: CancellationToken::new(),
        })
    }

    /// ベースURL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// リクエストを送信する
    ///
    /// アクションの検証とリクエストの組み立てだけを同期的に行い、
    /// 通信自体はバックグラウンドで実行する。
    pub fn send(&self, mut action: ClientSendAction) -> AgentResult<()> {
        debug!(endpoint = %self.name, "action to send {}", action);
        if is_blank(&action.url) {
            action.url = self.base_url.clone();
        }
        enrich_content_type(&mut action.headers, &self.content_type);
        debug!(endpoint = %self.name, "will send action {}", action);

        let request = match self.build_request(&action) {
            Ok(request) => request,
            Err(err) => {
                error!(endpoint = %self.name, "{}", err);
                return Err(err);
            }
        };

        let exchange = Exchange {
            name: self.name.clone(),
            client: self.client.clone(),
            responses: self.responses.clone(),
            action_timeout: self.action_timeout.clone(),
        };
        let cancel = self.cancel.clone();
        tokio::spawn(async move {
            let name = exchange.name.clone();
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(endpoint = %name, "endpoint shut down - in-flight request discarded");
                }
                _ = exchange.run(request, action.payload) => {}
            }
        });

        Ok(())
    }

    /// 送信済みリクエストのレスポンスを待ち、期待値と比較する
    pub async fn receive(
        &self,
        mut action: ClientReceiveAction,
    ) -> Result<Received<ReceivedResponse>, ReceiveFailure> {
        debug!(endpoint = %self.name, "action to receive [status: {}, headers: {:?}, payload type: {}, payload: {}]",
            action.status_code, action.headers, action.payload_type, action.payload);

        let Some(pair) = self.responses.take(self.action_timeout.get()).await else {
            let err = AgentError::ReceiveTimeout(
                "no response received for validation".to_string(),
            );
            error!(endpoint = %self.name, "{}", err);
            return Err(err.into());
        };

        let response = pair.map_err(|failure| {
            let error = AgentError::Transport(format!(
                "error while receiving response - {}",
                failure.message
            ));
            error!(endpoint = %self.name, "{}", error);
            ReceiveFailure {
                error,
                response: failure.partial,
            }
        })?;

        enrich_content_type(&mut action.headers, &self.content_type);
        let validation = ValidationErrors::collect([
            validation::validate_status_code(action.status_code, response.status.as_u16()),
            validation::validate_headers(&action.headers, &response.headers),
            validation::validate_payload(
                &action.payload,
                &response.body,
                action.payload_type,
                self.comparator.as_ref(),
            ),
        ]);
        if let Err(errors) = &validation {
            error!(endpoint = %self.name, "{}", errors);
        }

        Ok(Received {
            message: response,
            validation,
        })
    }

    fn build_request(&self, action: &ClientSendAction) -> AgentResult<reqwest::Request> {
        if is_blank(&action.method) {
            return Err(invalid("missing HTTP method"));
        }
        if is_blank(&action.url) {
            return Err(invalid("missing url"));
        }
        if !is_valid_url(&action.url) {
            return Err(invalid("invalid url"));
        }

        let method = Method::from_bytes(action.method.as_bytes())
            .map_err(|_| invalid(&format!("invalid HTTP method [{}]", action.method)))?;

        let mut url = Url::parse(&join_url(&action.url, &action.path))
            .map_err(|e| invalid(&format!("invalid url - {}", e)))?;
        if !action.query_params.is_empty() {
            let ordered: BTreeMap<&String, &Vec<String>> = action.query_params.iter().collect();
            let mut pairs = url.query_pairs_mut();
            for (key, values) in ordered {
                for value in values {
                    pairs.append_pair(key, value);
                }
            }
        }

        let mut headers = HeaderMap::new();
        for (name, value) in &action.headers {
            let header_name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| invalid(&format!("invalid header name [{}]", name)))?;
            let header_value = HeaderValue::from_str(value)
                .map_err(|_| invalid(&format!("invalid value for header [{}]", name)))?;
            headers.insert(header_name, header_value);
        }

        self.client
            .request(method, url)
            .headers(headers)
            .body(action.payload.clone())
            .build()
            .map_err(|e| AgentError::InvalidAction(format!("canceled message - {}", e)))
    }
}

#[async_trait]
impl Endpoint for HttpClientEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self) -> AgentResult<()> {
        self.cancel.cancel();
        debug!(endpoint = %self.name, "HTTP client endpoint shut down");
        Ok(())
    }
}

/// バックグラウンドで1回の通信を行うタスクの持ち物
struct Exchange {
    name: String,
    client: reqwest::Client,
    responses: Arc<Rendezvous<ResponsePair>>,
    action_timeout: ActionTimeout,
}

impl Exchange {
    async fn run(self, request: reqwest::Request, payload: String) {
        info!(
            endpoint = %self.name,
            "sending HTTP request [method: {}, url: {}, headers: {:?}, payload: {}]",
            request.method(),
            request.url(),
            request.headers(),
            payload
        );

        let pair = match self.client.execute(request).await {
            Ok(response) => self.read_response(response).await,
            Err(err) => {
                error!(endpoint = %self.name, "error on response - {}", err);
                Err(ExchangeError {
                    message: err.to_string(),
                    partial: None,
                })
            }
        };

        // 受け取り手がいなければ結果を捨てる
        if self
            .responses
            .offer(pair, self.action_timeout.get())
            .await
            .is_err()
        {
            error!(
                endpoint = %self.name,
                "action timed out - no client receive action called in test"
            );
        }
    }

    /// ボディを一度だけ読み込んでログに出し、以降はバッファを使い回す
    async fn read_response(&self, response: reqwest::Response) -> ResponsePair {
        let status = response.status();
        let headers = response.headers().clone();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                error!(endpoint = %self.name, "could not read response body - {}", e);
                return Err(ExchangeError {
                    message: format!("could not read response body - {}", e),
                    partial: Some(ReceivedResponse {
                        status,
                        headers,
                        body: Bytes::new(),
                    }),
                });
            }
        };

        info!(
            endpoint = %self.name,
            "received HTTP response [status: {}, headers: {:?}, payload: {}]",
            status,
            headers,
            String::from_utf8_lossy(&body)
        );

        Ok(ReceivedResponse {
            status,
            headers,
            body,
        })
    }
}

fn invalid(reason: &str) -> AgentError {
    AgentError::InvalidAction(format!("send action is invalid - {}", reason))
}

fn is_valid_url(url: &str) -> bool {
    Url::parse(url).map(|u| u.has_host()).unwrap_or(false)
}

/// URLとパスを `/` 1つで連結する
fn join_url(url: &str, path: &str) -> String {
    if is_blank(path) {
        return url.to_string();
    }
    format!(
        "{}/{}",
        url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
