//! 疑似HTTPサーバー
//!
//! 受信したリクエストは `receive` アクションとランデブーし、
//! その後 `send` アクションが返すレスポンスを待ってから応答する。
//! どちらの待機もアクションタイムアウトで打ち切られる。

use crate::config::ActionTimeout;
use crate::endpoint::action::{enrich_content_type, ServerReceiveAction, ServerSendAction};
use crate::endpoint::Received;
use crate::registry::Endpoint;
use crate::rendezvous::Rendezvous;
use crate::validation::{self, JsonComparator};
use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use percent_encoding::percent_decode_str;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use test_agent_common::error::{AgentError, AgentResult, ValidationErrors};
use test_agent_common::protocol::InitServerRequest;
use test_agent_common::types::is_blank;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tracing::{debug, error, info, warn};

/// グレースフルシャットダウンの猶予
pub const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// 受信したHTTPリクエスト（ボディは読み込み済み）
#[derive(Debug, Clone)]
pub struct InboundRequest {
    /// HTTPメソッド
    pub method: Method,
    /// リクエストURI（パスとクエリ）
    pub uri: Uri,
    /// ヘッダー
    pub headers: HeaderMap,
    /// ボディ
    pub body: Bytes,
}

#[derive(Debug)]
struct OutgoingReply {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

/// 返信。`send` アクションが不正だった場合はエラーメッセージを運ぶ
type ReplyPair = Result<OutgoingReply, String>;

enum ServerState {
    Created,
    Started {
        local_addr: SocketAddr,
        handle: JoinHandle<()>,
    },
    Shutdown,
}

/// リクエストハンドラーとアクションの間で共有する受け渡し口
struct Handoff {
    name: String,
    requests: Rendezvous<InboundRequest>,
    replies: Rendezvous<ReplyPair>,
    action_timeout: ActionTimeout,
    cancel: CancellationToken,
}

/// 疑似HTTPサーバーエンドポイント
pub struct HttpServerEndpoint {
    name: String,
    port: u16,
    content_type: String,
    write_timeout: Duration,
    handoff: Arc<Handoff>,
    comparator: Arc<dyn JsonComparator>,
    state: Mutex<ServerState>,
}

impl HttpServerEndpoint {
    /// エンドポイントを作成する（`Created` 状態）
    pub fn new(
        init: &InitServerRequest,
        action_timeout: ActionTimeout,
        comparator: Arc<dyn JsonComparator>,
    ) -> AgentResult<Self> {
        if is_blank(&init.name) {
            return Err(AgentError::InvalidConfig(
                "cannot create HTTP server endpoint - name is empty".to_string(),
            ));
        }

        Ok(Self {
            name: init.name.clone(),
            port: init.port,
            content_type: init.content_type.clone(),
            write_timeout: Duration::from_secs(init.timeout_seconds),
            handoff: Arc::new(Handoff {
                name: init.name.clone(),
                requests: Rendezvous::new(),
                replies: Rendezvous::new(),
                action_timeout,
                cancel: CancellationToken::new(),
            }),
            comparator,
            state: Mutex::new(ServerState::Created),
        })
    }

    /// 設定されたポート（0ならOSが割り当てる）
    pub fn port(&self) -> u16 {
        self.port
    }

    /// 実際に待ち受けているアドレス（起動中のみ）
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.state.lock().await {
            ServerState::Started { local_addr, .. } => Some(*local_addr),
            _ => None,
        }
    }

    /// リスナーをバインドしてサーバーを起動する
    pub async fn start(&self) -> AgentResult<SocketAddr> {
        let mut state = self.state.lock().await;
        match &*state {
            ServerState::Created => {}
            ServerState::Started { local_addr, .. } => return Ok(*local_addr),
            ServerState::Shutdown => {
                return Err(AgentError::InvalidConfig(format!(
                    "cannot start HTTP server endpoint [{}] - already shut down",
                    self.name
                )))
            }
        }

        let listener = TcpListener::bind(("0.0.0.0", self.port))
            .await
            .map_err(|e| {
                AgentError::InvalidConfig(format!(
                    "cannot start HTTP server endpoint [{}] on port {} - {}",
                    self.name, self.port, e
                ))
            })?;
        let local_addr = listener.local_addr().map_err(|e| {
            AgentError::InvalidConfig(format!(
                "cannot start HTTP server endpoint [{}] - {}",
                self.name, e
            ))
        })?;

        let mut router = Router::new()
            .fallback(handle_request)
            .with_state(self.handoff.clone());
        if !self.write_timeout.is_zero() {
            router = router.layer(TimeoutLayer::new(self.write_timeout));
        }

        let name = self.name.clone();
        let cancel = self.handoff.cancel.clone();
        let handle = tokio::spawn(async move {
            let result = axum::serve(listener, router.into_make_service())
                .with_graceful_shutdown(async move { cancel.cancelled().await })
                .await;
            match result {
                Ok(()) => debug!(endpoint = %name, "HTTP listener stopped"),
                Err(err) => error!(endpoint = %name, "HTTP listener failed - {}", err),
            }
        });

        *state = ServerState::Started { local_addr, handle };
        info!(endpoint = %self.name, port = local_addr.port(), "HTTP server endpoint started");
        Ok(local_addr)
    }

    /// 受信したリクエストを待ち、期待値と比較する
    pub async fn receive(
        &self,
        mut action: ServerReceiveAction,
    ) -> AgentResult<Received<InboundRequest>> {
        debug!(endpoint = %self.name, "action to receive {}", action);

        let timeout = self.handoff.action_timeout.get();
        let Some(request) = self.handoff.requests.take(timeout).await else {
            let err = AgentError::ReceiveTimeout("no request received for validation".to_string());
            error!(endpoint = %self.name, "{}", err);
            return Err(err);
        };

        enrich_content_type(&mut action.headers, &self.content_type);
        let validation = ValidationErrors::collect([
            validation::validate_path(&action.path, &decoded_path(&request.uri)),
            validation::validate_method(&action.method, request.method.as_str()),
            validation::validate_headers(&action.headers, &request.headers),
            validation::validate_query_params(&action.query_params, request.uri.query()),
            validation::validate_payload(
                &action.payload,
                &request.body,
                action.payload_type,
                self.comparator.as_ref(),
            ),
        ]);
        if let Err(errors) = &validation {
            error!(endpoint = %self.name, "{}", errors);
        }

        Ok(Received {
            message: request,
            validation,
        })
    }

    /// 待機中のハンドラーにレスポンスを渡す
    ///
    /// アクションが不正でもハンドラーには必ず通知し、HTTPトランザクションを閉じさせる。
    pub async fn send(&self, mut action: ServerSendAction) -> AgentResult<()> {
        debug!(endpoint = %self.name, "action to send [status: {}, headers: {:?}, payload: {}]",
            action.status_code, action.headers, action.payload);

        enrich_content_type(&mut action.headers, &self.content_type);
        let (pair, failure) = match build_reply(action) {
            Ok(reply) => (Ok(reply), None),
            Err(err) => {
                error!(endpoint = %self.name, "{}", err);
                (Err(err.to_string()), Some(err))
            }
        };

        let timeout = self.handoff.action_timeout.get();
        let delivered = self.handoff.replies.offer(pair, timeout).await.is_ok();
        if !delivered {
            error!(
                endpoint = %self.name,
                "action timed out - no request waiting for a response"
            );
        }

        match failure {
            Some(err) => Err(err),
            None if !delivered => Err(AgentError::SendTimeout(
                "no request waiting for a response".to_string(),
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Endpoint for HttpServerEndpoint {
    fn name(&self) -> &str {
        &self.name
    }

    async fn shutdown(&self) -> AgentResult<()> {
        let previous = std::mem::replace(&mut *self.state.lock().await, ServerState::Shutdown);
        self.handoff.cancel.cancel();

        let ServerState::Started { handle, .. } = previous else {
            return Ok(());
        };

        let abort = handle.abort_handle();
        match tokio::time::timeout(SHUTDOWN_GRACE, handle).await {
            Ok(_) => {
                info!(endpoint = %self.name, "HTTP server endpoint shut down");
                Ok(())
            }
            Err(_) => {
                abort.abort();
                let err = AgentError::ShutdownTimeout(format!(
                    "HTTP server endpoint [{}] did not stop within {:?}",
                    self.name, SHUTDOWN_GRACE
                ));
                warn!(endpoint = %self.name, "{}", err);
                Err(err)
            }
        }
    }
}

impl Drop for HttpServerEndpoint {
    fn drop(&mut self) {
        self.handoff.cancel.cancel();
    }
}

fn build_reply(action: ServerSendAction) -> AgentResult<OutgoingReply> {
    let status = match action.status_code {
        100..=999 => StatusCode::from_u16(action.status_code).ok(),
        _ => None,
    }
    .ok_or_else(|| {
        AgentError::InvalidAction(format!(
            "send action is invalid - status code [{}] not in range [100, 999]",
            action.status_code
        ))
    })?;

    let mut headers = HeaderMap::new();
    for (name, value) in &action.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            AgentError::InvalidAction(format!("send action is invalid - invalid header name [{}]", name))
        })?;
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            AgentError::InvalidAction(format!(
                "send action is invalid - invalid value for header [{}]",
                name
            ))
        })?;
        headers.insert(header_name, header_value);
    }

    Ok(OutgoingReply {
        status,
        headers,
        body: action.payload,
    })
}

/// すべてのパス・メソッドを受け付けるハンドラー
async fn handle_request(State(handoff): State<Arc<Handoff>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let body = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(body) => body,
        Err(err) => {
            error!(endpoint = %handoff.name, "could not read request body - {}", err);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    info!(
        endpoint = %handoff.name,
        "received HTTP request [method: {}, uri: {}, headers: {:?}, payload: {}]",
        parts.method,
        parts.uri,
        parts.headers,
        String::from_utf8_lossy(&body)
    );

    let inbound = InboundRequest {
        method: parts.method,
        uri: parts.uri,
        headers: parts.headers,
        body,
    };

    tokio::select! {
        _ = handoff.cancel.cancelled() => return unavailable(&handoff.name),
        offered = handoff.requests.offer(inbound, handoff.action_timeout.get()) => {
            if offered.is_err() {
                error!(
                    endpoint = %handoff.name,
                    "action timed out - no server receive action called in test"
                );
                return StatusCode::INTERNAL_SERVER_ERROR.into_response();
            }
        }
    }

    let reply = tokio::select! {
        _ = handoff.cancel.cancelled() => return unavailable(&handoff.name),
        reply = handoff.replies.take(handoff.action_timeout.get()) => reply,
    };

    match reply {
        None => {
            warn!(
                endpoint = %handoff.name,
                "action timed out - no server send action called in test, abandoning request"
            );
            StatusCode::GATEWAY_TIMEOUT.into_response()
        }
        Some(Err(message)) => {
            error!(endpoint = %handoff.name, "no valid response to send - {}", message);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
        Some(Ok(reply)) => {
            info!(
                endpoint = %handoff.name,
                "sending HTTP response [status: {}, headers: {:?}, payload: {}]",
                reply.status,
                reply.headers,
                reply.body
            );
            let mut response = Response::new(Body::from(reply.body));
            *response.status_mut() = reply.status;
            *response.headers_mut() = reply.headers;
            response
        }
    }
}

/// パーセントエンコードを解除したリクエストパス
fn decoded_path(uri: &Uri) -> String {
    percent_decode_str(uri.path()).decode_utf8_lossy().into_owned()
}

fn unavailable(name: &str) -> Response {
    debug!(endpoint = %name, "endpoint shutting down - releasing request");
    StatusCode::SERVICE_UNAVAILABLE.into_response()
}
