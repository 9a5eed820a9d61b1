//! HTTPサーバーサービス

use crate::config::ActionTimeout;
use crate::endpoint::{HttpServerEndpoint, InboundRequest};
use crate::registry::{Endpoint, EndpointRegistry};
use crate::validation::JsonComparator;
use std::net::SocketAddr;
use std::sync::Arc;
use test_agent_common::error::{AgentResult, EndpointKind};
use test_agent_common::protocol::{InitServerRequest, ServerReceiveRequest, ServerSendRequest};
use tracing::{debug, info, warn};

/// HTTPサーバーエンドポイントの初期化とアクション振り分け
#[derive(Clone)]
pub struct HttpServerService {
    registry: EndpointRegistry<HttpServerEndpoint>,
    action_timeout: ActionTimeout,
    comparator: Arc<dyn JsonComparator>,
}

impl HttpServerService {
    /// サービスを作成
    pub fn new(action_timeout: ActionTimeout, comparator: Arc<dyn JsonComparator>) -> Self {
        Self {
            registry: EndpointRegistry::new(EndpointKind::HttpServer),
            action_timeout,
            comparator,
        }
    }

    /// レジストリ
    pub fn registry(&self) -> &EndpointRegistry<HttpServerEndpoint> {
        &self.registry
    }

    /// エンドポイントを作成・起動して登録する
    ///
    /// 差し替え対象が同じポートを使っている場合は、ポートを解放するため
    /// 先に停止を待つ。それ以外の差し替えは非同期に停止する。
    pub async fn init(&self, request: InitServerRequest) -> AgentResult<SocketAddr> {
        let endpoint = Arc::new(HttpServerEndpoint::new(
            &request,
            self.action_timeout.clone(),
            self.comparator.clone(),
        )?);

        let previous = self.registry.get(&request.name).await.ok();
        if let Some(previous) = &previous {
            if request.port != 0 && previous.port() == request.port {
                info!(
                    endpoint = %request.name,
                    port = request.port,
                    "endpoint already exists on the same port - shutting it down first"
                );
                if let Err(err) = previous.shutdown().await {
                    warn!(endpoint = %request.name, "{}", err);
                }
            }
        }

        let local_addr = match endpoint.start().await {
            Ok(addr) => addr,
            Err(err) => {
                if let Some(previous) = &previous {
                    self.registry.remove_if_same(&request.name, previous).await;
                }
                return Err(err);
            }
        };

        info!(endpoint = %request.name, %local_addr, "HTTP server endpoint initialized");
        self.registry.replace(endpoint).await;
        Ok(local_addr)
    }

    /// 送信アクション（待機中のリクエストへのレスポンス）
    pub async fn send(&self, request: ServerSendRequest) -> AgentResult<()> {
        let endpoint = self.registry.get(&request.endpoint_name).await?;
        debug!(endpoint = %request.endpoint_name, action = %request.name, "server send");
        endpoint.send(request.into()).await
    }

    /// 受信アクション。検証エラーは `ValidationMismatch` になる
    pub async fn receive(&self, request: ServerReceiveRequest) -> AgentResult<InboundRequest> {
        let endpoint = self.registry.get(&request.endpoint_name).await?;
        debug!(endpoint = %request.endpoint_name, action = %request.name, "server receive");
        endpoint.receive(request.into()).await?.into_result()
    }
}
