//! HTTPクライアントサービス

use crate::config::ActionTimeout;
use crate::endpoint::{HttpClientEndpoint, ReceivedResponse};
use crate::registry::EndpointRegistry;
use crate::validation::JsonComparator;
use std::sync::Arc;
use test_agent_common::error::{AgentResult, EndpointKind};
use test_agent_common::protocol::{ClientReceiveRequest, ClientSendRequest, InitClientRequest};
use tracing::{debug, info};

/// HTTPクライアントエンドポイントの初期化とアクション振り分け
#[derive(Clone)]
pub struct HttpClientService {
    registry: EndpointRegistry<HttpClientEndpoint>,
    action_timeout: ActionTimeout,
    comparator: Arc<dyn JsonComparator>,
}

impl HttpClientService {
    /// サービスを作成
    pub fn new(action_timeout: ActionTimeout, comparator: Arc<dyn JsonComparator>) -> Self {
        Self {
            registry: EndpointRegistry::new(EndpointKind::HttpClient),
            action_timeout,
            comparator,
        }
    }

    /// レジストリ
    pub fn registry(&self) -> &EndpointRegistry<HttpClientEndpoint> {
        &self.registry
    }

    /// エンドポイントを作成して登録する。同名があれば差し替える
    pub async fn init(&self, request: InitClientRequest) -> AgentResult<()> {
        let endpoint = HttpClientEndpoint::new(
            &request,
            self.action_timeout.clone(),
            self.comparator.clone(),
        )?;
        info!(
            endpoint = %request.name,
            base_url = %request.base_url,
            "HTTP client endpoint initialized"
        );
        self.registry.replace(Arc::new(endpoint)).await;
        Ok(())
    }

    /// 送信アクション
    pub async fn send(&self, request: ClientSendRequest) -> AgentResult<()> {
        let endpoint = self.registry.get(&request.endpoint_name).await?;
        debug!(endpoint = %request.endpoint_name, action = %request.name, "client send");
        endpoint.send(request.into())
    }

    /// 受信アクション。検証エラーは `ValidationMismatch` になる
    pub async fn receive(&self, request: ClientReceiveRequest) -> AgentResult<ReceivedResponse> {
        let endpoint = self.registry.get(&request.endpoint_name).await?;
        debug!(endpoint = %request.endpoint_name, action = %request.name, "client receive");
        endpoint.receive(request.into()).await?.into_result()
    }
}
