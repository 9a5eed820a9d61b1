//! 外部プロセスサービス

use crate::endpoint::CommandEndpoint;
use crate::registry::{Endpoint, EndpointRegistry};
use std::sync::Arc;
use test_agent_common::error::{AgentResult, EndpointKind};
use test_agent_common::protocol::{InitCommandRequest, ShutdownCommandRequest};
use tracing::info;

/// 外部プロセスエンドポイントの初期化と停止
#[derive(Clone)]
pub struct CommandService {
    registry: EndpointRegistry<CommandEndpoint>,
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandService {
    /// サービスを作成
    pub fn new() -> Self {
        Self {
            registry: EndpointRegistry::new(EndpointKind::Command),
        }
    }

    /// レジストリ
    pub fn registry(&self) -> &EndpointRegistry<CommandEndpoint> {
        &self.registry
    }

    /// エンドポイントを登録してプロセスを起動する
    ///
    /// 同名の古いプロセスは待たずに非同期で停止する。
    /// 起動に失敗したエンドポイントは登録から外す。
    pub async fn init(&self, request: InitCommandRequest) -> AgentResult<()> {
        let endpoint = Arc::new(CommandEndpoint::new(&request)?);
        self.registry.replace(endpoint.clone()).await;

        if let Err(err) = endpoint.start().await {
            self.registry.remove_if_same(&request.name, &endpoint).await;
            return Err(err);
        }

        info!(endpoint = %request.name, argv = ?request.cmd_components, "command endpoint initialized");
        Ok(())
    }

    /// プロセスを停止して登録を解除する
    pub async fn shutdown(&self, request: ShutdownCommandRequest) -> AgentResult<()> {
        let endpoint = self.registry.get(&request.name).await?;
        self.registry.remove_if_same(&request.name, &endpoint).await;
        endpoint.shutdown().await
    }
}
