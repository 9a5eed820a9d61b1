//! エンドポイントレジストリ
//!
//! エンドポイント名→稼働中インスタンスの対応を種類ごとに管理する。
//! 同じ名前で再登録すると即座に差し替え、古いインスタンスは非同期に停止する。

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use test_agent_common::error::{AgentError, AgentResult, EndpointKind};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// レジストリに登録できるエンドポイント
#[async_trait]
pub trait Endpoint: Send + Sync + 'static {
    /// エンドポイント名
    fn name(&self) -> &str;

    /// エンドポイントを停止する。停止済みなら何もしない
    async fn shutdown(&self) -> AgentResult<()>;
}

/// 種類ごとのエンドポイントレジストリ
///
/// 参照は並行に行え、登録・差し替えは書き込みロックで直列化される。
/// 差し替えは1回の挿入で行うため、他の呼び出し元から名前が一時的に
/// 消えて見えることはない。
pub struct EndpointRegistry<E> {
    kind: EndpointKind,
    endpoints: Arc<RwLock<HashMap<String, Arc<E>>>>,
}

impl<E> Clone for EndpointRegistry<E> {
    fn clone(&self) -> Self {
        Self {
            kind: self.kind,
            endpoints: self.endpoints.clone(),
        }
    }
}

impl<E: Endpoint> EndpointRegistry<E> {
    /// 空のレジストリを作成
    pub fn new(kind: EndpointKind) -> Self {
        Self {
            kind,
            endpoints: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// 名前でエンドポイントを取得
    pub async fn get(&self, name: &str) -> AgentResult<Arc<E>> {
        self.endpoints
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| AgentError::EndpointNotFound {
                kind: self.kind,
                name: name.to_string(),
            })
    }

    /// 登録済みか
    pub async fn contains(&self, name: &str) -> bool {
        self.endpoints.read().await.contains_key(name)
    }

    /// 登録する。同名のエンドポイントがあれば差し替えて返す
    pub async fn insert(&self, endpoint: Arc<E>) -> Option<Arc<E>> {
        let name = endpoint.name().to_string();
        let previous = self.endpoints.write().await.insert(name.clone(), endpoint);
        debug!(kind = %self.kind, endpoint = %name, "registered endpoint");
        previous
    }

    /// 登録し、差し替えた古いエンドポイントを非同期に停止する
    pub async fn replace(&self, endpoint: Arc<E>) {
        if let Some(previous) = self.insert(endpoint).await {
            info!(
                kind = %self.kind,
                endpoint = %previous.name(),
                "endpoint already exists - replacing"
            );
            retire(previous);
        }
    }

    /// 登録中のエンドポイントが `expected` と同一の場合だけ削除する
    pub async fn remove_if_same(&self, name: &str, expected: &Arc<E>) -> bool {
        let mut endpoints = self.endpoints.write().await;
        match endpoints.get(name) {
            Some(current) if Arc::ptr_eq(current, expected) => {
                endpoints.remove(name);
                true
            }
            _ => false,
        }
    }

    /// 登録名の一覧（ソート済み）
    pub async fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.endpoints.read().await.keys().cloned().collect();
        names.sort();
        names
    }

    /// 登録数
    pub async fn len(&self) -> usize {
        self.endpoints.read().await.len()
    }

    /// 空か
    pub async fn is_empty(&self) -> bool {
        self.endpoints.read().await.is_empty()
    }

    /// すべてのエンドポイントを登録解除して停止する
    pub async fn shutdown_all(&self) {
        let drained: Vec<Arc<E>> = self
            .endpoints
            .write()
            .await
            .drain()
            .map(|(_, endpoint)| endpoint)
            .collect();

        let shutdowns = drained.iter().map(|endpoint| async move {
            if let Err(err) = endpoint.shutdown().await {
                warn!(
                    kind = %self.kind,
                    endpoint = %endpoint.name(),
                    "error during endpoint shutdown - {}",
                    err
                );
            }
        });
        futures::future::join_all(shutdowns).await;

        if !drained.is_empty() {
            info!(kind = %self.kind, count = drained.len(), "endpoints shut down");
        }
    }
}

/// 差し替えられたエンドポイントをバックグラウンドで停止する
pub fn retire<E: Endpoint>(endpoint: Arc<E>) {
    tokio::spawn(async move {
        if let Err(err) = endpoint.shutdown().await {
            warn!(
                endpoint = %endpoint.name(),
                "error while shutting down replaced endpoint - {}",
                err
            );
        }
    });
}
