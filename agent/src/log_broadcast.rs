//! ログブロードキャスト
//!
//! エージェント自身のログ行をログストリーム購読者（RPCセッション）に配信する。
//! 購読者ごとに容量500の有界キューを持ち、満杯の購読者への配信はスキップする。

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;
use tracing::info;
use uuid::Uuid;

/// 購読者ごとのキュー容量
pub const SUBSCRIBER_CAPACITY: usize = 500;

struct Subscriber {
    listener: String,
    tx: mpsc::Sender<String>,
}

/// プロセス全体のログ配信
#[derive(Clone, Default)]
pub struct LogBroadcast {
    subscribers: Arc<RwLock<HashMap<Uuid, Subscriber>>>,
}

impl LogBroadcast {
    /// 新しいブロードキャストを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 購読を開始する
    pub fn subscribe(&self, listener: impl Into<String>) -> LogSubscription {
        let listener = listener.into();
        let id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(SUBSCRIBER_CAPACITY);

        self.write().insert(
            id,
            Subscriber {
                listener: listener.clone(),
                tx,
            },
        );
        // ログ出力はロック解放後（出力自体がpublishを呼ぶため）
        info!(listener = %listener, subscription = %id, "log listener subscribed");

        LogSubscription {
            id,
            listener,
            rx,
            broadcast: self.clone(),
        }
    }

    /// 全購読者にログ行を配信する。ブロックしない
    pub fn publish(&self, line: &str) {
        let subscribers = self.read();
        for subscriber in subscribers.values() {
            // 満杯または切断済みの購読者には配信しない
            let _ = subscriber.tx.try_send(line.to_string());
        }
    }

    /// 購読者数
    pub fn subscriber_count(&self) -> usize {
        self.read().len()
    }

    fn unsubscribe(&self, id: Uuid) {
        let removed = self.write().remove(&id);
        if let Some(subscriber) = removed {
            info!(
                listener = %subscriber.listener,
                subscription = %id,
                "log listener unsubscribed"
            );
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<Uuid, Subscriber>> {
        self.subscribers
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<Uuid, Subscriber>> {
        self.subscribers
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// ログストリームの購読
///
/// Drop時に自動で購読解除される。
pub struct LogSubscription {
    id: Uuid,
    listener: String,
    rx: mpsc::Receiver<String>,
    broadcast: LogBroadcast,
}

impl LogSubscription {
    /// 購読ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// リスナー名
    pub fn listener(&self) -> &str {
        &self.listener
    }

    /// 次のログ行を待つ
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// 待たずに次のログ行を取り出す
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Drop for LogSubscription {
    fn drop(&mut self) {
        self.broadcast.unsubscribe(self.id);
    }
}
