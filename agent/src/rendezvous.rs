//! 時間制限付きランデブー
//!
//! 容量0のハンドオフ。値を渡す側（offer）と受け取る側（take）が
//! 両方そろった時点でのみ値が移動する。どちらの側もタイムアウトで諦め、
//! 相手がいないまま永久に待ち続けることはない。

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{oneshot, Mutex, Notify};
use tokio::time::Instant;

/// 容量0の時間制限付きハンドオフ
///
/// 受け取り側は自分専用のoneshotを待機列に登録し、渡す側は待機列から
/// 生きている受け取り側を1つ見つけて値を渡す。タイムアウトした受け取り側は
/// oneshotを閉じるため、渡す側はその受け取り側を読み飛ばして次を探す。
/// 閉じた受け取り側は次の登録時に待機列から取り除かれる。
/// 受け取り側がタイムアウトした後に届いた値が失われることはない。
pub struct Rendezvous<T> {
    waiters: Mutex<VecDeque<oneshot::Sender<T>>>,
    arrived: Notify,
    // 渡す側は到着順に1つずつ処理する
    offers: Mutex<()>,
}

impl<T> Default for Rendezvous<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Rendezvous<T> {
    /// 新しいランデブーを作成
    pub fn new() -> Self {
        Self {
            waiters: Mutex::new(VecDeque::new()),
            arrived: Notify::new(),
            offers: Mutex::new(()),
        }
    }

    /// `timeout` 以内に渡された値を受け取る。誰も渡さなければ `None`
    pub async fn take(&self, timeout: Duration) -> Option<T> {
        let (slot_tx, mut slot_rx) = oneshot::channel();
        {
            let mut waiters = self.waiters.lock().await;
            waiters.retain(|waiter| !waiter.is_closed());
            waiters.push_back(slot_tx);
        }
        self.arrived.notify_one();

        match tokio::time::timeout(timeout, &mut slot_rx).await {
            Ok(result) => result.ok(),
            Err(_) => {
                // 閉じた後はoffer側の送信が失敗するので、閉じる直前に届いた値だけ拾う
                slot_rx.close();
                slot_rx.try_recv().ok()
            }
        }
    }

    /// `timeout` 以内に受け取り側へ値を渡す
    ///
    /// 受け取り側が現れなかった場合は値をそのまま `Err` で返す。
    pub async fn offer(&self, value: T, timeout: Duration) -> Result<(), T> {
        let deadline = Instant::now() + timeout;
        let _turn = match tokio::time::timeout_at(deadline, self.offers.lock()).await {
            Ok(guard) => guard,
            Err(_) => return Err(value),
        };

        let mut value = value;
        loop {
            let next = self.waiters.lock().await.pop_front();
            match next {
                Some(waiter) => match waiter.send(value) {
                    Ok(()) => return Ok(()),
                    // 既にタイムアウトした受け取り側
                    Err(returned) => value = returned,
                },
                None => {
                    if tokio::time::timeout_at(deadline, self.arrived.notified())
                        .await
                        .is_err()
                    {
                        return Err(value);
                    }
                }
            }
        }
    }

    #[cfg(test)]
    async fn registered_waiters(&self) -> usize {
        self.waiters.lock().await.len()
    }
}
