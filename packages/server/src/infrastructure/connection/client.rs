//! 1 本の WebSocket 接続
//!
//! ## 責務
//!
//! - クライアント ID と所属ルームの保持
//! - 送信キュー（bounded mpsc）へのイベント投入
//!
//! 送信キューの受信側は write pump が持ちます。キューを閉じると write pump は
//! Close フレームを送って終了します。

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::{
    domain::{ClientId, RoomError, RoomId},
    infrastructure::dto::websocket::ServerEvent,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("connection is closed")]
    Closed,
    #[error("outbound queue is full")]
    Full,
}

/// 接続中のクライアント
#[derive(Debug)]
pub struct Connection {
    id: ClientId,
    /// 所属ルーム。ルーム参加前は `None`
    room_id: RwLock<Option<RoomId>>,
    /// `None` は閉じたキュー
    outbox: Mutex<Option<mpsc::Sender<ServerEvent>>>,
    connected_at: i64,
}

impl Connection {
    /// 新しい接続と、その送信キューの受信側を作成
    pub fn new(
        id: ClientId,
        capacity: usize,
        connected_at: i64,
    ) -> (Arc<Self>, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let conn = Arc::new(Self {
            id,
            room_id: RwLock::new(None),
            outbox: Mutex::new(Some(tx)),
            connected_at,
        });
        (conn, rx)
    }

    pub fn id(&self) -> &ClientId {
        &self.id
    }

    pub fn connected_at(&self) -> i64 {
        self.connected_at
    }

    pub fn room_id(&self) -> Option<RoomId> {
        self.room_id
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn set_room(&self, room_id: Option<RoomId>) {
        *self.room_id.write().unwrap_or_else(PoisonError::into_inner) = room_id;
    }

    /// 送信キューにイベントを積む（ブロックしない）
    pub fn send(&self, event: ServerEvent) -> Result<(), SendError> {
        let outbox = self.outbox.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(tx) = outbox.as_ref() else {
            return Err(SendError::Closed);
        };
        tx.try_send(event).map_err(|e| match e {
            TrySendError::Full(_) => SendError::Full,
            TrySendError::Closed(_) => SendError::Closed,
        })
    }

    /// 送信に失敗してもログを残すだけのヘルパー
    pub fn push(&self, event: ServerEvent) {
        let kind = event.kind();
        if let Err(e) = self.send(event) {
            tracing::warn!("Dropped '{}' event for client '{}': {}", kind, self.id, e);
        }
    }

    /// ハンドラーのエラーをこの接続にだけ通知
    pub fn report_error(&self, error: &RoomError) {
        tracing::debug!("Reporting error to client '{}': {}", self.id, error);
        self.push(ServerEvent::error(error.to_string()));
    }

    pub fn is_closed(&self) -> bool {
        self.outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .is_none_or(|tx| tx.is_closed())
    }

    /// 送信キューを閉じる。2 回目以降は何もしない
    pub(crate) fn close(&self) {
        let taken = self
            .outbox
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if taken.is_some() {
            tracing::debug!("Closed outbound queue for client '{}'", self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_connection(capacity: usize) -> (Arc<Connection>, mpsc::Receiver<ServerEvent>) {
        Connection::new(ClientId::new("alice".to_string()).unwrap(), capacity, 0)
    }

    #[tokio::test]
    async fn test_send_delivers_to_receiver() {
        // テスト項目: send したイベントが受信側に届く
        // given (前提条件):
        let (conn, mut rx) = create_test_connection(4);

        // when (操作):
        let result = conn.send(ServerEvent::room_time(10));

        // then (期待する結果):
        assert!(result.is_ok());
        assert_eq!(rx.recv().await, Some(ServerEvent::room_time(10)));
    }

    #[test]
    fn test_send_on_full_queue() {
        // テスト項目: キューが満杯なら Full が返り、ブロックしない
        // given (前提条件):
        let (conn, _rx) = create_test_connection(1);
        conn.send(ServerEvent::room_time(1)).unwrap();

        // when (操作):
        let result = conn.send(ServerEvent::room_time(2));

        // then (期待する結果):
        assert_eq!(result, Err(SendError::Full));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_and_ends_stream() {
        // テスト項目: close 後の send は Closed になり、受信側は None で終わる
        // given (前提条件):
        let (conn, mut rx) = create_test_connection(4);
        conn.send(ServerEvent::room_time(3)).unwrap();

        // when (操作):
        conn.close();
        conn.close();

        // then (期待する結果):
        assert!(conn.is_closed());
        assert_eq!(conn.send(ServerEvent::room_time(4)), Err(SendError::Closed));
        assert_eq!(rx.recv().await, Some(ServerEvent::room_time(3)));
        assert_eq!(rx.recv().await, None);
    }

    #[test]
    fn test_send_after_receiver_dropped() {
        // テスト項目: write pump が終了済みなら Closed が返る
        // given (前提条件):
        let (conn, rx) = create_test_connection(4);
        drop(rx);

        // when (操作):
        let result = conn.send(ServerEvent::room_time(1));

        // then (期待する結果):
        assert_eq!(result, Err(SendError::Closed));
        assert!(conn.is_closed());
    }

    #[tokio::test]
    async fn test_report_error_sends_error_event() {
        // テスト項目: report_error はエラーイベントを送る
        // given (前提条件):
        let (conn, mut rx) = create_test_connection(4);

        // when (操作):
        conn.report_error(&RoomError::NotHost);

        // then (期待する結果):
        assert_eq!(
            rx.recv().await,
            Some(ServerEvent::error(RoomError::NotHost.to_string()))
        );
    }

    #[test]
    fn test_room_assignment() {
        // テスト項目: 所属ルームの設定と解除
        // given (前提条件):
        let (conn, _rx) = create_test_connection(1);
        let room_id = RoomId::new("room-1".to_string()).unwrap();

        // when (操作):
        conn.set_room(Some(room_id.clone()));

        // then (期待する結果):
        assert_eq!(conn.room_id(), Some(room_id));
        conn.set_room(None);
        assert_eq!(conn.room_id(), None);
    }
}
