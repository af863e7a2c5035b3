//! Event Dispatcher
//!
//! 受信メッセージの `type` タグからハンドラーを引き、呼び出します。
//! ハンドラーのエラーは送信元の接続にだけ `error` イベントとして返します。

use std::{collections::HashMap, sync::Arc};

use crate::{
    domain::{RoomError, RoomId},
    infrastructure::{connection::Connection, dto::websocket::IncomingMessage},
};

/// 1 種類の受信メッセージを処理するハンドラー
pub trait MessageHandler: Send + Sync {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError>;
}

/// 参加前の接続からのメッセージを `NotInRoom` で拒否するデコレーター
pub struct RequireRoom<H> {
    inner: H,
}

impl<H: MessageHandler> RequireRoom<H> {
    pub fn new(inner: H) -> Self {
        Self { inner }
    }
}

impl<H: MessageHandler> MessageHandler for RequireRoom<H> {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        if conn.room_id().is_none() {
            return Err(RoomError::NotInRoom);
        }
        self.inner.handle(conn, msg)
    }
}

/// 接続の所属ルーム。未参加なら `NotInRoom`
pub(crate) fn current_room(conn: &Connection) -> Result<RoomId, RoomError> {
    conn.room_id().ok_or(RoomError::NotInRoom)
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// タグにハンドラーを登録する。同じタグの再登録は上書き
    pub fn register(&mut self, tag: impl Into<String>, handler: Arc<dyn MessageHandler>) {
        let tag = tag.into();
        if self.handlers.insert(tag.clone(), handler).is_some() {
            tracing::warn!("Handler for '{}' replaced", tag);
        }
    }

    pub fn is_registered(&self, tag: &str) -> bool {
        self.handlers.contains_key(tag)
    }

    /// メッセージをハンドラーに振り分ける
    ///
    /// 未知のタグはログに残して捨てます。
    pub fn dispatch(&self, conn: &Arc<Connection>, msg: &IncomingMessage) {
        let Some(handler) = self.handlers.get(&msg.kind) else {
            tracing::warn!(
                "No handler for message type '{}' from client '{}'",
                msg.kind,
                conn.id()
            );
            return;
        };

        tracing::debug!("Dispatching '{}' from client '{}'", msg.kind, conn.id());
        if let Err(e) = handler.handle(conn, msg) {
            tracing::info!("'{}' from client '{}' failed: {}", msg.kind, conn.id(), e);
            conn.report_error(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::{domain::ClientId, infrastructure::dto::websocket::ServerEvent};

    struct CountingHandler {
        calls: Arc<AtomicUsize>,
        result: Result<(), RoomError>,
    }

    impl MessageHandler for CountingHandler {
        fn handle(&self, _conn: &Arc<Connection>, _msg: &IncomingMessage) -> Result<(), RoomError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.result.clone()
        }
    }

    fn connection() -> (Arc<Connection>, tokio::sync::mpsc::Receiver<ServerEvent>) {
        Connection::new(ClientId::new("alice".to_string()).unwrap(), 8, 0)
    }

    #[test]
    fn test_dispatch_calls_registered_handler() {
        // テスト項目: 登録したタグのメッセージがハンドラーに渡る
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(
            "ping",
            Arc::new(CountingHandler {
                calls: calls.clone(),
                result: Ok(()),
            }),
        );
        let (conn, mut rx) = connection();

        // when (操作):
        dispatcher.dispatch(&conn, &IncomingMessage::new("ping", serde_json::Value::Null));

        // then (期待する結果):
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_unknown_tag_is_dropped() {
        // テスト項目: 未知のタグは何も起こさない
        // given (前提条件):
        let dispatcher = EventDispatcher::new();
        let (conn, mut rx) = connection();

        // when (操作):
        dispatcher.dispatch(&conn, &IncomingMessage::new("dance", serde_json::Value::Null));

        // then (期待する結果):
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_dispatch_reports_handler_error_to_sender() {
        // テスト項目: ハンドラーのエラーは送信元に error イベントとして返る
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let mut dispatcher = EventDispatcher::new();
        dispatcher.register(
            "next_stage",
            Arc::new(CountingHandler {
                calls: calls.clone(),
                result: Err(RoomError::NotHost),
            }),
        );
        let (conn, mut rx) = connection();

        // when (操作):
        dispatcher.dispatch(&conn, &IncomingMessage::new("next_stage", serde_json::Value::Null));

        // then (期待する結果):
        assert_eq!(
            rx.try_recv().unwrap(),
            ServerEvent::error(RoomError::NotHost.to_string())
        );
    }

    #[test]
    fn test_require_room_rejects_unjoined_connection() {
        // テスト項目: ルーム未参加の接続は内側のハンドラーに届かず NotInRoom になる
        // given (前提条件):
        let calls = Arc::new(AtomicUsize::new(0));
        let handler = RequireRoom::new(CountingHandler {
            calls: calls.clone(),
            result: Ok(()),
        });
        let (conn, _rx) = connection();

        // when (操作):
        let result = handler.handle(&conn, &IncomingMessage::new("ready", serde_json::Value::Null));

        // then (期待する結果):
        assert_eq!(result, Err(RoomError::NotInRoom));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(RoomError::NotInRoom.to_string(), "Join room first");
    }
}
