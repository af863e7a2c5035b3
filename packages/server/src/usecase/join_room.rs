//! UseCase: ルーム参加
//!
//! ## 処理の流れ
//!
//! Room Store のロック内で次をまとめて行います。
//!
//! 1. Room にプレイヤーを追加（再参加なら名前を更新）
//! 2. 接続をルームに割り当てる（既にどこかのルームにいれば `AlreadyInRoom`、
//!    切断済みなら `ConnectionClosed`。どちらも Room の変更は保存されない）
//! 3. 送信者に `room:init`、他のメンバーに `room:player_joined`、
//!    全員に `room:players_changed`
//!
//! 割り当てと保存が同じロックの中で行われるため、参加と並行して切断されても
//! 退出処理は参加の保存を待ってから走ります。

use std::sync::Arc;

use crate::{
    domain::{RoomError, RoomId, RoomRepository},
    infrastructure::{
        connection::{Connection, ConnectionRegistry},
        dto::websocket::{IncomingMessage, JoinPayload, ServerEvent},
    },
};

use super::{dispatcher::MessageHandler, update_room};

/// ルーム参加のユースケース
pub struct JoinRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl JoinRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl MessageHandler for JoinRoomUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: JoinPayload = msg.decode()?;
        let room_id = RoomId::new(payload.room_id.clone())
            .map_err(|_| RoomError::RoomNotFound(payload.room_id.clone()))?;

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let player = room.join(conn.id().clone(), payload.name.clone());
                let joined = ServerEvent::player_joined(player);
                self.registry.assign_room(conn, &room_id)?;
                let init = ServerEvent::room_init(room, conn.id());
                Ok((init, joined, ServerEvent::players_changed(room)))
            },
            |(init, joined, players_changed)| {
                tracing::info!(
                    "Client '{}' joined room '{}' as '{}'",
                    conn.id(),
                    room_id,
                    payload.name
                );

                if let Some(init) = init {
                    conn.push(init);
                }
                self.registry.broadcast_func(&room_id, |member| {
                    (member.id() != conn.id()).then(|| joined.clone())
                });
                self.registry.broadcast(&room_id, &players_changed);
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        domain::{ClientId, RoomRepository},
        infrastructure::dto::websocket::message_type,
        usecase::testing::{Harness, drain, kinds},
    };

    use super::*;

    #[test]
    fn test_join_sends_init_and_notifies_members() {
        // テスト項目: 参加者には room:init、既存メンバーには player_joined と players_changed が届く
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, mut rx_alice) = harness.connect("alice");
        let (bob, mut rx_bob) = harness.connect("bob");
        harness.join(&alice, "Alice", &room_id);
        drain(&mut rx_alice);

        // when (操作):
        harness.join(&bob, "Bob", &room_id);

        // then (期待する結果):
        assert_eq!(
            kinds(&drain(&mut rx_bob)),
            vec!["room:init", "room:players_changed"]
        );
        assert_eq!(
            kinds(&drain(&mut rx_alice)),
            vec!["room:player_joined", "room:players_changed"]
        );
        let room = harness.room(&room_id);
        assert_eq!(room.players().len(), 2);
        assert_eq!(room.host_id().map(ClientId::as_str), Some("alice"));
    }

    #[test]
    fn test_join_missing_room() {
        // テスト項目: 存在しないルームへの参加は RoomNotFound が送信者に返る
        // given (前提条件):
        let harness = Harness::new();
        let (alice, mut rx) = harness.connect("alice");

        // when (操作):
        harness.send(&alice, message_type::JOIN, json!({ "name": "Alice", "roomid": "nope" }));

        // then (期待する結果):
        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::error(
                RoomError::RoomNotFound("nope".to_string()).to_string()
            )]
        );
        assert_eq!(alice.room_id(), None);
    }

    #[test]
    fn test_join_twice_is_rejected() {
        // テスト項目: 参加済みの接続が別ルームに参加しようとすると AlreadyInRoom
        // given (前提条件):
        let harness = Harness::new();
        let r1 = harness.create_room("r1");
        let r2 = harness.create_room("r2");
        let (alice, mut rx) = harness.connect("alice");
        harness.join(&alice, "Alice", &r1);
        drain(&mut rx);

        // when (操作):
        harness.join(&alice, "Alice", &r2);

        // then (期待する結果):
        assert_eq!(
            drain(&mut rx),
            vec![ServerEvent::error(
                RoomError::AlreadyInRoom("r1".to_string()).to_string()
            )]
        );
        assert_eq!(harness.registry.member_count(&r1), 1);
        assert_eq!(harness.registry.member_count(&r2), 0);
        assert!(harness.room(&r2).players().is_empty());
    }

    #[test]
    fn test_join_with_bad_payload() {
        // テスト項目: 壊れたペイロードは DecodeFailure になり、状態は変わらない
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, mut rx) = harness.connect("alice");

        // when (操作):
        harness.send(&alice, message_type::JOIN, json!({ "name": 42 }));

        // then (期待する結果):
        let events = drain(&mut rx);
        assert_eq!(kinds(&events), vec!["error"]);
        assert!(harness.repository.find(&room_id).unwrap().players().is_empty());
    }

    #[test]
    fn test_join_after_disconnect_leaves_no_player() {
        // テスト項目: 切断済みの接続からの join はルームにプレイヤーもメンバーも残さない
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, _rx) = harness.connect("alice");
        harness.registry.remove_connection(&alice);

        // when (操作):
        harness.join(&alice, "Alice", &room_id);

        // then (期待する結果):
        let room = harness.room(&room_id);
        assert!(alice.is_closed());
        assert_eq!(alice.room_id(), None);
        assert_eq!(harness.registry.member_count(&room_id), 0);
        assert!(room.players().is_empty());
        assert_eq!(room.host_id(), None);
    }

    #[test]
    fn test_rejoin_after_leave_clears_deletion_flag() {
        // テスト項目: 空になったルームに再参加すると削除予定が解除される
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, _rx) = harness.connect("alice");
        harness.join(&alice, "Alice", &room_id);
        harness.registry.remove_connection(&alice);
        assert!(harness.room(&room_id).is_scheduled_for_deletion());

        // when (操作):
        let (again, _rx2) = harness.connect("alice");
        harness.join(&again, "Alice", &room_id);

        // then (期待する結果):
        let room = harness.room(&room_id);
        assert!(!room.is_scheduled_for_deletion());
        assert_eq!(room.host_id().map(ClientId::as_str), Some("alice"));
    }
}
