//! UseCase: カウントダウンの設定（ホストのみ）

use std::sync::Arc;

use crate::{
    domain::{RoomError, RoomRepository},
    infrastructure::{
        connection::{Connection, ConnectionRegistry},
        dto::websocket::{IncomingMessage, ServerEvent, SetTimerPayload},
    },
};

use super::{
    dispatcher::{MessageHandler, current_room},
    update_room,
};

pub struct SetTimerUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl SetTimerUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl MessageHandler for SetTimerUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: SetTimerPayload = msg.decode()?;
        let room_id = current_room(conn)?;

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| room.set_timer(conn.id(), payload.time_in_seconds),
            |time| {
                tracing::debug!("Room '{}' timer set to {}s", room_id, time);
                self.registry
                    .broadcast(&room_id, &ServerEvent::timer_set(time));
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        infrastructure::dto::websocket::message_type,
        usecase::testing::{Harness, drain},
    };

    use super::*;

    #[test]
    fn test_set_timer_broadcasts() {
        // テスト項目: ホストが設定したタイマーが全員に通知される
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, mut rx_alice) = harness.connect("alice");
        let (bob, mut rx_bob) = harness.connect("bob");
        harness.join(&alice, "Alice", &room_id);
        harness.join(&bob, "Bob", &room_id);
        drain(&mut rx_alice);
        drain(&mut rx_bob);

        // when (操作):
        harness.send(&alice, message_type::SET_TIMER, json!({ "time_in_seconds": 90 }));

        // then (期待する結果):
        assert_eq!(drain(&mut rx_alice), vec![ServerEvent::timer_set(90)]);
        assert_eq!(drain(&mut rx_bob), vec![ServerEvent::timer_set(90)]);
        assert_eq!(harness.room(&room_id).time(), 90);
    }

    #[test]
    fn test_set_timer_by_non_host() {
        // テスト項目: ホスト以外のタイマー設定は NotHost で、タイマーは変わらない
        // given (前提条件):
        let harness = Harness::new();
        let room_id = harness.create_room("r1");
        let (alice, _rx_alice) = harness.connect("alice");
        let (bob, mut rx_bob) = harness.connect("bob");
        harness.join(&alice, "Alice", &room_id);
        harness.join(&bob, "Bob", &room_id);
        drain(&mut rx_bob);

        // when (操作):
        harness.send(&bob, message_type::SET_TIMER, json!({ "time_in_seconds": 30 }));

        // then (期待する結果):
        assert_eq!(
            drain(&mut rx_bob),
            vec![ServerEvent::error(RoomError::NotHost.to_string())]
        );
        assert_eq!(harness.room(&room_id).time(), 0);
    }
}
