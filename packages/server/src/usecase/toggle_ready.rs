//! UseCase: 準備完了フラグの切り替え

use std::sync::Arc;

use crate::{
    domain::{RoomError, RoomRepository},
    infrastructure::{
        connection::{Connection, ConnectionRegistry},
        dto::websocket::{IncomingMessage, ReadyPayload, ServerEvent},
    },
};

use super::{
    dispatcher::{MessageHandler, current_room},
    update_room,
};

pub struct ToggleReadyUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl ToggleReadyUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl MessageHandler for ToggleReadyUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: ReadyPayload = msg.decode()?;
        let room_id = current_room(conn)?;

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                room.set_ready(conn.id(), payload.ready)?;
                Ok((
                    ServerEvent::player_updated(room, conn.id()),
                    ServerEvent::players_changed(room),
                ))
            },
            |(updated, players_changed)| {
                if let Some(updated) = updated {
                    conn.push(updated);
                }
                self.registry.broadcast(&room_id, &players_changed);
            },
        )
    }
}
