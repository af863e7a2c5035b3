//! UseCase: ルーム退出
//!
//! `ConnectionRegistry` が接続を取り除いたあと、レジストリのロックの外から呼ばれます。
//! ホストが抜けた場合は参加順で最も早いプレイヤーに引き継ぎます。
//! 誰もいなくなったルームは削除予定になり、cleanup スケジューラーが回収します。

use std::sync::Arc;

use crate::{
    domain::{RoomError, RoomRepository},
    infrastructure::{
        connection::{Connection, ConnectionRegistry, LeaveHandler},
        dto::websocket::ServerEvent,
    },
};

use super::update_room;

pub struct LeaveRoomUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl LeaveRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }
}

impl LeaveHandler for LeaveRoomUseCase {
    fn on_leave(&self, registry: &ConnectionRegistry, conn: &Arc<Connection>) {
        let Some(room_id) = conn.room_id() else {
            return;
        };

        let result = update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let departure = room.remove_player(conn.id());
                let host_change = departure.new_host.as_ref().and_then(|host| {
                    Some((
                        host.clone(),
                        ServerEvent::host_changed(room)?,
                        ServerEvent::player_updated(room, host)?,
                    ))
                });
                Ok((
                    host_change,
                    ServerEvent::players_changed(room),
                    departure.scheduled_for_deletion,
                ))
            },
            |(host_change, players_changed, scheduled_for_deletion)| {
                tracing::info!("Client '{}' left room '{}'", conn.id(), room_id);

                if let Some((host, host_changed, host_updated)) = host_change {
                    tracing::info!("Room '{}' host handed to '{}'", room_id, host);
                    registry.broadcast(&room_id, &host_changed);
                    registry.send(&host, host_updated);
                }
                registry.broadcast(&room_id, &players_changed);
                scheduled_for_deletion
            },
        );

        match result {
            Ok(true) => tracing::info!("Room '{}' is empty, scheduled for deletion", room_id),
            Ok(false) => {}
            Err(RoomError::RoomNotFound(_)) => {
                tracing::debug!("Room '{}' already gone, nothing to leave", room_id);
            }
            Err(e) => {
                tracing::warn!("Client '{}' failed to leave room '{}': {}", conn.id(), room_id, e);
            }
        }
    }
}
