//! UseCase: ルーム詳細取得

use std::sync::Arc;

use crate::{
    domain::{Room, RoomId, RoomRepository},
    infrastructure::connection::ConnectionRegistry,
};

use super::error::QueryError;

pub struct GetRoomDetailUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl GetRoomDetailUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// ルームのスナップショットと、そのルームに所属している接続数
    pub fn execute(&self, room_id: &str) -> Result<(Room, usize), QueryError> {
        let room_id = RoomId::new(room_id.to_string())?;
        let room = self
            .repository
            .find(&room_id)
            .ok_or_else(|| QueryError::RoomNotFound(room_id.to_string()))?;
        let connections = self.registry.member_count(&room_id);
        Ok((room, connections))
    }
}
