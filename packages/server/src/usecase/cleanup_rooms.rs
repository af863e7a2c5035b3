//! UseCase: 削除予定のルームを回収する
//!
//! Room Store のロック内で削除予定のルームを取り除き、ロックを手放してから
//! レジストリ側のメンバーシップを削除します。

use std::sync::Arc;

use crate::{
    domain::{RoomId, RoomRepository},
    infrastructure::connection::ConnectionRegistry,
};

pub struct CleanupRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl CleanupRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 削除したルームの ID を返す
    pub fn execute(&self) -> Vec<RoomId> {
        let removed = self.repository.take_scheduled_for_deletion();
        for room_id in &removed {
            self.registry.delete_room(room_id);
        }
        if !removed.is_empty() {
            tracing::info!("Cleaned up {} empty room(s)", removed.len());
        }
        removed
    }
}
