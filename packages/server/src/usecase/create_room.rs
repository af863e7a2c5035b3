//! UseCase: ルーム作成

use std::sync::Arc;

use stmsh_shared::time::Clock;

use crate::domain::{Room, RoomId, RoomIdFactory, RoomRepository};

pub struct CreateRoomUseCase {
    repository: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

impl CreateRoomUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repository, clock }
    }

    /// 空のルームを作成し、その ID を返す
    pub fn execute(&self) -> RoomId {
        let room = Room::new(RoomIdFactory::generate(), self.clock.now_millis());
        let room_id = room.id.clone();
        self.repository.add(room);
        tracing::info!("Room '{}' created", room_id);
        room_id
    }
}
