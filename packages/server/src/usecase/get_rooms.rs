//! UseCase: ルーム一覧取得

use std::sync::Arc;

use crate::domain::{Room, RoomRepository};

pub struct GetRoomsUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl GetRoomsUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }

    /// 作成順のスナップショット
    pub fn execute(&self) -> Vec<Room> {
        self.repository.list()
    }
}
