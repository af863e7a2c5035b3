//! UseCase: カウントダウンを 1 秒進める
//!
//! 減算と `room:time` のブロードキャストは Room Store のロック内で行います。
//! 同じルームの `timer:set` と入れ違いになることはありません。

use std::sync::Arc;

use crate::{
    domain::RoomRepository,
    infrastructure::{connection::ConnectionRegistry, dto::websocket::ServerEvent},
};

pub struct TickRoomTimersUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl TickRoomTimersUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }

    /// 1 tick 分の処理。減算したルームの数を返す
    pub fn execute(&self) -> usize {
        self.repository.tick_timers(&mut |room_id, time| {
            self.registry
                .broadcast(room_id, &ServerEvent::room_time(time));
        })
    }
}
