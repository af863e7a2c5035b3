//! InMemory Room Repository 実装
//!
//! ドメイン層が定義する RoomRepository trait の具体的な実装。
//! HashMap をインメモリ DB として使用し、単一の `RwLock` で保護します。
//!
//! ## 更新の原子性
//!
//! `update` はロックを保持したまま Room を複製し、クロージャを複製に適用します。
//! クロージャが `Ok` を返した場合のみ複製を書き戻すため、途中でエラーになった
//! 変更が他の読み手に見えることはありません。

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::domain::{Room, RoomError, RoomId, RoomRepository};

/// インメモリ Room Repository 実装
#[derive(Default)]
pub struct InMemoryRoomRepository {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl InMemoryRoomRepository {
    /// 新しい InMemoryRoomRepository を作成
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RoomId, Room>> {
        self.rooms.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RoomRepository for InMemoryRoomRepository {
    fn add(&self, room: Room) {
        tracing::debug!("Room '{}' added to store", room.id);
        self.write().insert(room.id.clone(), room);
    }

    fn find(&self, id: &RoomId) -> Option<Room> {
        self.read().get(id).cloned()
    }

    fn update(
        &self,
        id: &RoomId,
        f: &mut dyn FnMut(&mut Room) -> Result<(), RoomError>,
    ) -> Result<(), RoomError> {
        let mut rooms = self.write();

        let Some(current) = rooms.get(id) else {
            return Err(RoomError::RoomNotFound(id.to_string()));
        };

        let mut updated = current.clone();
        f(&mut updated)?;
        rooms.insert(id.clone(), updated);

        Ok(())
    }

    fn delete(&self, id: &RoomId) {
        if self.write().remove(id).is_some() {
            tracing::debug!("Room '{}' deleted from store", id);
        }
    }

    fn list(&self) -> Vec<Room> {
        let mut rooms: Vec<Room> = self.read().values().cloned().collect();
        rooms.sort_by_key(|room| room.created_at);
        rooms
    }

    fn tick_timers(&self, on_tick: &mut dyn FnMut(&RoomId, u64)) -> usize {
        let mut rooms = self.write();
        let mut ticked = 0;
        for room in rooms.values_mut() {
            if let Some(time) = room.tick_timer() {
                on_tick(&room.id, time);
                ticked += 1;
            }
        }
        ticked
    }

    fn take_scheduled_for_deletion(&self) -> Vec<RoomId> {
        let mut rooms = self.write();
        let ids: Vec<RoomId> = rooms
            .values()
            .filter(|room| room.is_scheduled_for_deletion())
            .map(|room| room.id.clone())
            .collect();
        for id in &ids {
            rooms.remove(id);
        }
        ids
    }
}
