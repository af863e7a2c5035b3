//! 接続レジストリ
//!
//! ## 責務
//!
//! - 接続中のクライアントの索引（client_id -> 接続）
//! - ルームごとのメンバー接続の索引（room_id -> 接続の列）
//! - ブロードキャスト
//!
//! ## ロック
//!
//! 内部状態は 1 つの `RwLock` で守ります。`await` をまたいでロックを保持する
//! ことはありません。退出ハンドラー（`LeaveHandler`）はロック解放後に呼ばれる
//! ため、ハンドラーからレジストリを再度呼び出しても安全です。

use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use thiserror::Error;

use crate::{
    domain::{ClientId, RoomError, RoomId},
    infrastructure::dto::websocket::ServerEvent,
};

use super::client::Connection;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Client '{0}' is already connected")]
    DuplicateClientId(String),
}

/// ルーム所属中の接続が外れたときに呼ばれるフック
#[cfg_attr(test, mockall::automock)]
pub trait LeaveHandler: Send + Sync {
    fn on_leave(&self, registry: &ConnectionRegistry, conn: &Arc<Connection>);
}

#[derive(Default)]
struct RegistryInner {
    clients: HashMap<ClientId, Arc<Connection>>,
    rooms: HashMap<RoomId, Vec<Arc<Connection>>>,
}

impl RegistryInner {
    /// 同じ client_id で別の接続に置き換わっていないか
    fn is_registered(&self, conn: &Arc<Connection>) -> bool {
        self.clients
            .get(conn.id())
            .is_some_and(|c| Arc::ptr_eq(c, conn))
    }
}

pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
    leave_handler: Arc<dyn LeaveHandler>,
}

impl ConnectionRegistry {
    pub fn new(leave_handler: Arc<dyn LeaveHandler>) -> Self {
        Self {
            inner: RwLock::new(RegistryInner::default()),
            leave_handler,
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, RegistryInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, RegistryInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// 接続を登録する。同じ client_id の接続が既にあれば拒否
    pub fn add_connection(&self, conn: Arc<Connection>) -> Result<(), RegistryError> {
        let mut inner = self.write();
        if inner.clients.contains_key(conn.id()) {
            return Err(RegistryError::DuplicateClientId(conn.id().to_string()));
        }
        tracing::debug!("Client '{}' registered", conn.id());
        inner.clients.insert(conn.id().clone(), conn);
        Ok(())
    }

    /// 接続をルームに所属させる
    ///
    /// 既にどこかのルームに所属していれば `AlreadyInRoom`、`remove_connection`
    /// 済みの接続なら `ConnectionClosed` を返します。
    pub fn assign_room(&self, conn: &Arc<Connection>, room_id: &RoomId) -> Result<(), RoomError> {
        let mut inner = self.write();
        if !inner.is_registered(conn) {
            return Err(RoomError::ConnectionClosed);
        }
        if let Some(current) = conn.room_id() {
            return Err(RoomError::AlreadyInRoom(current.to_string()));
        }
        let members = inner.rooms.entry(room_id.clone()).or_default();
        if !members.iter().any(|m| Arc::ptr_eq(m, conn)) {
            members.push(Arc::clone(conn));
        }
        conn.set_room(Some(room_id.clone()));
        tracing::debug!("Client '{}' assigned to room '{}'", conn.id(), room_id);
        Ok(())
    }

    /// 接続を取り除き、送信キューを閉じる
    ///
    /// 何度呼んでも効果は 1 回だけです。最初の呼び出しでのみ `true` を返し、
    /// 接続がルームに所属していれば `LeaveHandler` を呼びます。
    ///
    /// 取り除いた後も `conn.room_id()` は元のルームを指したままです。
    /// `LeaveHandler` はこの値から退出先のルームを知ります。
    pub fn remove_connection(&self, conn: &Arc<Connection>) -> bool {
        let left_room = {
            let mut inner = self.write();
            if !inner.is_registered(conn) {
                return false;
            }
            inner.clients.remove(conn.id());

            let room_id = conn.room_id();
            if let Some(room_id) = &room_id {
                if let Some(members) = inner.rooms.get_mut(room_id) {
                    members.retain(|m| !Arc::ptr_eq(m, conn));
                    if members.is_empty() {
                        inner.rooms.remove(room_id);
                    }
                }
            }
            conn.close();
            room_id.is_some()
        };

        tracing::info!("Client '{}' removed from registry", conn.id());
        if left_room {
            self.leave_handler.on_leave(self, conn);
        }
        true
    }

    /// ルームの全メンバーを `remove_connection` で取り除き、メンバー索引を削除する
    pub fn delete_room(&self, room_id: &RoomId) {
        let members = self.members(room_id);
        for member in &members {
            self.remove_connection(member);
        }
        self.write().rooms.remove(room_id);
        tracing::debug!(
            "Room '{}' removed from registry ({} members dropped)",
            room_id,
            members.len()
        );
    }

    /// ルームの全メンバーに同じイベントを送る
    pub fn broadcast(&self, room_id: &RoomId, event: &ServerEvent) {
        let members = self.members(room_id);
        if members.is_empty() {
            tracing::debug!("No members in room '{}', dropping '{}'", room_id, event.kind());
        }
        for member in members {
            member.push(event.clone());
        }
    }

    /// ルームの全メンバーに、メンバーごとに組み立てたイベントを送る
    ///
    /// `f` が `None` を返したメンバーには何も送りません。
    pub fn broadcast_func<F>(&self, room_id: &RoomId, mut f: F)
    where
        F: FnMut(&Connection) -> Option<ServerEvent>,
    {
        for member in self.members(room_id) {
            if let Some(event) = f(member.as_ref()) {
                member.push(event);
            }
        }
    }

    /// 特定のクライアントに送る。接続がなければ何もしない
    pub fn send(&self, client_id: &ClientId, event: ServerEvent) {
        let conn = self.read().clients.get(client_id).cloned();
        match conn {
            Some(conn) => conn.push(event),
            None => tracing::debug!("Client '{}' not connected, dropping event", client_id),
        }
    }

    /// ルームのメンバー（参加順）
    pub fn members(&self, room_id: &RoomId) -> Vec<Arc<Connection>> {
        self.read().rooms.get(room_id).cloned().unwrap_or_default()
    }

    pub fn connection(&self, client_id: &ClientId) -> Option<Arc<Connection>> {
        self.read().clients.get(client_id).cloned()
    }

    pub fn connection_count(&self) -> usize {
        self.read().clients.len()
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.read().rooms.get(room_id).map_or(0, Vec::len)
    }
}
