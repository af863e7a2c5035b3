//! UseCase: 自分の候補リストの編集
//!
//! リストは投票ステージに入るときに候補として集められます。変更結果は送信者
//! にだけ返します。

use std::sync::Arc;

use crate::{
    domain::{ListItem, RoomError, RoomRepository},
    infrastructure::{
        connection::Connection,
        dto::websocket::{IncomingMessage, ListAddPayload, ListRemovePayload, ServerEvent},
    },
};

use super::{
    dispatcher::{MessageHandler, current_room},
    update_room,
};

/// リストへの追加
pub struct ListAddUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl ListAddUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }
}

impl MessageHandler for ListAddUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: ListAddPayload = msg.decode()?;
        let room_id = current_room(conn)?;
        let item = ListItem::from(payload);

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let list = room.add_list_item(conn.id(), item.clone())?;
                Ok(ServerEvent::list_changed(list))
            },
            |changed| {
                tracing::debug!("Client '{}' listed '{}'", conn.id(), item.id);
                conn.push(changed);
            },
        )
    }
}

/// リストからの削除。載っていない ID は何もしない
pub struct ListRemoveUseCase {
    repository: Arc<dyn RoomRepository>,
}

impl ListRemoveUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>) -> Self {
        Self { repository }
    }
}

impl MessageHandler for ListRemoveUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: ListRemovePayload = msg.decode()?;
        let room_id = current_room(conn)?;
        let item_id = payload.id.into_string();

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let list = room.remove_list_item(conn.id(), &item_id)?;
                Ok(ServerEvent::list_changed(list))
            },
            |changed| conn.push(changed),
        )
    }
}
