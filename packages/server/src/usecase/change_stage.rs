//! UseCase: ステージの変更（ホストのみ）
//!
//! lobby → voting → results の順にしか進みません。進むたびに全員の準備完了
//! フラグが外れるため、メンバーごとに自分の `player:update` を送ります。

use std::{collections::HashMap, sync::Arc};

use crate::{
    domain::{ClientId, RoomError, RoomRepository, Stage},
    infrastructure::{
        connection::{Connection, ConnectionRegistry},
        dto::websocket::{IncomingMessage, ServerEvent},
    },
};

use super::{
    dispatcher::{MessageHandler, current_room},
    update_room,
};

pub struct ChangeStageUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl ChangeStageUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl MessageHandler for ChangeStageUseCase {
    fn handle(&self, conn: &Arc<Connection>, _msg: &IncomingMessage) -> Result<(), RoomError> {
        let room_id = current_room(conn)?;

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let stage = room.advance_stage(conn.id())?;
                let updates: HashMap<ClientId, ServerEvent> = room
                    .players()
                    .iter()
                    .filter_map(|p| {
                        ServerEvent::player_updated(room, &p.id).map(|event| (p.id.clone(), event))
                    })
                    .collect();
                let stage_event = match stage {
                    Stage::Voting => Some(ServerEvent::stage_voting(room)),
                    Stage::Results => Some(ServerEvent::stage_results(room)),
                    Stage::Lobby => None,
                };
                Ok((stage, updates, ServerEvent::players_changed(room), stage_event))
            },
            |(stage, updates, players_changed, stage_event)| {
                tracing::info!("Room '{}' moved to stage '{}'", room_id, stage.as_str());

                self.registry
                    .broadcast_func(&room_id, |member| updates.get(member.id()).cloned());
                self.registry.broadcast(&room_id, &players_changed);
                if let Some(stage_event) = stage_event {
                    self.registry.broadcast(&room_id, &stage_event);
                }
            },
        )
    }
}
