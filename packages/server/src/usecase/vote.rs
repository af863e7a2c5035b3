//! UseCase: 候補への投票
//!
//! 投票ステージでのみ受け付けます。同じ候補への 2 回目の投票は
//! `AlreadyVoted` になり、スコアは変わりません。全候補に投票し終えた
//! プレイヤーは準備完了になります。

use std::sync::Arc;

use crate::{
    domain::{RoomError, RoomRepository},
    infrastructure::{
        connection::{Connection, ConnectionRegistry},
        dto::websocket::{IncomingMessage, ServerEvent, VotePayload},
    },
};

use super::{
    dispatcher::{MessageHandler, current_room},
    update_room,
};

pub struct VoteUseCase {
    repository: Arc<dyn RoomRepository>,
    registry: Arc<ConnectionRegistry>,
}

impl VoteUseCase {
    pub fn new(repository: Arc<dyn RoomRepository>, registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            repository,
            registry,
        }
    }
}

impl MessageHandler for VoteUseCase {
    fn handle(&self, conn: &Arc<Connection>, msg: &IncomingMessage) -> Result<(), RoomError> {
        let payload: VotePayload = msg.decode()?;
        let room_id = current_room(conn)?;
        let candidate_id = payload.id.into_string();

        update_room(
            self.repository.as_ref(),
            &room_id,
            |room| {
                let outcome = room.vote(conn.id(), &candidate_id, payload.vote)?;
                let finished = (outcome.candidates_left == 0).then(|| {
                    (
                        ServerEvent::player_updated(room, conn.id()),
                        ServerEvent::players_changed(room),
                    )
                });
                Ok((ServerEvent::vote_registered(room, conn.id()), finished))
            },
            |(registered, finished)| {
                tracing::debug!(
                    "Client '{}' voted {} on '{}'",
                    conn.id(),
                    if payload.vote { "for" } else { "against" },
                    candidate_id
                );

                if let Some((updated, players_changed)) = finished {
                    if let Some(updated) = updated {
                        conn.push(updated);
                    }
                    self.registry.broadcast(&room_id, &players_changed);
                }
                conn.push(registered);
            },
        )
    }
}
