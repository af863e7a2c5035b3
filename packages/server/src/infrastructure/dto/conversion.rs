//! Conversion logic between DTOs and domain entities.

use chrono::NaiveDate;
use stmsh_shared::time::millis_to_rfc3339;

use crate::domain::{Candidate, ClientId, ListItem, Player, Room};
use crate::infrastructure::dto::{http, websocket as dto};

// ========================================
// DTO → Domain Entity
// ========================================

impl From<dto::ListAddPayload> for ListItem {
    fn from(payload: dto::ListAddPayload) -> Self {
        Self {
            id: payload.id.into_string(),
            title: payload.title,
            overview: payload.overview,
            rating: payload.rating,
            release_date: NaiveDate::parse_from_str(&payload.release_date, "%Y-%m-%d").ok(),
            poster_path: payload.poster_path,
        }
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&ListItem> for dto::ListItemDto {
    fn from(item: &ListItem) -> Self {
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            overview: item.overview.clone(),
            rating: item.rating,
            release_date: item.release_date,
            poster_path: item.poster_path.clone(),
        }
    }
}

impl From<&Candidate> for dto::CandidateDto {
    fn from(candidate: &Candidate) -> Self {
        let item = &candidate.item;
        Self {
            id: item.id.clone(),
            title: item.title.clone(),
            overview: item.overview.clone(),
            rating: item.rating,
            release_date: item.release_date,
            poster_path: item.poster_path.clone(),
            suggested_by: candidate.suggested_by.as_str().to_string(),
        }
    }
}

impl From<&Candidate> for dto::ResultEntryDto {
    fn from(candidate: &Candidate) -> Self {
        Self {
            id: candidate.item.id.clone(),
            title: candidate.item.title.clone(),
            poster_path: candidate.item.poster_path.clone(),
            suggested_by: candidate.suggested_by.as_str().to_string(),
            score: candidate.score,
        }
    }
}

/// Player as seen by clients; whether they host depends on the room.
pub fn player_dto(player: &Player, room: &Room) -> dto::PlayerDto {
    dto::PlayerDto {
        id: player.id.as_str().to_string(),
        name: player.name.clone(),
        ready: player.ready,
        is_host: room.is_host(&player.id),
    }
}

fn list_dto(list: &[ListItem]) -> Vec<dto::ListItemDto> {
    list.iter().map(Into::into).collect()
}

fn candidate_dtos<'a>(
    candidates: impl IntoIterator<Item = &'a Candidate>,
) -> Vec<dto::CandidateDto> {
    candidates.into_iter().map(Into::into).collect()
}

fn result_dtos(candidates: &[Candidate]) -> Vec<dto::ResultEntryDto> {
    candidates.iter().map(Into::into).collect()
}

/// Event builders. Each reads the room as it is inside the current update.
impl dto::ServerEvent {
    /// Full room state for a player who just joined.
    ///
    /// Returns `None` when `user` is not a player of the room.
    pub fn room_init(room: &Room, user: &ClientId) -> Option<Self> {
        let player = room.player(user)?;
        let results = room.results();

        Some(Self::RoomInit(dto::RoomInitEvent {
            id: room.id.as_str().to_string(),
            user: player_dto(player, room),
            stage: room.stage().as_str().to_string(),
            time: room.time(),
            list: list_dto(room.list_of(user)),
            players: room.players().iter().map(|p| player_dto(p, room)).collect(),
            candidates: candidate_dtos(room.candidates_left_for(user)),
            winners: result_dtos(&results.winners),
            others: result_dtos(&results.others),
        }))
    }

    pub fn player_joined(player: &Player) -> Self {
        Self::PlayerJoined(dto::PlayerJoinedEvent {
            id: player.id.as_str().to_string(),
            name: player.name.clone(),
        })
    }

    pub fn players_changed(room: &Room) -> Self {
        Self::PlayersChanged(dto::PlayersChangedEvent {
            ready: room.ready_count(),
            total: room.players().len(),
            players: room.players().iter().map(|p| player_dto(p, room)).collect(),
        })
    }

    /// `None` when `id` is not a player of the room.
    pub fn player_updated(room: &Room, id: &ClientId) -> Option<Self> {
        room.player(id)
            .map(|player| Self::PlayerUpdated(player_dto(player, room)))
    }

    /// `None` when the room has no host.
    pub fn host_changed(room: &Room) -> Option<Self> {
        room.host().map(|host| {
            Self::HostChanged(dto::HostChangedEvent {
                id: host.id.as_str().to_string(),
                name: host.name.clone(),
            })
        })
    }

    pub fn timer_set(time: u64) -> Self {
        Self::TimerSet(dto::TimeEvent { time })
    }

    pub fn room_time(time: u64) -> Self {
        Self::RoomTime(dto::TimeEvent { time })
    }

    pub fn stage_voting(room: &Room) -> Self {
        Self::StageVoting(dto::CandidatesEvent {
            candidates: candidate_dtos(room.candidates()),
        })
    }

    pub fn vote_registered(room: &Room, voter: &ClientId) -> Self {
        Self::VoteRegistered(dto::CandidatesEvent {
            candidates: candidate_dtos(room.candidates_left_for(voter)),
        })
    }

    pub fn stage_results(room: &Room) -> Self {
        let results = room.results();
        Self::StageResults(dto::StageResultsEvent {
            winners: result_dtos(&results.winners),
            others: result_dtos(&results.others),
        })
    }

    pub fn list_changed(list: &[ListItem]) -> Self {
        Self::ListChanged(dto::ListChangedEvent {
            list: list_dto(list),
        })
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(dto::ErrorEvent {
            message: message.into(),
        })
    }
}

impl From<&Room> for http::RoomSummaryDto {
    fn from(room: &Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            stage: room.stage().as_str().to_string(),
            players: room
                .players()
                .iter()
                .map(|p| p.id.as_str().to_string())
                .collect(),
            created_at: millis_to_rfc3339(room.created_at),
        }
    }
}

/// Room detail for the HTTP API, with the live connection count from the registry.
pub fn room_detail_dto(room: &Room, connections: usize) -> http::RoomDetailDto {
    http::RoomDetailDto {
        id: room.id.as_str().to_string(),
        stage: room.stage().as_str().to_string(),
        host_id: room.host_id().map(|id| id.as_str().to_string()),
        time: room.time(),
        scheduled_for_deletion: room.is_scheduled_for_deletion(),
        players: room
            .players()
            .iter()
            .map(|p| http::PlayerDetailDto {
                id: p.id.as_str().to_string(),
                name: p.name.clone(),
                ready: p.ready,
                is_host: room.is_host(&p.id),
            })
            .collect(),
        candidates: room.candidates().len(),
        connections,
        created_at: millis_to_rfc3339(room.created_at),
    }
}
