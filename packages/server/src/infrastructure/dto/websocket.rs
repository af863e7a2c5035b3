//! WebSocket message DTOs.
//!
//! Inbound frames are `{"type": "...", "payload": {...}}` envelopes whose
//! payload each handler decodes itself. Outbound events form the closed
//! `ServerEvent` enum, tagged by `type`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::domain::RoomError;

/// Inbound message tags.
pub mod message_type {
    pub const JOIN: &str = "join";
    pub const READY: &str = "ready";
    pub const NEXT_STAGE: &str = "next_stage";
    pub const SET_TIMER: &str = "set_timer";
    pub const LIST_ADD: &str = "list_add";
    pub const LIST_REMOVE: &str = "list_remove";
    pub const VOTE: &str = "vote";
}

/// Inbound envelope: a type tag plus an opaque payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IncomingMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl IncomingMessage {
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Decode the payload into a handler-specific type.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, RoomError> {
        T::deserialize(&self.payload).map_err(|e| RoomError::DecodeFailure(e.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinPayload {
    pub name: String,
    #[serde(rename = "roomid")]
    pub room_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadyPayload {
    pub ready: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetTimerPayload {
    pub time_in_seconds: u64,
}

/// List items arrive in the movie search result shape; ids may be numeric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ItemIdDto {
    Number(u64),
    Text(String),
}

impl ItemIdDto {
    pub fn into_string(self) -> String {
        match self {
            ItemIdDto::Number(n) => n.to_string(),
            ItemIdDto::Text(s) => s,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListAddPayload {
    pub id: ItemIdDto,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(rename = "vote_average", default)]
    pub rating: f32,
    /// `YYYY-MM-DD`; anything else is treated as unknown
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub poster_path: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListRemovePayload {
    pub id: ItemIdDto,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VotePayload {
    pub id: ItemIdDto,
    pub vote: bool,
}

// ========================================
// Outbound
// ========================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDto {
    pub id: String,
    pub name: String,
    pub ready: bool,
    #[serde(rename = "isHost")]
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListItemDto {
    pub id: String,
    pub title: String,
    pub overview: String,
    pub rating: f32,
    pub release_date: Option<NaiveDate>,
    pub poster_path: String,
}

/// A candidate as shown while voting; scores stay hidden until results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateDto {
    pub id: String,
    pub title: String,
    pub overview: String,
    pub rating: f32,
    pub release_date: Option<NaiveDate>,
    pub poster_path: String,
    #[serde(rename = "suggestedBy")]
    pub suggested_by: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEntryDto {
    pub id: String,
    pub title: String,
    pub poster_path: String,
    #[serde(rename = "suggestedBy")]
    pub suggested_by: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomInitEvent {
    pub id: String,
    pub user: PlayerDto,
    pub stage: String,
    /// Remaining countdown in seconds
    pub time: u64,
    pub list: Vec<ListItemDto>,
    pub players: Vec<PlayerDto>,
    pub candidates: Vec<CandidateDto>,
    pub winners: Vec<ResultEntryDto>,
    pub others: Vec<ResultEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerJoinedEvent {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayersChangedEvent {
    pub ready: usize,
    pub total: usize,
    pub players: Vec<PlayerDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostChangedEvent {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEvent {
    pub time: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatesEvent {
    pub candidates: Vec<CandidateDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageResultsEvent {
    pub winners: Vec<ResultEntryDto>,
    pub others: Vec<ResultEntryDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListChangedEvent {
    pub list: Vec<ListItemDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEvent {
    pub message: String,
}

/// Every event the server can push to a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    #[serde(rename = "room:init")]
    RoomInit(RoomInitEvent),
    #[serde(rename = "room:player_joined")]
    PlayerJoined(PlayerJoinedEvent),
    #[serde(rename = "room:players_changed")]
    PlayersChanged(PlayersChangedEvent),
    #[serde(rename = "room:host_changed")]
    HostChanged(HostChangedEvent),
    #[serde(rename = "room:timer_set")]
    TimerSet(TimeEvent),
    #[serde(rename = "room:time")]
    RoomTime(TimeEvent),
    #[serde(rename = "room:stage_voting")]
    StageVoting(CandidatesEvent),
    /// Candidates the recipient has not voted on yet
    #[serde(rename = "room:vote_registered")]
    VoteRegistered(CandidatesEvent),
    #[serde(rename = "room:stage_results")]
    StageResults(StageResultsEvent),
    #[serde(rename = "player:update")]
    PlayerUpdated(PlayerDto),
    #[serde(rename = "player:list_changed")]
    ListChanged(ListChangedEvent),
    #[serde(rename = "error")]
    Error(ErrorEvent),
}

impl ServerEvent {
    /// The wire tag of this event.
    pub fn kind(&self) -> &'static str {
        match self {
            ServerEvent::RoomInit(_) => "room:init",
            ServerEvent::PlayerJoined(_) => "room:player_joined",
            ServerEvent::PlayersChanged(_) => "room:players_changed",
            ServerEvent::HostChanged(_) => "room:host_changed",
            ServerEvent::TimerSet(_) => "room:timer_set",
            ServerEvent::RoomTime(_) => "room:time",
            ServerEvent::StageVoting(_) => "room:stage_voting",
            ServerEvent::VoteRegistered(_) => "room:vote_registered",
            ServerEvent::StageResults(_) => "room:stage_results",
            ServerEvent::PlayerUpdated(_) => "player:update",
            ServerEvent::ListChanged(_) => "player:list_changed",
            ServerEvent::Error(_) => "error",
        }
    }
}
