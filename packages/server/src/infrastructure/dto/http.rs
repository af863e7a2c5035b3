//! HTTP API response DTOs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateRoomResponseDto {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub stage: String,
    pub players: Vec<String>,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDetailDto {
    pub id: String,
    pub name: String,
    pub ready: bool,
    pub is_host: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub stage: String,
    pub host_id: Option<String>,
    pub time: u64,
    pub scheduled_for_deletion: bool,
    pub players: Vec<PlayerDetailDto>,
    pub candidates: usize,
    pub connections: usize,
    pub created_at: Option<String>,
}
