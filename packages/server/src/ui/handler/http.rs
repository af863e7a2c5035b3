//! HTTP API endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    infrastructure::dto::{
        conversion::room_detail_dto,
        http::{CreateRoomResponseDto, RoomDetailDto, RoomSummaryDto},
    },
    ui::state::AppState,
    usecase::QueryError,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Create an empty room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<CreateRoomResponseDto>) {
    let room_id = state.create_room_usecase.execute();
    (
        StatusCode::CREATED,
        Json(CreateRoomResponseDto {
            id: room_id.into_string(),
        }),
    )
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let rooms = state.get_rooms_usecase.execute();

    // Domain Model から DTO への変換
    Json(rooms.iter().map(RoomSummaryDto::from).collect())
}

/// Get room detail by ID
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    match state.get_room_detail_usecase.execute(&room_id) {
        Ok((room, connections)) => Ok(Json(room_detail_dto(&room, connections))),
        Err(QueryError::RoomNotFound(_)) => Err(StatusCode::NOT_FOUND),
        Err(QueryError::InvalidRoomId(e)) => {
            tracing::debug!("Rejected room id '{}': {}", room_id, e);
            Err(StatusCode::BAD_REQUEST)
        }
    }
}
