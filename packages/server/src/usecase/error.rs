//! UseCase 層のエラー定義

use thiserror::Error;

use crate::domain::ValueObjectError;

/// HTTP 向けの参照系ユースケースのエラー
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("Invalid room id: {0}")]
    InvalidRoomId(#[from] ValueObjectError),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),
}
