//! Error taxonomy.
//!
//! Every `RoomError` is user-actionable: it is reported back to the
//! connection that caused it and never broadcast.

use thiserror::Error;

/// Errors raised by room operations and message handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room '{0}' doesn't exist")]
    RoomNotFound(String),

    #[error("Client is already in room '{0}'")]
    AlreadyInRoom(String),

    #[error("Only the host can do this")]
    NotHost,

    #[error("Can't change stage. Final stage reached")]
    FinalStageReached,

    #[error("Already voted for '{0}'")]
    AlreadyVoted(String),

    #[error("Item '{0}' is already in the list")]
    ItemAlreadyListed(String),

    #[error("Failed to decode message: {0}")]
    DecodeFailure(String),

    #[error("Join room first")]
    NotInRoom,

    #[error("Connection is closed")]
    ConnectionClosed,

    #[error("Not in voting stage")]
    NotVotingStage,

    #[error("Candidate '{0}' not found")]
    CandidateNotFound(String),
}

/// Validation errors for value objects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("{kind} is too long ({actual} > {max} bytes)")]
    TooLong {
        kind: &'static str,
        max: usize,
        actual: usize,
    },
}
