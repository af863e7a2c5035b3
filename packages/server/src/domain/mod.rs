//! Domain layer: the Room aggregate, its value objects and the error taxonomy.
//!
//! Nothing in here knows about sockets, locks or JSON. The Room Store
//! (`RoomRepository`) is defined here and implemented by the infrastructure
//! layer.

pub mod entity;
pub mod error;
pub mod repository;
pub mod value_object;

pub use entity::{Candidate, Departure, ListItem, Player, Results, Room, Stage, VoteOutcome};
pub use error::{RoomError, ValueObjectError};
pub use repository::RoomRepository;
pub use value_object::{ClientId, ClientIdFactory, RoomId, RoomIdFactory};
