//! In-memory Room Store.

pub mod room;

pub use room::InMemoryRoomRepository;
