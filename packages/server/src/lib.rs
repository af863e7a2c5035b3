//! Real-time voting room server.
//!
//! Clients connect over WebSocket, join a room, build a list of items,
//! vote on the candidates and see live state updates.

// layers
pub mod domain;
pub mod infrastructure;
pub mod ui;
pub mod usecase;

pub mod config;
