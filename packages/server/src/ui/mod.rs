//! WebSocket and HTTP surface of the session server.

mod handler;
mod scheduler;
mod server;
mod signal;
pub mod state;

pub use server::Server;
