//! Data Transfer Objects (DTOs).
//!
//! DTOs are organized by protocol:
//! - `websocket`: inbound envelope, payloads and outbound events
//! - `http`: HTTP API response DTOs

pub mod conversion;
pub mod http;
pub mod websocket;
