//! 接続の管理
//!
//! ## 概要
//!
//! - `client`: 1 本の WebSocket 接続（送信キュー、所属ルーム）
//! - `registry`: 接続中のクライアントとルームメンバーシップの索引

pub mod client;
pub mod registry;

pub use client::{Connection, SendError};
pub use registry::{ConnectionRegistry, LeaveHandler, RegistryError};
