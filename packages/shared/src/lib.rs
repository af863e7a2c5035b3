//! Shared utilities for the stmsh workspace: logging setup and time helpers.

pub mod logger;
pub mod time;
