//! Time-related utilities with clock abstraction for testability.

use chrono::{DateTime, SecondsFormat, Utc};

/// Clock trait for dependency injection and testing
pub trait Clock: Send + Sync {
    /// Current Unix timestamp in milliseconds
    fn now_millis(&self) -> i64;
}

/// System clock implementation (uses actual system time)
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        now_millis()
    }
}

/// Fixed clock implementation for testing (returns a fixed time)
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    fixed_time: i64,
}

impl FixedClock {
    /// Create a new fixed clock with the given timestamp
    pub fn new(fixed_time_millis: i64) -> Self {
        Self {
            fixed_time: fixed_time_millis,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.fixed_time
    }
}

/// Current Unix timestamp in milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a Unix timestamp (milliseconds) to RFC 3339 in UTC.
///
/// Returns `None` when the timestamp is out of chrono's representable range.
pub fn millis_to_rfc3339(timestamp_millis: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(timestamp_millis)
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Format a countdown in whole seconds as `m:ss`.
pub fn format_countdown(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
