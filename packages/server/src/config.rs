//! Runtime settings for the session server.

use std::time::Duration;

/// Time allowed to write one frame to a peer.
pub const DEFAULT_WRITE_WAIT: Duration = Duration::from_secs(10);
/// Time allowed to read the next frame (any frame, pongs included) from a peer.
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(60);
/// Ping period. Must be shorter than the pong wait.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(54);
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 2048;
pub const DEFAULT_OUTBOX_CAPACITY: usize = 64;
pub const DEFAULT_TIMER_TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub write_wait: Duration,
    pub pong_wait: Duration,
    pub ping_interval: Duration,
    /// Largest inbound message accepted, in bytes
    pub max_message_size: usize,
    /// Events buffered per connection before new ones are dropped
    pub outbox_capacity: usize,
    pub timer_tick: Duration,
    pub cleanup_interval: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            write_wait: DEFAULT_WRITE_WAIT,
            pong_wait: DEFAULT_PONG_WAIT,
            ping_interval: DEFAULT_PING_INTERVAL,
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            outbox_capacity: DEFAULT_OUTBOX_CAPACITY,
            timer_tick: DEFAULT_TIMER_TICK,
            cleanup_interval: DEFAULT_CLEANUP_INTERVAL,
        }
    }
}

impl ServerConfig {
    /// Keep the ping period strictly inside the read deadline, otherwise idle
    /// but healthy peers would time out between pings.
    pub fn normalized(mut self) -> Self {
        if self.ping_interval >= self.pong_wait {
            let adjusted = self.pong_wait.mul_f64(0.9);
            tracing::warn!(
                "ping interval {:?} is not shorter than pong wait {:?}, using {:?}",
                self.ping_interval,
                self.pong_wait,
                adjusted
            );
            self.ping_interval = adjusted;
        }
        self.outbox_capacity = self.outbox_capacity.max(1);
        self
    }
}
