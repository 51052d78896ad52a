//! WebSocket types and configuration

use std::time::Duration;

/// Close code for a normal, intentional shutdown
pub const CLOSE_NORMAL: u16 = 1000;
/// Close code sent when the server or page is going away
pub const CLOSE_GOING_AWAY: u16 = 1001;

/// Transport configuration shared by every connection a connector opens
#[derive(Debug, Clone)]
pub struct WsConfig {
    /// Interval for sending ping frames
    pub ping_interval: Duration,
    /// Timeout for pong response
    pub pong_timeout: Duration,
    /// Capacity of the per-connection event channel
    pub channel_capacity: usize,
}

impl Default for WsConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
            channel_capacity: 1024,
        }
    }
}

impl WsConfig {
    /// Set ping interval
    pub fn ping_interval(mut self, d: Duration) -> Self {
        self.ping_interval = d;
        self
    }

    /// Set pong timeout
    pub fn pong_timeout(mut self, d: Duration) -> Self {
        self.pong_timeout = d;
        self
    }

    /// Set event channel capacity
    pub fn channel_capacity(mut self, n: usize) -> Self {
        self.channel_capacity = n.max(1);
        self
    }
}

/// Terminal callbacks of one transport handle, delivered in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Handshake completed
    Opened,
    /// Text frame received
    Message(String),
    /// Transport-level failure; a `Closed` event follows
    Error(String),
    /// Connection ended, with the peer's close code if one was sent
    Closed { code: Option<u16> },
}

/// Lifecycle of a stream connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Idle,
    Connecting,
    Open,
    Closed,
}

/// What a consumer can observe about connectivity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionStatus {
    pub state: ConnectionState,
    /// Last transport error, cleared when a connection opens
    pub last_error: Option<String>,
    /// Reconnect timers that have fired over the feed's lifetime
    pub reconnects: u32,
}

impl ConnectionStatus {
    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Open
    }
}

/// Whether a close event schedules a reconnect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Retry after every close
    Always,
    /// Retry unless the peer closed with Normal (1000) or Going Away (1001)
    UnlessCleanClose,
}

impl ReconnectPolicy {
    /// Decide whether a close with `code` should be retried
    pub fn should_retry(self, code: Option<u16>) -> bool {
        match self {
            ReconnectPolicy::Always => true,
            ReconnectPolicy::UnlessCleanClose => {
                !matches!(code, Some(CLOSE_NORMAL) | Some(CLOSE_GOING_AWAY))
            }
        }
    }
}
