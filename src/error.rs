//! Error types for the stream client

use thiserror::Error;

/// Errors raised while building or running a feed transport
///
/// None of these are fatal to a feed: the supervisor turns them into a
/// connectivity message and a scheduled retry.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Page origin has no usable scheme or host
    #[error("invalid origin: {0}")]
    InvalidOrigin(String),

    /// Derived stream URL was rejected by the WebSocket client
    #[error("invalid stream url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// Transport was constructed outside a tokio runtime
    #[error("no async runtime available to drive the transport")]
    NoRuntime,

    /// Handshake or socket failure
    #[error("connection failed: {0}")]
    Connection(String),

    /// Server stopped answering keepalive pings
    #[error("pong timeout")]
    PongTimeout,

    /// Socket ended without a close frame
    #[error("stream ended unexpectedly")]
    StreamEnded,

    /// Frame payload is not the JSON we expect
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<tokio_tungstenite::tungstenite::Error> for FeedError {
    fn from(value: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Connection(value.to_string())
    }
}
