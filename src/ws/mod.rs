//! WebSocket stream connections
//!
//! Provides the transport abstraction, a tungstenite-backed connector, an
//! in-process loopback connector, and the supervisor that keeps exactly one
//! connection alive with fixed-delay reconnection.

mod client;
mod loopback;
mod supervisor;
mod types;

pub use client::{stream_url, Connector, WsConnector};
pub use loopback::{LoopbackConnector, LoopbackPeer};
pub use supervisor::{FrameHandler, Supervisor, SupervisorConfig};
pub use types::{
    ConnectionState, ConnectionStatus, ReconnectPolicy, TransportEvent, WsConfig,
    CLOSE_GOING_AWAY, CLOSE_NORMAL,
};
