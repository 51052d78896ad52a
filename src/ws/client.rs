//! WebSocket transport: origin-derived URLs and the tungstenite connector

use super::types::{TransportEvent, WsConfig};
use crate::error::FeedError;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::Request;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::{connect_async, tungstenite::Message};

/// Opens transport handles for a supervisor
///
/// `open` is synchronous: it either fails outright (bad URL, no runtime) or
/// hands back the receiving end of a live connection whose events arrive in
/// delivery order. Dropping the receiver must close the connection.
pub trait Connector: Send + Sync + 'static {
    fn open(&self, url: &str) -> Result<mpsc::Receiver<TransportEvent>, FeedError>;
}

/// Build the stream URL for `endpoint_path` on the page `origin`
///
/// `https` origins map to `wss`, `http` to `ws`. Any path already on the
/// origin is discarded.
pub fn stream_url(origin: &str, endpoint_path: &str) -> Result<String, FeedError> {
    let invalid = || FeedError::InvalidOrigin(origin.to_string());

    let (scheme, rest) = origin.trim().split_once("://").ok_or_else(invalid)?;
    let ws_scheme = match scheme.to_ascii_lowercase().as_str() {
        "https" | "wss" => "wss",
        "http" | "ws" => "ws",
        _ => return Err(invalid()),
    };

    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    if host.is_empty() {
        return Err(invalid());
    }

    let path = endpoint_path.trim();
    if path.starts_with('/') {
        Ok(format!("{ws_scheme}://{host}{path}"))
    } else {
        Ok(format!("{ws_scheme}://{host}/{path}"))
    }
}

/// Connector backed by `tokio-tungstenite`
///
/// Each handle is a spawned task that owns the socket, answers pings, sends
/// its own keepalive pings, and closes with a Normal close frame once the
/// supervisor drops the receiver.
pub struct WsConnector {
    config: WsConfig,
}

impl WsConnector {
    pub fn new(config: WsConfig) -> Self {
        Self { config }
    }
}

impl Default for WsConnector {
    fn default() -> Self {
        Self::new(WsConfig::default())
    }
}

impl Connector for WsConnector {
    fn open(&self, url: &str) -> Result<mpsc::Receiver<TransportEvent>, FeedError> {
        let request = url
            .into_client_request()
            .map_err(|e| FeedError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            })?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| FeedError::NoRuntime)?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let config = self.config.clone();

        runtime.spawn(async move {
            if let Err(e) = run_transport(request, &tx, &config).await {
                tracing::debug!(error = %e, "WebSocket transport ended with error");
                let _ = tx.send(TransportEvent::Error(e.to_string())).await;
                let _ = tx.send(TransportEvent::Closed { code: None }).await;
            }
        });

        Ok(rx)
    }
}

/// Connect and stream frames into `tx` until either side closes
async fn run_transport(
    request: Request,
    tx: &mpsc::Sender<TransportEvent>,
    config: &WsConfig,
) -> Result<(), FeedError> {
    tracing::debug!(uri = %request.uri(), "Opening WebSocket");

    let (ws_stream, _response) = connect_async(request).await?;
    let (mut write, mut read) = ws_stream.split();

    if tx.send(TransportEvent::Opened).await.is_err() {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(config.ping_interval);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    // first tick completes immediately
    ping_interval.tick().await;

    let mut pong_deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        if tx.send(TransportEvent::Message(text)).await.is_err() {
                            let _ = write.send(normal_close()).await;
                            return Ok(());
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Pong(_))) => {
                        pong_deadline = None;
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| u16::from(f.code));
                        tracing::debug!(?code, "Received close frame");
                        let _ = tx.send(TransportEvent::Closed { code }).await;
                        return Ok(());
                    }
                    Some(Ok(_)) => {
                        // binary and raw frames are not part of the protocol
                    }
                    Some(Err(e)) => return Err(e.into()),
                    None => return Err(FeedError::StreamEnded),
                }
            }

            _ = tx.closed() => {
                tracing::debug!("Supervisor released transport, closing");
                let _ = write.send(normal_close()).await;
                return Ok(());
            }

            _ = async {
                match pong_deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            } => {
                return Err(FeedError::PongTimeout);
            }

            _ = ping_interval.tick() => {
                write.send(Message::Ping(Vec::new())).await?;
                if pong_deadline.is_none() {
                    pong_deadline = Some(Instant::now() + config.pong_timeout);
                }
            }
        }
    }
}

fn normal_close() -> Message {
    Message::Close(Some(CloseFrame {
        code: CloseCode::Normal,
        reason: "client disconnect".into(),
    }))
}
