//! In-process connector
//!
//! Every `open` call records the requested URL and hands the supervisor a
//! channel whose sending half is kept as a [`LoopbackPeer`]. Whoever holds
//! the peer plays the server: open, push frames, raise errors, close. Used
//! by the test suites and for replaying captured frames.
//!
//! Peers the supervisor has released are pruned on the next `open`, and only
//! the most recent URLs are remembered, so long replays with many reconnects
//! stay bounded.

use super::client::Connector;
use super::types::TransportEvent;
use crate::error::FeedError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

const PEER_CAPACITY: usize = 256;
const URL_HISTORY: usize = 64;

#[derive(Default)]
struct LoopbackState {
    peers: Vec<LoopbackPeer>,
    urls: VecDeque<String>,
    opens: usize,
    failures: VecDeque<String>,
}

/// Connector whose connections are driven by the caller
#[derive(Default)]
pub struct LoopbackConnector {
    state: Mutex<LoopbackState>,
}

impl LoopbackConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make the next `open` fail synchronously with `reason`
    pub fn fail_next(&self, reason: impl Into<String>) {
        self.state.lock().failures.push_back(reason.into());
    }

    /// Number of `open` calls, failed ones included
    pub fn open_count(&self) -> usize {
        self.state.lock().opens
    }

    /// Most recent requested URLs, oldest first
    pub fn urls(&self) -> Vec<String> {
        self.state.lock().urls.iter().cloned().collect()
    }

    /// Server side of the most recent successful `open`
    pub fn latest(&self) -> Option<LoopbackPeer> {
        self.state.lock().peers.last().cloned()
    }

    /// Server side of the `index`-th retained connection, oldest first
    pub fn peer(&self, index: usize) -> Option<LoopbackPeer> {
        self.state.lock().peers.get(index).cloned()
    }

    /// Handles whose supervisor side is still attached
    pub fn live_count(&self) -> usize {
        self.state
            .lock()
            .peers
            .iter()
            .filter(|peer| !peer.is_released())
            .count()
    }
}

impl Connector for LoopbackConnector {
    fn open(&self, url: &str) -> Result<mpsc::Receiver<TransportEvent>, FeedError> {
        let mut state = self.state.lock();
        state.opens += 1;
        if state.urls.len() == URL_HISTORY {
            state.urls.pop_front();
        }
        state.urls.push_back(url.to_string());

        if let Some(reason) = state.failures.pop_front() {
            return Err(FeedError::Connection(reason));
        }

        state.peers.retain(|peer| !peer.is_released());
        let (tx, rx) = mpsc::channel(PEER_CAPACITY);
        state.peers.push(LoopbackPeer { tx });
        Ok(rx)
    }
}

/// Server side of one loopback connection
#[derive(Clone)]
pub struct LoopbackPeer {
    tx: mpsc::Sender<TransportEvent>,
}

impl LoopbackPeer {
    /// Deliver an event; false once the supervisor has let go of the handle
    pub fn send(&self, event: TransportEvent) -> bool {
        self.tx.try_send(event).is_ok()
    }

    pub fn open(&self) -> bool {
        self.send(TransportEvent::Opened)
    }

    pub fn text(&self, frame: impl Into<String>) -> bool {
        self.send(TransportEvent::Message(frame.into()))
    }

    pub fn error(&self, message: impl Into<String>) -> bool {
        self.send(TransportEvent::Error(message.into()))
    }

    pub fn close(&self, code: Option<u16>) -> bool {
        self.send(TransportEvent::Closed { code })
    }

    /// True once the supervisor dropped its receiver
    pub fn is_released(&self) -> bool {
        self.tx.is_closed()
    }
}
