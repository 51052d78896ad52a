//! Bot notification feed

use super::decoder::FrameDecoder;
use super::dedup::{DedupConfig, DedupWindow};
use super::types::BotEvent;
use crate::config::NotificationFeedConfig;
use crate::ws::{
    ConnectionStatus, Connector, FrameHandler, ReconnectPolicy, Supervisor, SupervisorConfig,
    WsConfig, WsConnector,
};
use crate::telemetry::{increment, FeedCounter};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::Instant;
use uuid::Uuid;

/// Feed name used in logs and metrics
pub const NOTIFICATION_FEED: &str = "notifications";

/// An accepted bot event with its locally assigned id
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub id: Uuid,
    #[serde(flatten)]
    pub event: BotEvent,
}

/// Newest-first bounded list of notifications
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationLog {
    entries: VecDeque<Notification>,
    max_len: usize,
}

impl NotificationLog {
    pub fn new(max_len: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_len),
            max_len,
        }
    }

    /// Prepend an event, dropping the oldest beyond `max_len`
    pub fn push(&mut self, event: BotEvent) -> Uuid {
        let id = Uuid::new_v4();
        self.entries.push_front(Notification { id, event });
        self.entries.truncate(self.max_len);
        id
    }

    /// Remove one entry; false if it was not present
    pub fn dismiss(&mut self, id: Uuid) -> bool {
        match self.entries.iter().position(|n| n.id == id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<Notification> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }
}

/// Decodes bot events, filters repeats, and folds them into the log
pub struct NotificationProjector {
    decoder: FrameDecoder<BotEvent>,
    dedup: DedupWindow,
    log: watch::Sender<NotificationLog>,
}

impl NotificationProjector {
    pub fn new(dedup: DedupWindow, log: watch::Sender<NotificationLog>) -> Self {
        Self {
            decoder: FrameDecoder::new(NOTIFICATION_FEED),
            dedup,
            log,
        }
    }

    /// Handle a frame that arrived at `now`
    pub fn ingest_at(&mut self, text: &str, now: Instant) -> Option<Uuid> {
        let event = self.decoder.decode(text)?;

        if !self.dedup.admit(&event, now) {
            tracing::debug!(symbol = %event.symbol, "Suppressing repeated looking event");
            increment(NOTIFICATION_FEED, FeedCounter::EventsSuppressed);
            return None;
        }

        tracing::debug!(event_type = %event.event_type, symbol = %event.symbol, "Bot event");
        let mut id = None;
        self.log.send_modify(|log| id = Some(log.push(event)));
        id
    }

    pub fn dismiss(&mut self, id: Uuid) -> bool {
        self.log.send_if_modified(|log| log.dismiss(id))
    }

    pub fn clear(&mut self) {
        self.log.send_if_modified(|log| {
            let changed = !log.is_empty();
            log.clear();
            changed
        });
    }

    pub fn dedup(&self) -> &DedupWindow {
        &self.dedup
    }
}

impl FrameHandler for NotificationProjector {
    fn on_frame(&mut self, text: &str) {
        self.ingest_at(text, Instant::now());
    }
}

/// Consumer handle for the bot notification feed
///
/// Connects on creation. A close with Normal or Going Away is treated as an
/// intentional shutdown and not retried; every other close is retried after
/// a fixed delay. Dropping the handle tears the connection down.
pub struct NotificationFeed {
    supervisor: Supervisor<NotificationProjector>,
    log: watch::Receiver<NotificationLog>,
}

impl NotificationFeed {
    /// Subscribe over a real WebSocket
    pub fn subscribe(
        origin: impl Into<String>,
        config: &NotificationFeedConfig,
        ws: WsConfig,
    ) -> Self {
        Self::with_connector(origin, config, Arc::new(WsConnector::new(ws)))
    }

    /// Subscribe through any connector
    pub fn with_connector(
        origin: impl Into<String>,
        config: &NotificationFeedConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (tx, log) = watch::channel(NotificationLog::new(config.max_notifications));
        let dedup = DedupWindow::new(DedupConfig {
            window: config.dedup_window(),
            sweep_threshold: config.dedup_sweep_threshold,
            capacity: config.dedup_capacity,
        });
        let supervisor = Supervisor::new(
            origin,
            SupervisorConfig {
                name: NOTIFICATION_FEED,
                endpoint_path: config.endpoint_path.clone(),
                retry_delay: config.retry_delay(),
                reconnect_policy: ReconnectPolicy::UnlessCleanClose,
            },
            connector,
            NotificationProjector::new(dedup, tx),
        );

        tracing::info!(endpoint = %config.endpoint_path, "Subscribing to notification feed");
        supervisor.connect();

        Self { supervisor, log }
    }

    /// Current notifications, newest first
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().to_vec()
    }

    /// Receiver notified on every log change
    pub fn updates(&self) -> watch::Receiver<NotificationLog> {
        self.log.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.status().is_connected()
    }

    /// Last connection error, or an empty string
    pub fn last_error(&self) -> String {
        self.supervisor.status().last_error.unwrap_or_default()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.supervisor.status()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.supervisor.watch_status()
    }

    pub fn connect(&self) {
        self.supervisor.connect();
    }

    pub fn disconnect(&self) {
        self.supervisor.disconnect();
    }

    /// Empty the log; the dedup window is left as is
    pub fn clear_all(&self) {
        self.supervisor.with_handler(|projector| projector.clear());
    }

    /// Remove one notification by id
    pub fn dismiss(&self, id: Uuid) -> bool {
        self.supervisor.with_handler(|projector| projector.dismiss(id))
    }

    /// Symbols currently held in the dedup window
    pub fn tracked_symbols(&self) -> usize {
        self.supervisor.with_handler(|projector| projector.dedup().len())
    }
}
