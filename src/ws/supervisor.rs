//! Connection supervisor
//!
//! Owns one logical stream connection: at most one live transport handle,
//! at most one pending reconnect timer, and a mounted flag that stops every
//! callback from touching state once the owner is gone.
//!
//! All transport callbacks, timer firings and handler mutations run under a
//! single mutex, so the frame handler has exactly one writer at a time.
//! Each connect attempt gets a new generation number; events carrying an
//! older generation are discarded.

use super::client::{stream_url, Connector};
use super::types::{ConnectionState, ConnectionStatus, ReconnectPolicy, TransportEvent};
use crate::error::FeedError;
use crate::telemetry::{increment, FeedCounter};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Consumes the text frames of a connection
pub trait FrameHandler: Send + 'static {
    fn on_frame(&mut self, text: &str);
}

/// Per-feed connection parameters
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Feed name used in logs and metric labels
    pub name: &'static str,
    /// Path appended to the page origin
    pub endpoint_path: String,
    /// Fixed delay before each reconnect attempt
    pub retry_delay: Duration,
    pub reconnect_policy: ReconnectPolicy,
}

struct PendingReconnect {
    id: u64,
    task: JoinHandle<()>,
}

struct Inner<H> {
    state: ConnectionState,
    generation: u64,
    live: Option<JoinHandle<()>>,
    reconnect: Option<PendingReconnect>,
    next_timer_id: u64,
    handler: H,
}

struct Shared<H> {
    config: SupervisorConfig,
    origin: String,
    connector: Arc<dyn Connector>,
    runtime: Option<Handle>,
    mounted: AtomicBool,
    inner: Mutex<Inner<H>>,
    status: watch::Sender<ConnectionStatus>,
}

/// Supervises one stream connection on behalf of a mounted owner
///
/// Dropping the supervisor unmounts it.
pub struct Supervisor<H: FrameHandler> {
    shared: Arc<Shared<H>>,
}

impl<H: FrameHandler> Supervisor<H> {
    /// Create an idle supervisor; nothing connects until [`Supervisor::connect`]
    ///
    /// Tasks are spawned on the tokio runtime current at construction.
    pub fn new(
        origin: impl Into<String>,
        config: SupervisorConfig,
        connector: Arc<dyn Connector>,
        handler: H,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());

        Self {
            shared: Arc::new(Shared {
                config,
                origin: origin.into(),
                connector,
                runtime: Handle::try_current().ok(),
                mounted: AtomicBool::new(true),
                inner: Mutex::new(Inner {
                    state: ConnectionState::Idle,
                    generation: 0,
                    live: None,
                    reconnect: None,
                    next_timer_id: 0,
                    handler,
                }),
                status,
            }),
        }
    }

    /// Open a transport unless one is already open or opening
    pub fn connect(&self) {
        let mut inner = self.shared.inner.lock();
        self.shared.connect_locked(&mut inner);
    }

    /// Cancel any pending reconnect and close the live handle
    ///
    /// The supervisor stays usable; a later `connect` starts over.
    pub fn disconnect(&self) {
        self.shared.disconnect();
    }

    /// Permanently stop the supervisor; safe to call repeatedly
    pub fn unmount(&self) {
        self.shared.unmount();
    }

    pub fn is_mounted(&self) -> bool {
        self.shared.mounted.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.inner.lock().state
    }

    pub fn status(&self) -> ConnectionStatus {
        self.shared.status.borrow().clone()
    }

    /// Receiver that observes every connectivity change
    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// True while a reconnect timer is armed
    pub fn reconnect_pending(&self) -> bool {
        self.shared.inner.lock().reconnect.is_some()
    }

    /// Run `f` against the frame handler, serialized with frame delivery
    pub fn with_handler<R>(&self, f: impl FnOnce(&mut H) -> R) -> R {
        f(&mut self.shared.inner.lock().handler)
    }
}

impl<H: FrameHandler> Drop for Supervisor<H> {
    fn drop(&mut self) {
        self.shared.unmount();
    }
}

impl<H: FrameHandler> Shared<H> {
    fn publish(&self, f: impl FnOnce(&mut ConnectionStatus)) {
        self.status.send_modify(f);
    }

    fn connect_locked(self: &Arc<Self>, inner: &mut Inner<H>) {
        let feed = self.config.name;

        if !self.mounted.load(Ordering::SeqCst) {
            return;
        }
        if matches!(
            inner.state,
            ConnectionState::Open | ConnectionState::Connecting
        ) {
            tracing::debug!(feed, state = ?inner.state, "Connect skipped, handle already live");
            return;
        }

        if let Some(pending) = inner.reconnect.take() {
            pending.task.abort();
        }

        inner.generation += 1;
        let generation = inner.generation;
        inner.state = ConnectionState::Connecting;
        self.publish(|status| status.state = ConnectionState::Connecting);
        increment(feed, FeedCounter::ConnectAttempts);

        let Some(runtime) = self.runtime.clone() else {
            tracing::error!(feed, "No async runtime, cannot open stream");
            self.fail_construction(inner, FeedError::NoRuntime);
            return;
        };

        let opened = stream_url(&self.origin, &self.config.endpoint_path).and_then(|url| {
            tracing::info!(feed, %url, generation, "Connecting to stream");
            self.connector.open(&url)
        });

        match opened {
            Ok(events) => {
                let shared = Arc::clone(self);
                inner.live = Some(runtime.spawn(shared.pump(generation, events)));
            }
            Err(e) => self.fail_construction(inner, e),
        }
    }

    /// Construction failures behave like a close: record, then retry
    fn fail_construction(self: &Arc<Self>, inner: &mut Inner<H>, error: FeedError) {
        tracing::warn!(feed = self.config.name, error = %error, "Failed to open stream");
        increment(self.config.name, FeedCounter::TransportErrors);

        inner.state = ConnectionState::Closed;
        let message = error.to_string();
        self.publish(|status| {
            status.state = ConnectionState::Closed;
            status.last_error = Some(message);
        });
        self.schedule_reconnect(inner);
    }

    async fn pump(self: Arc<Self>, generation: u64, mut events: mpsc::Receiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            if !self.handle_event(generation, event) {
                return;
            }
        }
        // transport went away without reporting a close
        self.handle_event(generation, TransportEvent::Closed { code: None });
    }

    /// Apply one transport callback; false once this handle is finished
    fn handle_event(self: &Arc<Self>, generation: u64, event: TransportEvent) -> bool {
        let feed = self.config.name;
        let mut inner = self.inner.lock();

        if !self.mounted.load(Ordering::SeqCst) || inner.generation != generation {
            return false;
        }

        match event {
            TransportEvent::Opened => {
                inner.state = ConnectionState::Open;
                tracing::info!(feed, generation, "Stream connected");
                self.publish(|status| {
                    status.state = ConnectionState::Open;
                    status.last_error = None;
                });
                true
            }
            TransportEvent::Message(text) => {
                increment(feed, FeedCounter::FramesReceived);
                inner.handler.on_frame(&text);
                true
            }
            TransportEvent::Error(message) => {
                tracing::warn!(feed, generation, error = %message, "Stream transport error");
                increment(feed, FeedCounter::TransportErrors);
                self.publish(|status| status.last_error = Some(message));
                true
            }
            TransportEvent::Closed { code } => {
                inner.state = ConnectionState::Closed;
                inner.live = None;
                self.publish(|status| status.state = ConnectionState::Closed);

                if self.config.reconnect_policy.should_retry(code) {
                    tracing::info!(feed, generation, ?code, "Stream closed");
                    self.schedule_reconnect(&mut inner);
                } else {
                    tracing::info!(feed, generation, ?code, "Stream closed cleanly, not reconnecting");
                }
                false
            }
        }
    }

    fn schedule_reconnect(self: &Arc<Self>, inner: &mut Inner<H>) {
        let feed = self.config.name;

        if !self.mounted.load(Ordering::SeqCst) {
            return;
        }
        if inner.reconnect.is_some() {
            tracing::debug!(feed, "Reconnect already pending");
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            return;
        };

        inner.next_timer_id += 1;
        let id = inner.next_timer_id;
        let delay = self.config.retry_delay;
        let shared = Arc::clone(self);

        tracing::warn!(feed, delay_ms = delay.as_millis() as u64, "Scheduling reconnect");
        increment(feed, FeedCounter::ReconnectsScheduled);

        let task = runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            shared.fire_reconnect(id);
        });
        inner.reconnect = Some(PendingReconnect { id, task });
    }

    fn fire_reconnect(self: &Arc<Self>, id: u64) {
        let mut inner = self.inner.lock();

        // a cancelled or superseded timer must not connect
        if inner.reconnect.as_ref().map(|pending| pending.id) != Some(id) {
            return;
        }
        inner.reconnect = None;
        if !self.mounted.load(Ordering::SeqCst) {
            return;
        }

        self.publish(|status| status.reconnects += 1);
        self.connect_locked(&mut inner);
    }

    fn disconnect(&self) {
        let mut inner = self.inner.lock();

        if let Some(pending) = inner.reconnect.take() {
            pending.task.abort();
        }
        if let Some(live) = inner.live.take() {
            live.abort();
        }
        inner.generation += 1;

        if inner.state != ConnectionState::Closed {
            tracing::info!(feed = self.config.name, "Stream disconnected");
        }
        inner.state = ConnectionState::Closed;
        self.publish(|status| status.state = ConnectionState::Closed);
    }

    fn unmount(&self) {
        // flip the guard before touching timers or handles
        if self.mounted.swap(false, Ordering::SeqCst) {
            tracing::debug!(feed = self.config.name, "Unmounting stream supervisor");
        }
        self.disconnect();
    }
}
