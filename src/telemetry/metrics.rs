//! Prometheus metrics

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::{Ipv4Addr, SocketAddr};

/// Counters kept per feed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedCounter {
    /// Text frames delivered by the transport
    FramesReceived,
    /// Frames that failed to decode
    FramesDropped,
    /// Well-formed frames for another feed
    FramesIgnored,
    /// Events removed by the dedup window
    EventsSuppressed,
    /// Transport construction attempts
    ConnectAttempts,
    /// Reconnect timers armed
    ReconnectsScheduled,
    /// Transport errors and construction failures
    TransportErrors,
}

impl FeedCounter {
    pub fn metric_name(self) -> &'static str {
        match self {
            FeedCounter::FramesReceived => "livefeed_frames_received_total",
            FeedCounter::FramesDropped => "livefeed_frames_dropped_total",
            FeedCounter::FramesIgnored => "livefeed_frames_ignored_total",
            FeedCounter::EventsSuppressed => "livefeed_events_suppressed_total",
            FeedCounter::ConnectAttempts => "livefeed_connect_attempts_total",
            FeedCounter::ReconnectsScheduled => "livefeed_reconnects_scheduled_total",
            FeedCounter::TransportErrors => "livefeed_transport_errors_total",
        }
    }
}

/// Bump a feed counter by one
pub fn increment(feed: &'static str, counter: FeedCounter) {
    ::metrics::counter!(counter.metric_name(), "feed" => feed).increment(1);
}

/// Serve metrics over HTTP on `port`
pub fn init_metrics(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, port));
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| anyhow::anyhow!("Failed to start metrics exporter: {}", e))?;

    tracing::info!(%addr, "Prometheus exporter listening");
    Ok(())
}
