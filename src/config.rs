//! Configuration types for livefeed

use crate::telemetry::LogFormat;
use crate::ws::WsConfig;
use anyhow::Context;
use serde::Deserialize;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Page origin the stream endpoints are resolved against
    #[serde(default = "default_origin")]
    pub origin: String,
    #[serde(default)]
    pub price: PriceFeedConfig,
    #[serde(default)]
    pub notifications: NotificationFeedConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

fn default_origin() -> String {
    "http://localhost:8080".to_string()
}

/// Price feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct PriceFeedConfig {
    #[serde(default = "default_price_path")]
    pub endpoint_path: String,

    /// Fixed reconnect delay (milliseconds)
    #[serde(default = "default_price_retry_ms")]
    pub retry_delay_ms: u64,
}

fn default_price_path() -> String {
    "/ws/prices".to_string()
}
fn default_price_retry_ms() -> u64 {
    3000
}

impl Default for PriceFeedConfig {
    fn default() -> Self {
        Self {
            endpoint_path: default_price_path(),
            retry_delay_ms: default_price_retry_ms(),
        }
    }
}

impl PriceFeedConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

/// Bot notification feed configuration
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationFeedConfig {
    #[serde(default = "default_notification_path")]
    pub endpoint_path: String,

    /// Fixed reconnect delay (milliseconds)
    #[serde(default = "default_notification_retry_ms")]
    pub retry_delay_ms: u64,

    /// Maximum entries kept in the notification log
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,

    /// Window in which repeated `looking` events for a symbol are dropped
    #[serde(default = "default_dedup_window_secs")]
    pub dedup_window_secs: u64,

    /// Tracked symbols before expired entries are swept
    #[serde(default = "default_dedup_sweep_threshold")]
    pub dedup_sweep_threshold: usize,

    /// Hard ceiling on tracked symbols
    #[serde(default = "default_dedup_capacity")]
    pub dedup_capacity: usize,
}

fn default_notification_path() -> String {
    "/ws/bot-events".to_string()
}
fn default_notification_retry_ms() -> u64 {
    5000
}
fn default_max_notifications() -> usize {
    10
}
fn default_dedup_window_secs() -> u64 {
    300 // 5 minutes
}
fn default_dedup_sweep_threshold() -> usize {
    50
}
fn default_dedup_capacity() -> usize {
    1024
}

impl Default for NotificationFeedConfig {
    fn default() -> Self {
        Self {
            endpoint_path: default_notification_path(),
            retry_delay_ms: default_notification_retry_ms(),
            max_notifications: default_max_notifications(),
            dedup_window_secs: default_dedup_window_secs(),
            dedup_sweep_threshold: default_dedup_sweep_threshold(),
            dedup_capacity: default_dedup_capacity(),
        }
    }
}

impl NotificationFeedConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// Dedup window; any configured value is representable
    pub fn dedup_window(&self) -> Duration {
        Duration::from_secs(self.dedup_window_secs)
    }
}

/// WebSocket transport configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    #[serde(default = "default_pong_timeout_secs")]
    pub pong_timeout_secs: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_ping_interval_secs() -> u64 {
    30
}
fn default_pong_timeout_secs() -> u64 {
    10
}
fn default_channel_capacity() -> usize {
    1024
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            ping_interval_secs: default_ping_interval_secs(),
            pong_timeout_secs: default_pong_timeout_secs(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

impl TransportConfig {
    pub fn ws_config(&self) -> WsConfig {
        WsConfig::default()
            .ping_interval(Duration::from_secs(self.ping_interval_secs.max(1)))
            .pong_timeout(Duration::from_secs(self.pong_timeout_secs.max(1)))
            .channel_capacity(self.channel_capacity)
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub log_format: LogFormat,
    /// Prometheus exporter port; no exporter when unset
    pub metrics_port: Option<u16>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            metrics_port: None,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}
