//! livefeed: realtime stream client for the trading dashboard
//!
//! This library provides:
//! - A connection supervisor with fixed-delay reconnection and safe teardown
//! - A live price feed folded into a symbol → price book
//! - A bot notification feed with per-symbol dedup of `looking` events
//! - WebSocket and in-process transports
//! - Configuration, logging and metrics

pub mod cli;
pub mod config;
pub mod error;
pub mod feed;
pub mod telemetry;
pub mod ws;

pub use error::FeedError;
