//! Feed event types

use super::decoder::FeedEvent;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Upstream provider a price came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceSource {
    Coinbase,
    Yahoo,
}

/// A single price tick pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceTick {
    /// Symbol as sent by the server (e.g., "BTC", "tsla")
    pub symbol: String,
    pub price: Decimal,
    pub source: PriceSource,
    /// Server timestamp of the quote
    pub timestamp: DateTime<Utc>,
}

impl FeedEvent for PriceTick {
    const KIND: &'static str = "price";
}

/// What the trading bot is reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BotEventType {
    /// Bot is evaluating a symbol; emitted once per scan cycle
    Looking,
    Entry,
    Exit,
    Skip,
    Error,
    Connected,
}

impl BotEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            BotEventType::Looking => "looking",
            BotEventType::Entry => "entry",
            BotEventType::Exit => "exit",
            BotEventType::Skip => "skip",
            BotEventType::Error => "error",
            BotEventType::Connected => "connected",
        }
    }
}

impl fmt::Display for BotEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bot/automation notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BotEvent {
    pub event_type: BotEventType,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strike: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub portfolio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<Decimal>,
    pub timestamp: DateTime<Utc>,
}

impl FeedEvent for BotEvent {
    const KIND: &'static str = "bot_event";
}
