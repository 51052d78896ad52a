//! Live price feed

use super::decoder::FrameDecoder;
use super::types::{PriceSource, PriceTick};
use crate::config::PriceFeedConfig;
use crate::ws::{
    ConnectionStatus, Connector, FrameHandler, ReconnectPolicy, Supervisor, SupervisorConfig,
    WsConfig, WsConnector,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;

/// Feed name used in logs and metrics
pub const PRICE_FEED: &str = "prices";

/// Latest known price for one symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceEntry {
    pub price: Decimal,
    pub source: PriceSource,
    pub timestamp: DateTime<Utc>,
    /// Price before the latest update; absent after the first tick
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_price: Option<Decimal>,
}

impl PriceEntry {
    /// Move since the previous tick
    pub fn change(&self) -> Option<Decimal> {
        self.previous_price.map(|previous| self.price - previous)
    }
}

/// Symbol → latest price, keyed by upper-cased symbol
///
/// Never cleared on reconnect: stale prices stay visible with their last
/// timestamp until fresher ticks arrive.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct PriceBook {
    entries: HashMap<String, PriceEntry>,
}

impl PriceBook {
    /// Fold a tick into the book
    pub fn apply(&mut self, tick: PriceTick) {
        let key = tick.symbol.to_ascii_uppercase();
        let previous_price = self.entries.get(&key).map(|entry| entry.price);

        self.entries.insert(
            key,
            PriceEntry {
                price: tick.price,
                source: tick.source,
                timestamp: tick.timestamp,
                previous_price,
            },
        );
    }

    /// Case-insensitive lookup
    pub fn get(&self, symbol: &str) -> Option<&PriceEntry> {
        self.entries.get(&symbol.to_ascii_uppercase())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriceEntry)> {
        self.entries.iter().map(|(symbol, entry)| (symbol.as_str(), entry))
    }
}

/// Decodes price frames and folds them into the published book
pub struct PriceProjector {
    decoder: FrameDecoder<PriceTick>,
    book: watch::Sender<PriceBook>,
}

impl PriceProjector {
    pub fn new(book: watch::Sender<PriceBook>) -> Self {
        Self {
            decoder: FrameDecoder::new(PRICE_FEED),
            book,
        }
    }
}

impl FrameHandler for PriceProjector {
    fn on_frame(&mut self, text: &str) {
        if let Some(tick) = self.decoder.decode(text) {
            tracing::trace!(symbol = %tick.symbol, price = %tick.price, "Price tick");
            self.book.send_modify(|book| book.apply(tick));
        }
    }
}

/// Consumer handle for the price feed
///
/// Connects on creation and retries every close after a fixed delay.
/// Dropping the handle tears the connection down.
pub struct PriceFeed {
    supervisor: Supervisor<PriceProjector>,
    book: watch::Receiver<PriceBook>,
}

impl PriceFeed {
    /// Subscribe over a real WebSocket
    pub fn subscribe(origin: impl Into<String>, config: &PriceFeedConfig, ws: WsConfig) -> Self {
        Self::with_connector(origin, config, Arc::new(WsConnector::new(ws)))
    }

    /// Subscribe through any connector
    pub fn with_connector(
        origin: impl Into<String>,
        config: &PriceFeedConfig,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (tx, book) = watch::channel(PriceBook::default());
        let supervisor = Supervisor::new(
            origin,
            SupervisorConfig {
                name: PRICE_FEED,
                endpoint_path: config.endpoint_path.clone(),
                retry_delay: config.retry_delay(),
                reconnect_policy: ReconnectPolicy::Always,
            },
            connector,
            PriceProjector::new(tx),
        );

        tracing::info!(endpoint = %config.endpoint_path, "Subscribing to price feed");
        supervisor.connect();

        Self { supervisor, book }
    }

    /// Copy of the current book
    pub fn snapshot(&self) -> PriceBook {
        self.book.borrow().clone()
    }

    /// Latest price for `symbol`, any case
    pub fn price(&self, symbol: &str) -> Option<PriceEntry> {
        self.book.borrow().get(symbol).cloned()
    }

    /// Receiver notified on every book change
    pub fn updates(&self) -> watch::Receiver<PriceBook> {
        self.book.clone()
    }

    pub fn is_connected(&self) -> bool {
        self.supervisor.status().is_connected()
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
}
