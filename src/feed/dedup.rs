//! Per-symbol suppression of repeated `looking` events
//!
//! The server emits a `looking` event for every symbol on every scan cycle.
//! Only the first one per symbol inside the window is kept; every other event
//! type passes through untouched. The window is measured on the monotonic
//! clock, so wall-clock steps never stretch or shrink it.

use super::types::{BotEvent, BotEventType};
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Dedup window parameters
#[derive(Debug, Clone)]
pub struct DedupConfig {
    /// Span in which a repeat `looking` event for a symbol is dropped
    pub window: Duration,
    /// Tracked symbols above which expired entries are swept
    pub sweep_threshold: usize,
    /// Hard ceiling on tracked symbols
    pub capacity: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(5 * 60),
            sweep_threshold: 50,
            capacity: 1024,
        }
    }
}

/// Last accepted `looking` time per symbol
#[derive(Debug, Clone)]
pub struct DedupWindow {
    config: DedupConfig,
    last_accepted: HashMap<String, Instant>,
}

impl DedupWindow {
    pub fn new(mut config: DedupConfig) -> Self {
        config.capacity = config.capacity.max(1);
        Self {
            config,
            last_accepted: HashMap::new(),
        }
    }

    /// Decide whether `event`, arriving at `now`, should be kept
    pub fn admit(&mut self, event: &BotEvent, now: Instant) -> bool {
        if event.event_type != BotEventType::Looking {
            return true;
        }

        let last = self.last_accepted.get(&event.symbol).copied();
        match last {
            Some(last) if now.saturating_duration_since(last) < self.config.window => {
                return false;
            }
            Some(_) => {}
            None => self.make_room(now),
        }

        self.last_accepted.insert(event.symbol.clone(), now);

        if self.last_accepted.len() > self.config.sweep_threshold {
            self.sweep(now);
        }
        true
    }

    /// Time the last `looking` event for `symbol` was accepted
    pub fn last_accepted(&self, symbol: &str) -> Option<Instant> {
        self.last_accepted.get(symbol).copied()
    }

    pub fn len(&self) -> usize {
        self.last_accepted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_accepted.is_empty()
    }

    /// Drop entries that can no longer suppress anything
    fn sweep(&mut self, now: Instant) {
        let window = self.config.window;
        self.last_accepted
            .retain(|_, at| now.saturating_duration_since(*at) < window);
    }

    fn make_room(&mut self, now: Instant) {
        if self.last_accepted.len() < self.config.capacity {
            return;
        }
        self.sweep(now);

        while self.last_accepted.len() >= self.config.capacity {
            let oldest = self
                .last_accepted
                .iter()
                .min_by_key(|(_, at)| **at)
                .map(|(symbol, _)| symbol.clone());
            match oldest {
                Some(symbol) => {
                    tracing::debug!(%symbol, "Dedup window full, evicting oldest symbol");
                    self.last_accepted.remove(&symbol);
                }
                None => break,
            }
        }
    }
}

impl Default for DedupWindow {
    fn default() -> Self {
        Self::new(DedupConfig::default())
    }
}
