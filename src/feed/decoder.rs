//! Frame decoding
//!
//! Frames are JSON objects tagged by a `type` field. Each feed accepts one
//! tag; frames with any other tag are ignored, frames that fail to parse are
//! dropped. Neither outcome touches the connection.

use crate::error::FeedError;
use crate::telemetry::{increment, FeedCounter};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::marker::PhantomData;

/// Event type carried by a feed, identified by its `type` tag
pub trait FeedEvent: DeserializeOwned {
    const KIND: &'static str;
}

/// Outcome of decoding a well-formed frame
#[derive(Debug, Clone, PartialEq)]
pub enum Decoded<E> {
    /// Frame carried this feed's event
    Event(E),
    /// Frame is JSON but tagged for something else (or untagged)
    Ignored { kind: Option<String> },
}

/// Decode one text frame as `E`
pub fn decode_frame<E: FeedEvent>(text: &str) -> Result<Decoded<E>, FeedError> {
    let value: Value = serde_json::from_str(text)?;

    match value.get("type").and_then(Value::as_str) {
        Some(kind) if kind == E::KIND => Ok(Decoded::Event(serde_json::from_value(value)?)),
        kind => Ok(Decoded::Ignored {
            kind: kind.map(str::to_string),
        }),
    }
}

/// Per-feed decoder that logs and counts rejected frames
pub struct FrameDecoder<E> {
    feed: &'static str,
    _event: PhantomData<fn() -> E>,
}

impl<E: FeedEvent> FrameDecoder<E> {
    pub fn new(feed: &'static str) -> Self {
        Self {
            feed,
            _event: PhantomData,
        }
    }

    /// Decode a frame, returning `None` for anything that is not an `E`
    pub fn decode(&self, text: &str) -> Option<E> {
        match decode_frame::<E>(text) {
            Ok(Decoded::Event(event)) => Some(event),
            Ok(Decoded::Ignored { kind }) => {
                tracing::trace!(feed = self.feed, ?kind, "Ignoring foreign frame");
                increment(self.feed, FeedCounter::FramesIgnored);
                None
            }
            Err(e) => {
                tracing::debug!(feed = self.feed, error = %e, "Dropping malformed frame");
                increment(self.feed, FeedCounter::FramesDropped);
                None
            }
        }
    }
}
