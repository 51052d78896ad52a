//! Realtime feeds
//!
//! Two instantiations of one pipeline on top of the connection supervisor:
//! - prices: decode → fold into a symbol → price book
//! - notifications: decode → dedup `looking` events → prepend to a bounded log

mod decoder;
mod dedup;
mod notification;
mod price;
mod types;

pub use decoder::{decode_frame, Decoded, FeedEvent, FrameDecoder};
pub use dedup::{DedupConfig, DedupWindow};
pub use notification::{
    Notification, NotificationFeed, NotificationLog, NotificationProjector, NOTIFICATION_FEED,
};
pub use price::{PriceBook, PriceEntry, PriceFeed, PriceProjector, PRICE_FEED};
pub use types::{BotEvent, BotEventType, PriceSource, PriceTick};
