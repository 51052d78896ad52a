//! Integration tests for the price feed

use crate::settle;
use livefeed::config::PriceFeedConfig;
use livefeed::feed::{PriceFeed, PriceSource};
use livefeed::ws::{ConnectionState, LoopbackConnector};
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;

const RETRY: Duration = Duration::from_millis(3000);

fn price_frame(symbol: &str, price: u64, second: u32) -> String {
    format!(
        r#"{{"type":"price","symbol":"{symbol}","price":{price},"source":"coinbase","timestamp":"2024-01-01T00:00:{second:02}Z"}}"#
    )
}

fn feed() -> (PriceFeed, Arc<LoopbackConnector>) {
    let connector = LoopbackConnector::new();
    let feed = PriceFeed::with_connector(
        "https://dash.example.com",
        &PriceFeedConfig::default(),
        connector.clone(),
    );
    (feed, connector)
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_connects_to_price_endpoint() {
    let (feed, connector) = feed();

    assert_eq!(connector.urls(), vec!["wss://dash.example.com/ws/prices"]);
    assert!(!feed.is_connected());

    connector.latest().unwrap().open();
    settle().await;
    assert!(feed.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_two_ticks_give_delta_with_lowercase_lookup() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(price_frame("BTC", 50000, 0));
    peer.text(price_frame("BTC", 50500, 1));
    settle().await;

    let entry = feed.price("btc").unwrap();
    assert_eq!(entry.price, dec!(50500));
    assert_eq!(entry.previous_price, Some(dec!(50000)));
    assert_eq!(entry.source, PriceSource::Coinbase);
}

#[tokio::test(start_paused = true)]
async fn test_unrelated_frames_do_not_disturb_feed() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text("not json");
    peer.text(r#"{"type":"heartbeat"}"#);
    peer.text(price_frame("ETH", 3000, 0));
    settle().await;

    assert!(feed.is_connected());
    assert_eq!(feed.snapshot().len(), 1);
    assert_eq!(feed.price("ETH").unwrap().price, dec!(3000));
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_survives_reconnect() {
    let (feed, connector) = feed();
    let first = connector.latest().unwrap();
    first.open();
    first.text(price_frame("BTC", 50000, 0));
    first.close(Some(1006));
    settle().await;

    assert_eq!(feed.status().state, ConnectionState::Closed);
    assert_eq!(feed.price("BTC").unwrap().price, dec!(50000));

    tokio::time::sleep(RETRY).await;
    settle().await;
    assert_eq!(connector.open_count(), 2);

    let second = connector.latest().unwrap();
    second.open();
    second.text(price_frame("BTC", 51000, 5));
    settle().await;

    let entry = feed.price("BTC").unwrap();
    assert!(feed.is_connected());
    assert_eq!(entry.price, dec!(51000));
    assert_eq!(entry.previous_price, Some(dec!(50000)));
    assert_eq!(feed.status().reconnects, 1);
}

#[tokio::test(start_paused = true)]
async fn test_price_feed_retries_even_clean_close() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.close(Some(1000));
    settle().await;

    tokio::time::sleep(RETRY).await;
    settle().await;

    assert_eq!(connector.open_count(), 2);
    assert_eq!(feed.status().state, ConnectionState::Connecting);
}

#[tokio::test(start_paused = true)]
async fn test_repeated_connect_keeps_one_handle() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    settle().await;

    feed.connect();
    feed.connect();
    peer.text(price_frame("BTC", 1, 0));
    peer.text(price_frame("BTC", 2, 1));
    settle().await;

    assert_eq!(connector.open_count(), 1);
    assert_eq!(connector.live_count(), 1);
    let entry = feed.price("BTC").unwrap();
    assert_eq!(entry.price, dec!(2));
    assert_eq!(entry.previous_price, Some(dec!(1)));
}

#[tokio::test(start_paused = true)]
async fn test_updates_notify_subscribers() {
    let (feed, connector) = feed();
    let mut updates = feed.updates();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(price_frame("SPY", 470, 0));

    tokio::time::timeout(Duration::from_millis(100), updates.changed())
        .await
        .expect("no update")
        .unwrap();
    assert!(updates.borrow().get("spy").is_some());
}

#[tokio::test(start_paused = true)]
async fn test_drop_stops_everything() {
    let (feed, connector) = feed();
    let updates = feed.updates();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(price_frame("BTC", 50000, 0));
    settle().await;

    drop(feed);
    settle().await;

    assert!(peer.is_released());
    assert!(!peer.text(price_frame("BTC", 1, 1)));
    assert_eq!(updates.borrow().get("BTC").unwrap().price, dec!(50000));

    tokio::time::sleep(RETRY * 2).await;
    assert_eq!(connector.open_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_then_connect() {
    let (feed, connector) = feed();
    connector.latest().unwrap().open();
    settle().await;

    feed.disconnect();
    settle().await;
    assert!(!feed.is_connected());
    assert!(connector.peer(0).unwrap().is_released());

    tokio::time::sleep(RETRY * 2).await;
    assert_eq!(connector.open_count(), 1);

    feed.connect();
    connector.latest().unwrap().open();
    settle().await;
    assert!(feed.is_connected());
    assert_eq!(connector.open_count(), 2);
}
