//! Integration tests for the bot notification feed

use crate::settle;
use livefeed::config::NotificationFeedConfig;
use livefeed::feed::{BotEventType, NotificationFeed};
use livefeed::ws::{ConnectionState, LoopbackConnector};
use std::sync::Arc;
use std::time::Duration;

const RETRY: Duration = Duration::from_millis(5000);

fn bot_frame(event_type: &str, symbol: &str) -> String {
    format!(
        r#"{{"type":"bot_event","eventType":"{event_type}","symbol":"{symbol}","timestamp":"2024-01-01T12:00:00Z"}}"#
    )
}

fn feed_with(config: NotificationFeedConfig) -> (NotificationFeed, Arc<LoopbackConnector>) {
    let connector = LoopbackConnector::new();
    let feed = NotificationFeed::with_connector("http://localhost:8080", &config, connector.clone());
    (feed, connector)
}

fn feed() -> (NotificationFeed, Arc<LoopbackConnector>) {
    feed_with(NotificationFeedConfig::default())
}

#[tokio::test(start_paused = true)]
async fn test_subscribe_connects_to_event_endpoint() {
    let (feed, connector) = feed();
    assert_eq!(connector.urls(), vec!["ws://localhost:8080/ws/bot-events"]);
    assert_eq!(feed.last_error(), "");

    connector.latest().unwrap().open();
    settle().await;
    assert!(feed.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_looking_collapses() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("looking", "TSLA"));
    peer.text(bot_frame("looking", "TSLA"));
    peer.text(bot_frame("looking", "AAPL"));
    settle().await;

    let symbols: Vec<_> = feed
        .notifications()
        .into_iter()
        .map(|n| n.event.symbol)
        .collect();
    assert_eq!(symbols, vec!["AAPL", "TSLA"]);
    assert_eq!(feed.tracked_symbols(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_looking_suppression_follows_elapsed_time() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;
    assert_eq!(feed.notifications().len(), 1);

    tokio::time::sleep(Duration::from_secs(6 * 60)).await;
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;
    assert_eq!(feed.notifications().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_largest_configured_window_subscribes() {
    let (feed, connector) = feed_with(NotificationFeedConfig {
        dedup_window_secs: i64::MAX as u64,
        ..Default::default()
    });
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    tokio::time::sleep(Duration::from_secs(24 * 60 * 60)).await;
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    assert!(feed.is_connected());
    assert_eq!(feed.notifications().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_zero_window_disables_suppression() {
    let (feed, connector) = feed_with(NotificationFeedConfig {
        dedup_window_secs: 0,
        ..Default::default()
    });
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("looking", "TSLA"));
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    assert_eq!(feed.notifications().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_trade_events_always_logged() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    for kind in ["entry", "entry", "exit", "exit", "skip", "error", "connected"] {
        peer.text(bot_frame(kind, "TSLA"));
    }
    settle().await;

    let log = feed.notifications();
    assert_eq!(log.len(), 7);
    assert_eq!(log[0].event.event_type, BotEventType::Connected);
    assert_eq!(log[6].event.event_type, BotEventType::Entry);
}

#[tokio::test(start_paused = true)]
async fn test_log_keeps_newest_entries() {
    let (feed, connector) = feed_with(NotificationFeedConfig {
        max_notifications: 3,
        ..Default::default()
    });
    let peer = connector.latest().unwrap();
    peer.open();
    for symbol in ["A", "B", "C", "D", "E"] {
        peer.text(bot_frame("entry", symbol));
    }
    settle().await;

    let symbols: Vec<_> = feed
        .notifications()
        .into_iter()
        .map(|n| n.event.symbol)
        .collect();
    assert_eq!(symbols, vec!["E", "D", "C"]);
}

#[tokio::test(start_paused = true)]
async fn test_dismiss_and_clear() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("entry", "A"));
    peer.text(bot_frame("exit", "B"));
    settle().await;

    let log = feed.notifications();
    assert!(feed.dismiss(log[0].id));
    assert!(!feed.dismiss(log[0].id));
    assert_eq!(feed.notifications().len(), 1);

    feed.clear_all();
    assert!(feed.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clear_does_not_reset_dedup() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    feed.clear_all();
    peer.text(bot_frame("looking", "TSLA"));
    settle().await;

    assert!(feed.notifications().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_clean_close_is_not_retried() {
    for code in [1000, 1001] {
        let (feed, connector) = feed();
        let peer = connector.latest().unwrap();
        peer.open();
        peer.close(Some(code));
        settle().await;

        tokio::time::sleep(RETRY * 2).await;
        assert_eq!(connector.open_count(), 1);
        assert_eq!(feed.status().state, ConnectionState::Closed);
    }
}

#[tokio::test(start_paused = true)]
async fn test_abnormal_close_retried_after_fixed_delay() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.error("connection reset");
    peer.close(Some(1006));
    settle().await;

    assert_eq!(feed.last_error(), "connection reset");
    assert!(!feed.is_connected());

    tokio::time::sleep(RETRY - Duration::from_millis(10)).await;
    assert_eq!(connector.open_count(), 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    settle().await;
    assert_eq!(connector.open_count(), 2);

    connector.latest().unwrap().open();
    settle().await;
    assert!(feed.is_connected());
    assert_eq!(feed.last_error(), "");
}

#[tokio::test(start_paused = true)]
async fn test_log_survives_reconnect() {
    let (feed, connector) = feed();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("entry", "TSLA"));
    peer.close(None);
    settle().await;

    tokio::time::sleep(RETRY).await;
    settle().await;

    assert_eq!(connector.open_count(), 2);
    assert_eq!(feed.notifications().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_imperative_disconnect_and_connect() {
    let (feed, connector) = feed();
    connector.latest().unwrap().open();
    settle().await;

    feed.disconnect();
    feed.disconnect();
    settle().await;
    assert!(!feed.is_connected());

    feed.connect();
    assert_eq!(connector.open_count(), 2);
    connector.latest().unwrap().open();
    settle().await;
    assert!(feed.is_connected());
}

#[tokio::test(start_paused = true)]
async fn test_late_frame_after_drop_is_harmless() {
    let (feed, connector) = feed();
    let updates = feed.updates();
    let peer = connector.latest().unwrap();
    peer.open();
    peer.text(bot_frame("entry", "TSLA"));
    settle().await;

    drop(feed);
    // may or may not reach the channel; either way it is never applied
    peer.text(bot_frame("exit", "TSLA"));
    settle().await;

    assert_eq!(updates.borrow().len(), 1);
    assert!(peer.is_released());
}
