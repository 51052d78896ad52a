//! Integration tests for configuration loading

use livefeed::config::Config;
use livefeed::telemetry::LogFormat;
use std::io::Write;

#[test]
fn test_example_config_parses() {
    let config = Config::from_toml(include_str!("../../config.toml.example")).unwrap();
    assert_eq!(config.origin, "http://localhost:8080");
    assert_eq!(config.price.retry_delay_ms, 3000);
    assert_eq!(config.notifications.retry_delay_ms, 5000);
    assert_eq!(config.notifications.max_notifications, 10);
    assert_eq!(config.notifications.dedup_window_secs, 300);
    assert_eq!(config.telemetry.log_format, LogFormat::Pretty);
    assert!(config.telemetry.metrics_port.is_none());
}

#[test]
fn test_load_from_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        origin = "https://dash.example.com"

        [notifications]
        max_notifications = 5
        "#
    )
    .unwrap();

    let config = tokio_test::assert_ok!(Config::load(file.path()));
    assert_eq!(config.origin, "https://dash.example.com");
    assert_eq!(config.notifications.max_notifications, 5);
    assert_eq!(config.price.endpoint_path, "/ws/prices");
}

#[test]
fn test_load_rejects_bad_toml() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "origin = [").unwrap();

    tokio_test::assert_err!(Config::load(file.path()));
}
