use anyhow::Context;
use clap::Parser;
use livefeed::cli::{Cli, Commands};
use livefeed::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match Config::load(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Warning: Could not load config from {}: {:#}", cli.config, e);
            eprintln!("Using default configuration");
            Config::from_toml(include_str!("../config.toml.example"))
                .context("bundled example config is invalid")?
        }
    };
    if let Some(origin) = cli.origin {
        config.origin = origin;
    }

    // Initialize telemetry
    let _telemetry = livefeed::telemetry::init_telemetry(&config.telemetry)?;

    match cli.command {
        Commands::Prices(args) => {
            tracing::info!(origin = %config.origin, "Watching price feed");
            args.execute(&config).await?;
        }
        Commands::Events(args) => {
            tracing::info!(origin = %config.origin, "Watching notification feed");
            args.execute(&config).await?;
        }
        Commands::Config => {
            println!("Current configuration:");
            println!("  Origin: {}", config.origin);
            println!(
                "  Prices: {} (retry {}ms, always)",
                config.price.endpoint_path, config.price.retry_delay_ms
            );
            println!(
                "  Notifications: {} (retry {}ms, stops on clean close)",
                config.notifications.endpoint_path, config.notifications.retry_delay_ms
            );
            println!(
                "  Log: max={}, dedup window={}s, sweep>{}, capacity={}",
                config.notifications.max_notifications,
                config.notifications.dedup_window_secs,
                config.notifications.dedup_sweep_threshold,
                config.notifications.dedup_capacity
            );
            println!(
                "  Transport: ping={}s, pong timeout={}s",
                config.transport.ping_interval_secs, config.transport.pong_timeout_secs
            );
        }
    }

    Ok(())
}
