//! CLI interface for livefeed
//!
//! Provides subcommands for:
//! - `prices`: Watch the live price feed
//! - `events`: Watch the bot notification feed
//! - `config`: Show the effective configuration

mod events;
mod prices;

pub use events::EventsArgs;
pub use prices::PricesArgs;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "livefeed")]
#[command(about = "Realtime price and bot-event stream client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: String,

    /// Override the page origin stream URLs are derived from
    #[arg(long)]
    pub origin: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch live price ticks
    Prices(PricesArgs),
    /// Watch bot notifications
    Events(EventsArgs),
    /// Show configuration
    Config,
}
