//! Prices command implementation

use crate::config::Config;
use crate::feed::{PriceBook, PriceEntry, PriceFeed};
use clap::Args;
use std::collections::BTreeMap;

#[derive(Args, Debug)]
pub struct PricesArgs {
    /// Only show these symbols (any case); repeatable
    #[arg(short, long)]
    pub symbol: Vec<String>,

    /// Print each snapshot as JSON
    #[arg(long)]
    pub json: bool,
}

impl PricesArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let feed = PriceFeed::subscribe(
            config.origin.clone(),
            &config.price,
            config.transport.ws_config(),
        );
        let mut updates = feed.updates();
        let mut status = feed.watch_status();

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let book = updates.borrow_and_update().clone();
                    self.render(&book)?;
                }
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = status.borrow_and_update().clone();
                    tracing::info!(
                        state = ?current.state,
                        error = current.last_error.as_deref().unwrap_or_default(),
                        "Price feed status"
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, closing price feed");
                    break;
                }
            }
        }

        drop(feed);
        Ok(())
    }

    fn select<'a>(&self, book: &'a PriceBook) -> BTreeMap<String, &'a PriceEntry> {
        if self.symbol.is_empty() {
            book.iter()
                .map(|(symbol, entry)| (symbol.to_string(), entry))
                .collect()
        } else {
            self.symbol
                .iter()
                .filter_map(|symbol| {
                    book.get(symbol)
                        .map(|entry| (symbol.to_ascii_uppercase(), entry))
                })
                .collect()
        }
    }

    fn render(&self, book: &PriceBook) -> anyhow::Result<()> {
        let selected = self.select(book);
        if selected.is_empty() {
            return Ok(());
        }

        if self.json {
            println!("{}", serde_json::to_string(&selected)?);
            return Ok(());
        }

        for (symbol, entry) in selected {
            let change = entry
                .change()
                .map(|delta| format!(" ({delta:+})"))
                .unwrap_or_default();
            println!(
                "{symbol:<8} {}{change}  {:?}  {}",
                entry.price,
                entry.source,
                entry.timestamp.to_rfc3339()
            );
        }
        Ok(())
    }
}
