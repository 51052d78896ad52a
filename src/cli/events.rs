//! Events command implementation

use crate::config::Config;
use crate::feed::{Notification, NotificationFeed, NotificationLog};
use clap::Args;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct EventsArgs {
    /// Print each notification as JSON
    #[arg(long)]
    pub json: bool,
}

impl EventsArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let feed = NotificationFeed::subscribe(
            config.origin.clone(),
            &config.notifications,
            config.transport.ws_config(),
        );
        let mut updates = feed.updates();
        let mut status = feed.watch_status();
        let mut newest: Option<Uuid> = None;

        loop {
            tokio::select! {
                changed = updates.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let log = updates.borrow_and_update().clone();
                    for notification in unseen(&log, newest) {
                        self.render(notification)?;
                    }
                    newest = log.iter().next().map(|n| n.id).or(newest);
                }
                changed = status.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let current = status.borrow_and_update().clone();
                    tracing::info!(
                        state = ?current.state,
                        error = current.last_error.as_deref().unwrap_or_default(),
                        "Notification feed status"
                    );
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted, closing notification feed");
                    break;
                }
            }
        }

        drop(feed);
        Ok(())
    }

    fn render(&self, notification: &Notification) -> anyhow::Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(notification)?);
            return Ok(());
        }

        let event = &notification.event;
        let reason = event.reason.as_deref().unwrap_or_default();
        println!(
            "{}  {:<9} {:<8} {}",
            event.timestamp.to_rfc3339(),
            event.event_type,
            event.symbol,
            reason
        );
        Ok(())
    }
}

/// Entries newer than `newest`, oldest first
fn unseen(log: &NotificationLog, newest: Option<Uuid>) -> Vec<&Notification> {
    let mut fresh: Vec<_> = log
        .iter()
        .take_while(|n| Some(n.id) != newest)
        .collect();
    fresh.reverse();
    fresh
}
