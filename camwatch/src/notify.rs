//! Event notifier and its sinks.
//!
//! The notifier drains the event channel on its own task so a slow or
//! failing sink can never delay a polling cycle. Sinks are selected by
//! configuration: the log sink and the outage record always run, the
//! Telegram sink only when a `[telegram]` section is present. Delivery
//! failures are logged and swallowed.

use log::{info, warn};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::TelegramSection;
use crate::event::{Event, Transition};
use crate::outage_log::OutageLog;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("chat request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("chat endpoint rejected message (HTTP {0})")]
    Rejected(u16),
}

/// Consumes events until the channel closes and fans them out to sinks.
pub struct Notifier {
    events: mpsc::Receiver<Event>,
    telegram: Option<TelegramSink>,
    outage_log: OutageLog,
}

impl Notifier {
    pub fn new(
        events: mpsc::Receiver<Event>,
        telegram: Option<&TelegramSection>,
        outage_log: OutageLog,
    ) -> Self {
        Self {
            events,
            telegram: telegram.map(TelegramSink::new),
            outage_log,
        }
    }

    /// Start the notifier background task.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(mut self) {
        while let Some(event) = self.events.recv().await {
            log_event(&event);

            if let Err(e) = self.outage_log.append(&event) {
                warn!("Failed to append outage record: {}", e);
            }

            if let Some(telegram) = &self.telegram {
                if telegram.wants(&event) {
                    if let Err(e) = telegram.deliver(&event).await {
                        warn!("Telegram delivery failed: {}", e);
                    }
                }
            }
        }
        info!("Notifier: event channel closed, shutting down");
    }
}

/// Operational log sink: one structured line per transition.
fn log_event(event: &Event) {
    match event.transition {
        Transition::BecameBad | Transition::StillBad => warn!("{}", event.message()),
        Transition::Recovered => info!("{}", event.message()),
    }
}

/// Chat sink posting to the Telegram bot API.
pub struct TelegramSink {
    client: reqwest::Client,
    token: String,
    chat_id: String,
}

impl TelegramSink {
    pub fn new(config: &TelegramSection) -> Self {
        Self {
            client: reqwest::Client::new(),
            token: config.token.clone(),
            chat_id: config.chat_id.clone(),
        }
    }

    /// StillBad repeats every cycle an outage persists; suppress it here to
    /// avoid flooding the chat. Open and close of an outage always go out.
    pub fn wants(&self, event: &Event) -> bool {
        event.transition != Transition::StillBad
    }

    pub async fn deliver(&self, event: &Event) -> Result<(), NotifyError> {
        self.send(&event.message()).await
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self.client.post(&url).json(&payload).send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Entity;
    use chrono::{Duration, Local, TimeZone};

    fn sink() -> TelegramSink {
        TelegramSink::new(&TelegramSection {
            token: "123:abc".to_string(),
            chat_id: "42".to_string(),
        })
    }

    fn event(transition: Transition) -> Event {
        let at = Local.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
        Event {
            device: "D1".to_string(),
            entity: Entity::Connection,
            transition,
            reason: None,
            at,
            since: at,
            duration: Some(Duration::minutes(1)),
        }
    }

    #[test]
    fn test_telegram_suppresses_still_bad() {
        let sink = sink();
        assert!(sink.wants(&event(Transition::BecameBad)));
        assert!(sink.wants(&event(Transition::Recovered)));
        assert!(!sink.wants(&event(Transition::StillBad)));
    }
}
