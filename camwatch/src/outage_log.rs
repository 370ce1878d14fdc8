//! Completed-outage record file.
//!
//! One plain-text line is appended per closed outage (Recovered event),
//! durable across restarts. This is the only history the monitor keeps.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::event::{format_duration, format_timestamp, Entity, Event, Transition};

/// Append-only record of completed outages.
pub struct OutageLog {
    path: PathBuf,
}

impl OutageLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append the record for one Recovered event. Events for other
    /// transitions are ignored.
    pub fn append(&self, event: &Event) -> io::Result<()> {
        if event.transition != Transition::Recovered {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", record_line(event))
    }
}

fn record_line(event: &Event) -> String {
    let from = format_timestamp(&event.since);
    let to = format_timestamp(&event.at);
    let duration = event.duration.map(format_duration).unwrap_or_default();

    match &event.entity {
        Entity::Connection => format!(
            "DVR: {} was OFFLINE from {} to {} (Duration: {})",
            event.device, from, to, duration
        ),
        Entity::Channel { key, name } => format!(
            "DVR: {}, {} channel {} ({}) was OFFLINE from {} to {} (Duration: {})",
            event.device,
            key.protocol_label(),
            key.number(),
            name,
            from,
            to,
            duration
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ChannelKey;
    use chrono::{Duration, Local, TimeZone};

    fn recovered(device: &str, entity: Entity) -> Event {
        let since = Local.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        let at = Local.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap();
        Event {
            device: device.to_string(),
            entity,
            transition: Transition::Recovered,
            reason: None,
            at,
            since,
            duration: Some(Duration::minutes(90)),
        }
    }

    #[test]
    fn test_append_writes_one_line_per_recovery() {
        let dir = tempfile::tempdir().unwrap();
        let log = OutageLog::new(dir.path().join("outages.txt"));

        let event = recovered(
            "D1",
            Entity::Channel {
                key: ChannelKey::Analog(2),
                name: "Yard".to_string(),
            },
        );
        log.append(&event).unwrap();
        log.append(&recovered("D2", Entity::Connection)).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("outages.txt")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "DVR: D1, Analog channel 2 (Yard) was OFFLINE from 2026-03-01 08:00 to 2026-03-01 09:30 (Duration: 1:30:00)"
        );
        assert_eq!(
            lines[1],
            "DVR: D2 was OFFLINE from 2026-03-01 08:00 to 2026-03-01 09:30 (Duration: 1:30:00)"
        );
    }

    #[test]
    fn test_non_recovered_events_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("outages.txt");
        let log = OutageLog::new(path.clone());

        let mut event = recovered("D1", Entity::Connection);
        event.transition = Transition::StillBad;
        log.append(&event).unwrap();

        assert!(!path.exists());
    }
}
