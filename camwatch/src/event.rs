//! Health transition events.
//!
//! A transition in an entity's health produces exactly one [`Event`], which
//! flows from the transition engine to the notifier sinks. Durations are
//! computed once as typed intervals here; string formatting happens only at
//! the sink boundary.

use chrono::{DateTime, Duration, Local};
use isapi_protocol::DegradeReason;

use crate::state::ChannelKey;

/// The monitored entity an event refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entity {
    /// Device-level reachability of the DVR itself.
    Connection,
    /// One camera channel on the DVR.
    Channel { key: ChannelKey, name: String },
}

/// Kind of health transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Entity just went from healthy to degraded/offline.
    BecameBad,
    /// Entity was already degraded and still is.
    StillBad,
    /// Entity just returned to healthy, closing the outage.
    Recovered,
}

/// One health state-change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub device: String,
    pub entity: Entity,
    pub transition: Transition,
    /// Most recently reported degradation reason; `None` for connection
    /// entities, whose only failure mode is unreachability.
    pub reason: Option<DegradeReason>,
    /// When the observation was made.
    pub at: DateTime<Local>,
    /// When the outage started.
    pub since: DateTime<Local>,
    /// `at - since`; absent on BecameBad, where the outage just opened.
    pub duration: Option<Duration>,
}

impl Event {
    /// Human-readable message, shared by the log and chat sinks.
    pub fn message(&self) -> String {
        let at = format_timestamp(&self.at);
        let since = format_timestamp(&self.since);
        let duration = self.duration.map(format_duration).unwrap_or_default();

        match &self.entity {
            Entity::Connection => match self.transition {
                Transition::BecameBad => {
                    format!("Connection DVR {} lost at {}", self.device, at)
                }
                Transition::StillBad => format!(
                    "DVR: {} is still offline. Duration: {} (since {})",
                    self.device, duration, since
                ),
                Transition::Recovered => format!(
                    "Connection {} restored. Downtime: {}. From {} to {}",
                    self.device, duration, since, at
                ),
            },
            Entity::Channel { key, name } => {
                let label = format!("{} {}", key.protocol_label(), name);
                let reason = self
                    .reason
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "OFFLINE".to_string());
                match self.transition {
                    Transition::BecameBad => format!(
                        "DVR: {}, {} - {} since {}",
                        self.device, label, reason, since
                    ),
                    Transition::StillBad => format!(
                        "DVR: {}, {} - STILL {} (Duration: {} from {})",
                        self.device, label, reason, duration, since
                    ),
                    Transition::Recovered => format!(
                        "DVR: {}, {} was {} from {} to {} (Duration: {})",
                        self.device, label, reason, since, at, duration
                    ),
                }
            }
        }
    }
}

/// Format an outage duration as `H:MM:SS`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.num_seconds().max(0);
    format!(
        "{}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}

/// Format a timestamp with minute precision, matching the outage record.
pub fn format_timestamp(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 1, h, m, s).unwrap()
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(0)), "0:00:00");
        assert_eq!(format_duration(Duration::seconds(61)), "0:01:01");
        assert_eq!(format_duration(Duration::seconds(3 * 3600 + 125)), "3:02:05");
        assert_eq!(format_duration(Duration::seconds(-5)), "0:00:00");
    }

    #[test]
    fn test_channel_recovered_message() {
        let event = Event {
            device: "D1".to_string(),
            entity: Entity::Channel {
                key: ChannelKey::Analog(1),
                name: "Gate".to_string(),
            },
            transition: Transition::Recovered,
            reason: Some(DegradeReason::NoVideo),
            at: t(12, 3, 0),
            since: t(12, 0, 0),
            duration: Some(Duration::minutes(3)),
        };

        assert_eq!(
            event.message(),
            "DVR: D1, Analog Gate was NO VIDEO from 2026-03-01 12:00 to 2026-03-01 12:03 (Duration: 0:03:00)"
        );
    }

    #[test]
    fn test_connection_became_bad_message() {
        let event = Event {
            device: "D2".to_string(),
            entity: Entity::Connection,
            transition: Transition::BecameBad,
            reason: None,
            at: t(9, 30, 0),
            since: t(9, 30, 0),
            duration: None,
        };

        assert_eq!(event.message(), "Connection DVR D2 lost at 2026-03-01 09:30");
    }
}
