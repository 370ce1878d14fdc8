//! Normalized channel observation types.

use std::fmt;

use serde::Deserialize;

/// Vendor XML namespace used by every ISAPI document we decode.
pub const HIK_XML_NS: &str = "http://www.hikvision.com/ver20/XMLSchema";

/// Why a channel is considered degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegradeReason {
    /// Analog input reports `resDesc = "NO VIDEO"`.
    NoVideo,
    /// Analog input is administratively disabled (`videoInputEnabled = false`).
    Disabled,
    /// Digital channel reports `online = 0`.
    LinkDown,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::NoVideo => write!(f, "NO VIDEO"),
            DegradeReason::Disabled => write!(f, "disabled"),
            DegradeReason::LinkDown => write!(f, "link down"),
        }
    }
}

/// Health verdict for one channel in one polling cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelHealth {
    Good,
    Bad(DegradeReason),
}

/// One analog video input as reported by the channel-input list.
///
/// Missing fields are `None`; an unknown value never counts as evidence of
/// a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogObservation {
    /// Channel identifier (analog namespace, scoped per device).
    pub id: u32,
    /// Display name configured on the DVR.
    pub name: Option<String>,
    /// `videoInputEnabled` flag.
    pub enabled: Option<bool>,
    /// Resolution descriptor, e.g. `704x576` or `NO VIDEO`.
    pub res_desc: Option<String>,
}

impl AnalogObservation {
    /// Classify this observation. `NO VIDEO` takes precedence over the
    /// disabled flag when both apply, matching the reported reason.
    pub fn health(&self) -> ChannelHealth {
        if self.res_desc.as_deref() == Some("NO VIDEO") {
            ChannelHealth::Bad(DegradeReason::NoVideo)
        } else if self.enabled == Some(false) {
            ChannelHealth::Bad(DegradeReason::Disabled)
        } else {
            ChannelHealth::Good
        }
    }
}

/// One digital (IP) channel descriptor from the input-proxy list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalChannelDesc {
    pub id: Option<u32>,
    pub name: Option<String>,
    /// Source camera address from `sourceInputPortDescriptor`.
    pub ip_address: Option<String>,
}

/// Per-channel entry of the working-status document.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChannelWorkingStatus {
    /// Digital channel number (digital namespace, scoped per device).
    #[serde(rename = "chanNo")]
    pub chan_no: u32,
    /// Whether the channel currently has a live source.
    #[serde(default, deserialize_with = "bool_or_int")]
    pub online: Option<bool>,
    /// Whether the channel is currently recording.
    #[serde(default, deserialize_with = "bool_or_int")]
    pub record: Option<bool>,
}

/// Joined descriptor + status for one digital channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalObservation {
    pub chan_no: u32,
    pub name: Option<String>,
    pub online: Option<bool>,
}

impl DigitalObservation {
    pub fn health(&self) -> ChannelHealth {
        if self.online == Some(false) {
            ChannelHealth::Bad(DegradeReason::LinkDown)
        } else {
            ChannelHealth::Good
        }
    }
}

/// Join the channel-list descriptors with the working-status entries.
///
/// The two collections come from independent requests and carry no shared
/// key, so they are walked positionally in lockstep. When their lengths
/// differ only the overlapping prefix is converted; the tail of the longer
/// collection is dropped. This mirrors the device's documented pairing and
/// is intentionally not reconciled by identifier.
pub fn correlate(
    descs: &[DigitalChannelDesc],
    statuses: &[ChannelWorkingStatus],
) -> Vec<DigitalObservation> {
    descs
        .iter()
        .zip(statuses.iter())
        .map(|(desc, status)| DigitalObservation {
            chan_no: status.chan_no,
            name: desc.name.clone(),
            online: status.online,
        })
        .collect()
}

/// Accept a JSON boolean or a 0/1 integer; anything else is "unknown".
fn bool_or_int<'de, D>(deserializer: D) -> std::result::Result<Option<bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Bool(b)) => Some(b),
        Some(serde_json::Value::Number(n)) => n.as_i64().map(|v| v != 0),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn analog(enabled: Option<bool>, res_desc: Option<&str>) -> AnalogObservation {
        AnalogObservation {
            id: 1,
            name: Some("Cam 1".to_string()),
            enabled,
            res_desc: res_desc.map(str::to_string),
        }
    }

    #[test]
    fn test_analog_health_no_video() {
        assert_eq!(
            analog(Some(true), Some("NO VIDEO")).health(),
            ChannelHealth::Bad(DegradeReason::NoVideo)
        );
    }

    #[test]
    fn test_analog_health_disabled() {
        assert_eq!(
            analog(Some(false), Some("704x576")).health(),
            ChannelHealth::Bad(DegradeReason::Disabled)
        );
    }

    #[test]
    fn test_analog_no_video_wins_over_disabled() {
        assert_eq!(
            analog(Some(false), Some("NO VIDEO")).health(),
            ChannelHealth::Bad(DegradeReason::NoVideo)
        );
    }

    #[test]
    fn test_analog_unknown_fields_are_not_bad() {
        assert_eq!(analog(None, None).health(), ChannelHealth::Good);
    }

    #[test]
    fn test_digital_unknown_online_is_not_bad() {
        let obs = DigitalObservation {
            chan_no: 3,
            name: None,
            online: None,
        };
        assert_eq!(obs.health(), ChannelHealth::Good);
    }

    #[test]
    fn test_correlate_mismatched_lengths_keeps_prefix() {
        let descs = vec![
            DigitalChannelDesc {
                id: Some(1),
                name: Some("front".to_string()),
                ip_address: None,
            },
            DigitalChannelDesc {
                id: Some(2),
                name: Some("yard".to_string()),
                ip_address: None,
            },
        ];
        let statuses = vec![ChannelWorkingStatus {
            chan_no: 1,
            online: Some(true),
            record: Some(true),
        }];

        let joined = correlate(&descs, &statuses);
        assert_eq!(joined.len(), 1);
        assert_eq!(joined[0].chan_no, 1);
        assert_eq!(joined[0].name.as_deref(), Some("front"));
    }
}
