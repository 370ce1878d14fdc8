//! Working-status JSON decoding.

use serde::Deserialize;

use crate::error::{ParseError, Result};
use crate::types::ChannelWorkingStatus;

/// The document is served in two shapes depending on firmware: either the
/// status object is nested under a `WorkingStatus` key or it is the top
/// level. Both must be accepted.
#[derive(Deserialize)]
struct WorkingStatusDoc {
    #[serde(rename = "WorkingStatus")]
    working_status: Option<ChanStatusHolder>,
    #[serde(rename = "ChanStatus")]
    chan_status: Option<Vec<ChannelWorkingStatus>>,
}

#[derive(Deserialize)]
struct ChanStatusHolder {
    #[serde(rename = "ChanStatus")]
    chan_status: Option<Vec<ChannelWorkingStatus>>,
}

/// Decode the per-channel working status array from either document shape.
pub fn parse_working_status(json: &str) -> Result<Vec<ChannelWorkingStatus>> {
    let doc: WorkingStatusDoc = serde_json::from_str(json)?;

    doc.working_status
        .and_then(|w| w.chan_status)
        .or(doc.chan_status)
        .ok_or(ParseError::MissingChanStatus)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_shape() {
        let json = r#"{
            "WorkingStatus": {
                "DeviceStatus": {"status": "normal"},
                "ChanStatus": [
                    {"chanNo": 1, "online": 1, "record": 1},
                    {"chanNo": 2, "online": 0, "record": 0}
                ]
            }
        }"#;
        let statuses = parse_working_status(json).unwrap();

        assert_eq!(statuses.len(), 2);
        assert_eq!(statuses[0].online, Some(true));
        assert_eq!(statuses[1].chan_no, 2);
        assert_eq!(statuses[1].online, Some(false));
    }

    #[test]
    fn test_flat_shape() {
        let json = r#"{"ChanStatus": [{"chanNo": 4, "online": true}]}"#;
        let statuses = parse_working_status(json).unwrap();

        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].chan_no, 4);
        assert_eq!(statuses[0].online, Some(true));
        assert_eq!(statuses[0].record, None);
    }

    #[test]
    fn test_missing_online_is_unknown() {
        let json = r#"{"ChanStatus": [{"chanNo": 1}]}"#;
        let statuses = parse_working_status(json).unwrap();
        assert_eq!(statuses[0].online, None);
    }

    #[test]
    fn test_neither_shape_is_an_error() {
        assert!(matches!(
            parse_working_status(r#"{"Status": {}}"#),
            Err(ParseError::MissingChanStatus)
        ));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(matches!(
            parse_working_status("{nope"),
            Err(ParseError::Json(_))
        ));
    }
}
