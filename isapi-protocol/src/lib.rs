//! Hikvision ISAPI payload decoding for camwatch.
//!
//! This crate turns the raw payloads returned by a DVR's ISAPI endpoints into
//! normalized per-channel observations. It knows about three payloads:
//!
//! - the analog channel-input list
//!   (`/ISAPI/System/Video/inputs/channels`, XML),
//! - the digital input-proxy channel list
//!   (`/ISAPI/ContentMgmt/InputProxy/channels`, XML),
//! - the per-channel working status
//!   (`/ISAPI/System/workingstatus?format=json`, JSON, two accepted shapes).
//!
//! Decoding is lenient: a missing or unreadable field inside an otherwise
//! well-formed payload becomes `None` ("unknown"), never an error. Only a
//! structurally malformed document is a [`ParseError`].
//!
//! # Example
//!
//! ```rust
//! use isapi_protocol::parse_working_status;
//!
//! let json = r#"{"ChanStatus": [{"chanNo": 1, "online": 0, "record": 1}]}"#;
//! let statuses = parse_working_status(json).unwrap();
//! assert_eq!(statuses[0].chan_no, 1);
//! assert_eq!(statuses[0].online, Some(false));
//! ```

pub mod channel_list;
pub mod error;
pub mod types;
pub mod working_status;

pub use channel_list::{parse_analog_channels, parse_digital_channels};
pub use error::ParseError;
pub use types::{
    correlate, AnalogObservation, ChannelHealth, ChannelWorkingStatus, DegradeReason,
    DigitalChannelDesc, DigitalObservation, HIK_XML_NS,
};
pub use working_status::parse_working_status;
