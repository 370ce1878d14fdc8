//! XML channel-list decoding.
//!
//! Both channel lists use the vendor namespace ([`HIK_XML_NS`]). Elements
//! that cannot be read are skipped or left unknown; only a document that
//! fails to parse at all is an error.

use std::collections::BTreeSet;

use roxmltree::{Document, Node};

use crate::error::Result;
use crate::types::{AnalogObservation, DigitalChannelDesc, HIK_XML_NS};

/// Decode the analog channel-input list, keeping only the identifiers in
/// `valid_ids`.
///
/// Channels outside the configured set are parsed but discarded, as are
/// entries whose `id` element is missing or non-numeric (there is nothing
/// to track them by).
pub fn parse_analog_channels(
    xml: &str,
    valid_ids: &BTreeSet<u32>,
) -> Result<Vec<AnalogObservation>> {
    let doc = Document::parse(xml)?;

    let observations = doc
        .descendants()
        .filter(|n| n.has_tag_name((HIK_XML_NS, "VideoInputChannel")))
        .filter_map(|channel| {
            let id: u32 = child_text(channel, "id")?.trim().parse().ok()?;
            if !valid_ids.contains(&id) {
                return None;
            }
            Some(AnalogObservation {
                id,
                name: child_text(channel, "name").map(str::to_string),
                enabled: child_text(channel, "videoInputEnabled")
                    .and_then(|t| t.trim().parse().ok()),
                res_desc: child_text(channel, "resDesc").map(str::to_string),
            })
        })
        .collect();

    Ok(observations)
}

/// Decode the digital input-proxy channel list.
pub fn parse_digital_channels(xml: &str) -> Result<Vec<DigitalChannelDesc>> {
    let doc = Document::parse(xml)?;

    let descriptors = doc
        .descendants()
        .filter(|n| n.has_tag_name((HIK_XML_NS, "InputProxyChannel")))
        .map(|channel| {
            let port = channel
                .children()
                .find(|c| c.has_tag_name((HIK_XML_NS, "sourceInputPortDescriptor")));
            DigitalChannelDesc {
                id: child_text(channel, "id").and_then(|t| t.trim().parse().ok()),
                name: child_text(channel, "name").map(str::to_string),
                ip_address: port
                    .and_then(|p| child_text(p, "ipAddress"))
                    .map(str::to_string),
            }
        })
        .collect();

    Ok(descriptors)
}

/// Text content of a namespaced direct child element.
fn child_text<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.children()
        .find(|c| c.has_tag_name((HIK_XML_NS, name)))
        .and_then(|c| c.text())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChannelHealth, DegradeReason};

    const ANALOG_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<VideoInputChannelList xmlns="http://www.hikvision.com/ver20/XMLSchema">
  <VideoInputChannel>
    <id>1</id>
    <name>Gate</name>
    <videoInputEnabled>true</videoInputEnabled>
    <resDesc>NO VIDEO</resDesc>
  </VideoInputChannel>
  <VideoInputChannel>
    <id>2</id>
    <name>Yard</name>
    <videoInputEnabled>true</videoInputEnabled>
    <resDesc>704x576</resDesc>
  </VideoInputChannel>
  <VideoInputChannel>
    <id>7</id>
    <name>Spare</name>
    <videoInputEnabled>false</videoInputEnabled>
    <resDesc>704x576</resDesc>
  </VideoInputChannel>
</VideoInputChannelList>"#;

    const DIGITAL_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<InputProxyChannelList xmlns="http://www.hikvision.com/ver20/XMLSchema">
  <InputProxyChannel>
    <id>1</id>
    <name>Entrance</name>
    <sourceInputPortDescriptor>
      <ipAddress>192.168.1.64</ipAddress>
      <managePortNo>8000</managePortNo>
      <userName>admin</userName>
    </sourceInputPortDescriptor>
  </InputProxyChannel>
  <InputProxyChannel>
    <id>2</id>
    <name>Parking</name>
    <sourceInputPortDescriptor>
      <ipAddress>192.168.1.65</ipAddress>
    </sourceInputPortDescriptor>
  </InputProxyChannel>
</InputProxyChannelList>"#;

    #[test]
    fn test_analog_filters_to_valid_ids() {
        let valid = BTreeSet::from([1, 2]);
        let channels = parse_analog_channels(ANALOG_XML, &valid).unwrap();

        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].id, 1);
        assert_eq!(channels[0].name.as_deref(), Some("Gate"));
        assert_eq!(
            channels[0].health(),
            ChannelHealth::Bad(DegradeReason::NoVideo)
        );
        assert_eq!(channels[1].health(), ChannelHealth::Good);
    }

    #[test]
    fn test_analog_missing_fields_become_unknown() {
        let xml = r#"<VideoInputChannelList xmlns="http://www.hikvision.com/ver20/XMLSchema">
  <VideoInputChannel><id>1</id></VideoInputChannel>
</VideoInputChannelList>"#;
        let valid = BTreeSet::from([1]);
        let channels = parse_analog_channels(xml, &valid).unwrap();

        assert_eq!(channels.len(), 1);
        assert_eq!(channels[0].enabled, None);
        assert_eq!(channels[0].res_desc, None);
        assert_eq!(channels[0].health(), ChannelHealth::Good);
    }

    #[test]
    fn test_analog_entry_without_id_is_dropped() {
        let xml = r#"<VideoInputChannelList xmlns="http://www.hikvision.com/ver20/XMLSchema">
  <VideoInputChannel><name>Nameless</name></VideoInputChannel>
</VideoInputChannelList>"#;
        let valid = BTreeSet::from([1]);
        assert!(parse_analog_channels(xml, &valid).unwrap().is_empty());
    }

    #[test]
    fn test_digital_channel_list() {
        let descs = parse_digital_channels(DIGITAL_XML).unwrap();

        assert_eq!(descs.len(), 2);
        assert_eq!(descs[0].id, Some(1));
        assert_eq!(descs[0].name.as_deref(), Some("Entrance"));
        assert_eq!(descs[0].ip_address.as_deref(), Some("192.168.1.64"));
        assert_eq!(descs[1].ip_address.as_deref(), Some("192.168.1.65"));
    }

    #[test]
    fn test_malformed_xml_is_an_error() {
        let valid = BTreeSet::from([1]);
        assert!(parse_analog_channels("<unclosed", &valid).is_err());
    }
}
