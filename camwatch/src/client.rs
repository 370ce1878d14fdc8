//! Device probe client.
//!
//! One [`DeviceClient`] performs the HTTP round trips against a DVR's ISAPI
//! endpoints with Digest authentication and a bounded per-request timeout.
//! Every failure is classified before it leaves this module; nothing here
//! panics or propagates a raw transport error.

use std::time::Duration;

use diqwest::WithDigestAuth;
use log::debug;
use reqwest::StatusCode;
use thiserror::Error;

use crate::config::DeviceConfig;

/// Connection-level status endpoint.
const STATUS_PATH: &str = "/ISAPI/System/Status";
/// Digital (IP camera) channel descriptors, XML.
const PROXY_CHANNELS_PATH: &str = "/ISAPI/ContentMgmt/InputProxy/channels";
/// Per-channel working status, JSON.
const WORKING_STATUS_PATH: &str = "/ISAPI/System/workingstatus?format=json";
/// Analog channel inputs, XML.
const VIDEO_INPUTS_PATH: &str = "/ISAPI/System/Video/inputs/channels";

/// Classified probe failure.
///
/// Transport and protocol failures count as connection-level "bad" for
/// outage timing; an auth failure is a configuration problem and is never
/// timed as downtime.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// Timeout, refused connection, DNS failure or any other
    /// transport-level error.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The device rejected our credentials (401/403).
    #[error("authentication rejected (HTTP {0})")]
    Auth(u16),

    /// The device answered with an unexpected status code.
    #[error("unexpected HTTP status {0}")]
    Protocol(u16),
}

impl ProbeError {
    pub fn is_auth(&self) -> bool {
        matches!(self, ProbeError::Auth(_))
    }
}

pub type Result<T> = std::result::Result<T, ProbeError>;

/// Raw payload pair for the digital protocol half.
#[derive(Debug)]
pub struct DigitalPayload {
    pub channel_list: String,
    pub working_status: String,
}

/// HTTP probe client, shared by all pipelines of a run.
#[derive(Clone)]
pub struct DeviceClient {
    http: reqwest::Client,
    timeout: Duration,
}

impl DeviceClient {
    pub fn new(timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            timeout,
        }
    }

    /// Connection-level probe: one GET against the status endpoint.
    pub async fn probe_status(&self, device: &DeviceConfig) -> Result<()> {
        self.get(device, STATUS_PATH).await.map(|_| ())
    }

    /// Fetch both digital payloads; both requests must return 200.
    pub async fn fetch_digital(&self, device: &DeviceConfig) -> Result<DigitalPayload> {
        let channel_list = self.get(device, PROXY_CHANNELS_PATH).await?;
        let working_status = self.get(device, WORKING_STATUS_PATH).await?;
        Ok(DigitalPayload {
            channel_list,
            working_status,
        })
    }

    /// Fetch the analog channel-input payload.
    pub async fn fetch_analog(&self, device: &DeviceConfig) -> Result<String> {
        self.get(device, VIDEO_INPUTS_PATH).await
    }

    async fn get(&self, device: &DeviceConfig, path: &str) -> Result<String> {
        let url = format!("http://{}:{}{}", device.address, device.port, path);
        debug!("GET {} (timeout {:?})", url, self.timeout);

        let response = self
            .http
            .get(&url)
            .timeout(self.timeout)
            .send_with_digest_auth(&device.username, &device.password)
            .await
            .map_err(|e| ProbeError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => response
                .text()
                .await
                .map_err(|e| ProbeError::Transport(e.to_string())),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(ProbeError::Auth(response.status().as_u16()))
            }
            status => Err(ProbeError::Protocol(status.as_u16())),
        }
    }
}
