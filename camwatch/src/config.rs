//! Configuration file loading.
//!
//! The device fleet, poll defaults and notification targets come from one
//! TOML file, loaded once at startup. There is no hot reload; a config
//! problem is the only fatal error in the program.

use std::collections::{BTreeSet, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

/// Default poll interval between cycles (seconds).
pub const DEFAULT_INTERVAL_SECS: u64 = 180;

/// Default per-request probe timeout (seconds).
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 8;

/// Default completed-outage record file.
pub const DEFAULT_OUTAGE_LOG: &str = "offline_cameras_log.txt";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("no devices configured")]
    NoDevices,

    #[error("duplicate device name: {0}")]
    DuplicateDevice(String),

    #[error("device {0} monitors analog channels but analog_channels is empty")]
    NoAnalogChannels(String),
}

/// Which camera protocols a DVR carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Ip,
    Analog,
    Mixed,
}

impl DeviceKind {
    pub fn has_digital(self) -> bool {
        matches!(self, DeviceKind::Ip | DeviceKind::Mixed)
    }

    pub fn has_analog(self) -> bool {
        matches!(self, DeviceKind::Analog | DeviceKind::Mixed)
    }
}

/// One monitored DVR. Immutable after load.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Unique key; appears in every event, log line and outage record.
    pub name: String,
    pub address: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub kind: DeviceKind,
    /// Analog input ids worth tracking; observations outside this set are
    /// discarded. Only meaningful when `kind` includes analog.
    #[serde(default)]
    pub analog_channels: BTreeSet<u32>,
}

#[derive(Debug, Deserialize, Default)]
pub struct MonitorSection {
    interval_secs: Option<u64>,
    probe_timeout_secs: Option<u64>,
    outage_log: Option<PathBuf>,
}

impl MonitorSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.unwrap_or(DEFAULT_INTERVAL_SECS))
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.unwrap_or(DEFAULT_PROBE_TIMEOUT_SECS))
    }

    pub fn outage_log(&self) -> PathBuf {
        self.outage_log
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTAGE_LOG))
    }
}

/// Chat notification target (Telegram bot API).
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramSection {
    pub token: String,
    pub chat_id: String,
}

/// Top-level configuration file.
#[derive(Debug, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub monitor: MonitorSection,
    pub telegram: Option<TelegramSection>,
    #[serde(default)]
    pub devices: Vec<DeviceConfig>,
}

/// Load and validate the configuration file.
pub fn load_config(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config: ConfigFile = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &ConfigFile) -> Result<(), ConfigError> {
    if config.devices.is_empty() {
        return Err(ConfigError::NoDevices);
    }

    let mut seen = HashSet::new();
    for device in &config.devices {
        if !seen.insert(device.name.as_str()) {
            return Err(ConfigError::DuplicateDevice(device.name.clone()));
        }
        if device.kind.has_analog() && device.analog_channels.is_empty() {
            return Err(ConfigError::NoAnalogChannels(device.name.clone()));
        }
    }

    Ok(())
}
