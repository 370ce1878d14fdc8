//! Entity health state store.
//!
//! The store is the only shared mutable resource in the monitor. State is
//! partitioned per device behind one mutex each, so probes of different
//! devices never serialize on a common lock; the ip-half and analog-half of
//! a mixed device write disjoint key namespaces but share the device lock.

use std::collections::HashMap;

use chrono::{DateTime, Local};
use isapi_protocol::DegradeReason;
use tokio::sync::Mutex;

/// Identifies one channel on one device.
///
/// Analog input ids and digital channel numbers are independent namespaces
/// even on the same device, so the protocol is part of the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKey {
    Digital(u32),
    Analog(u32),
}

impl ChannelKey {
    pub fn protocol_label(&self) -> &'static str {
        match self {
            ChannelKey::Digital(_) => "Digital",
            ChannelKey::Analog(_) => "Analog",
        }
    }

    pub fn number(&self) -> u32 {
        match self {
            ChannelKey::Digital(n) | ChannelKey::Analog(n) => *n,
        }
    }
}

/// Device-level reachability state.
///
/// Offline if and only if `down_since` is set.
#[derive(Debug, Default)]
pub struct ConnectionState {
    pub down_since: Option<DateTime<Local>>,
}

impl ConnectionState {
    pub fn is_offline(&self) -> bool {
        self.down_since.is_some()
    }
}

/// Health state of one camera channel.
///
/// Degraded if and only if `down_since` is set; `reason` tracks the most
/// recently reported trigger and never affects the outage timer.
#[derive(Debug)]
pub struct ChannelState {
    pub name: String,
    pub down_since: Option<DateTime<Local>>,
    pub reason: Option<DegradeReason>,
}

impl ChannelState {
    pub fn healthy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            down_since: None,
            reason: None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.down_since.is_some()
    }
}

/// All tracked state for one device.
///
/// Channel entries are created lazily on first observation and never
/// deleted during a run; a channel missing from a later payload simply
/// keeps its previous state.
#[derive(Debug, Default)]
pub struct DeviceState {
    pub connection: ConnectionState,
    pub channels: HashMap<ChannelKey, ChannelState>,
}

/// Per-device partitioned state map.
pub struct StateStore {
    devices: HashMap<String, Mutex<DeviceState>>,
}

impl StateStore {
    /// Build an empty store for a fixed set of device names. The device set
    /// is read-only after load, so the outer map is never mutated.
    pub fn new<I, S>(device_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            devices: device_names
                .into_iter()
                .map(|name| (name.into(), Mutex::new(DeviceState::default())))
                .collect(),
        }
    }

    /// Lock handle for one device's state.
    pub fn device(&self, name: &str) -> Option<&Mutex<DeviceState>> {
        self.devices.get(name)
    }

    /// Clear every device back to empty, as if freshly started.
    ///
    /// Callers must ensure no pipeline is in flight; the stop-monitoring
    /// path awaits worker shutdown before resetting, so a partial reset is
    /// never observable.
    pub async fn reset(&self) {
        for state in self.devices.values() {
            *state.lock().await = DeviceState::default();
        }
        log::info!("Statuses have been reset.");
    }
}
