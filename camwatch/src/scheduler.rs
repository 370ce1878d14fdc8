//! Polling cycle scheduler.
//!
//! One cycle fans out, per configured device: a connection-level probe, a
//! digital pipeline (kind ip/mixed) and an analog pipeline (kind
//! analog/mixed). Every pipeline of a cycle completes before the
//! inter-cycle sleep begins, so no pipeline spans a cycle boundary. A cycle
//! that outlasts the configured interval is never pre-empted or skipped;
//! the effective polling rate simply degrades.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use futures::future::join_all;
use log::{error, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use isapi_protocol::{
    correlate, parse_analog_channels, parse_digital_channels, parse_working_status,
};

use crate::client::{DeviceClient, ProbeError};
use crate::config::{ConfigFile, DeviceConfig};
use crate::engine;
use crate::event::Event;
use crate::state::{ChannelKey, StateStore};

/// Drives the polling loop for one monitoring run.
pub struct Monitor {
    config: Arc<ConfigFile>,
    store: Arc<StateStore>,
    client: DeviceClient,
    interval: Duration,
    events: mpsc::Sender<Event>,
    cancel: CancellationToken,
}

impl Monitor {
    pub fn new(
        config: Arc<ConfigFile>,
        store: Arc<StateStore>,
        client: DeviceClient,
        interval: Duration,
        events: mpsc::Sender<Event>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            store,
            client,
            interval,
            events,
            cancel,
        }
    }

    /// Start the monitor background task.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    async fn run(self) {
        info!(
            "Monitor: starting, {} device(s), poll interval {}s",
            self.config.devices.len(),
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Monitor: stop requested, abandoning in-flight probes");
                    break;
                }
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Monitor: stopped");
    }

    /// One full pass over all configured devices.
    async fn run_cycle(&self) {
        info!("Monitor: cycle started");

        let mut pipelines: Vec<Pin<Box<dyn Future<Output = ()> + Send + '_>>> = Vec::new();
        for device in &self.config.devices {
            pipelines.push(Box::pin(self.connection_pipeline(device)));
            if device.kind.has_digital() {
                pipelines.push(Box::pin(self.digital_pipeline(device)));
            }
            if device.kind.has_analog() {
                pipelines.push(Box::pin(self.analog_pipeline(device)));
            }
        }
        join_all(pipelines).await;

        info!("Monitor: cycle finished");
    }

    /// Probe device reachability and apply the connection transition.
    async fn connection_pipeline(&self, device: &DeviceConfig) {
        let result = self.client.probe_status(device).await;
        let reachable = match classify_connection(&result) {
            Some(reachable) => reachable,
            None => {
                error!(
                    "Authentication {} failed. Check your username and password.",
                    device.name
                );
                return;
            }
        };

        let Some(device_state) = self.store.device(&device.name) else {
            return;
        };
        let event = {
            let mut state = device_state.lock().await;
            engine::observe_connection(&device.name, &mut state, reachable, Local::now())
        };
        if let Some(event) = event {
            self.emit(event);
        }
    }

    /// Probe, parse and apply transitions for the digital protocol half.
    async fn digital_pipeline(&self, device: &DeviceConfig) {
        let payload = match self.client.fetch_digital(device).await {
            Ok(payload) => payload,
            Err(e) => {
                log_probe_failure(device, "digital", &e);
                return;
            }
        };

        // A malformed payload means no observations this cycle; previous
        // channel state is retained, not assumed bad.
        let descriptors = match parse_digital_channels(&payload.channel_list) {
            Ok(descriptors) => descriptors,
            Err(e) => {
                warn!("{}: discarding digital channel list: {}", device.name, e);
                return;
            }
        };
        let statuses = match parse_working_status(&payload.working_status) {
            Ok(statuses) => statuses,
            Err(e) => {
                warn!("{}: discarding working status: {}", device.name, e);
                return;
            }
        };
        let observations = correlate(&descriptors, &statuses);

        let Some(device_state) = self.store.device(&device.name) else {
            return;
        };
        let now = Local::now();
        let events = {
            let mut state = device_state.lock().await;
            observations
                .iter()
                .filter_map(|obs| {
                    let name = obs
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("channel {}", obs.chan_no));
                    engine::observe_channel(
                        &device.name,
                        &mut state,
                        ChannelKey::Digital(obs.chan_no),
                        &name,
                        obs.health(),
                        now,
                    )
                })
                .collect::<Vec<_>>()
        };
        for event in events {
            self.emit(event);
        }
    }

    /// Probe, parse and apply transitions for the analog protocol half.
    async fn analog_pipeline(&self, device: &DeviceConfig) {
        let payload = match self.client.fetch_analog(device).await {
            Ok(payload) => payload,
            Err(e) => {
                log_probe_failure(device, "analog", &e);
                return;
            }
        };

        let observations = match parse_analog_channels(&payload, &device.analog_channels) {
            Ok(observations) => observations,
            Err(e) => {
                warn!("{}: discarding analog channel list: {}", device.name, e);
                return;
            }
        };

        let Some(device_state) = self.store.device(&device.name) else {
            return;
        };
        let now = Local::now();
        let events = {
            let mut state = device_state.lock().await;
            observations
                .iter()
                .filter_map(|obs| {
                    let name = obs
                        .name
                        .clone()
                        .unwrap_or_else(|| format!("channel {}", obs.id));
                    engine::observe_channel(
                        &device.name,
                        &mut state,
                        ChannelKey::Analog(obs.id),
                        &name,
                        obs.health(),
                        now,
                    )
                })
                .collect::<Vec<_>>()
        };
        for event in events {
            self.emit(event);
        }
    }

    /// Hand an event to the notifier without ever blocking the cycle.
    fn emit(&self, event: Event) {
        if self.events.try_send(event).is_err() {
            warn!("Monitor: notifier backlog full, dropping event");
        }
    }
}

/// Map a connection probe result onto the reachability signal.
///
/// `None` means "no evidence either way": an auth failure is reported as a
/// configuration error each cycle but never starts, extends or ends an
/// outage.
fn classify_connection(result: &Result<(), ProbeError>) -> Option<bool> {
    match result {
        Ok(()) => Some(true),
        Err(e) if e.is_auth() => None,
        Err(_) => Some(false),
    }
}

/// Content-probe failures are logged per cycle; connection outage timing is
/// owned solely by the dedicated status probe.
fn log_probe_failure(device: &DeviceConfig, half: &str, error: &ProbeError) {
    if error.is_auth() {
        error!(
            "Authentication {} failed. Check your username and password.",
            device.name
        );
    } else {
        error!(
            "Failed to get {} {} camera status: {}",
            device.name, half, error
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_connection() {
        assert_eq!(classify_connection(&Ok(())), Some(true));
        assert_eq!(
            classify_connection(&Err(ProbeError::Transport("timeout".to_string()))),
            Some(false)
        );
        assert_eq!(
            classify_connection(&Err(ProbeError::Protocol(500))),
            Some(false)
        );
        // Auth failures produce no reachability evidence at all.
        assert_eq!(classify_connection(&Err(ProbeError::Auth(401))), None);
        assert_eq!(classify_connection(&Err(ProbeError::Auth(403))), None);
    }
}
