//! Transition engine.
//!
//! Pure state-machine functions: given the stored previous state and one new
//! observation they decide the transition and produce zero or one [`Event`].
//! All timestamps are passed in by the caller so cycles are replayable in
//! tests.
//!
//! Transition table per entity:
//!
//! | Previous | Observation | State change       | Event      |
//! |----------|-------------|--------------------|------------|
//! | healthy  | bad         | start = now        | BecameBad  |
//! | degraded | bad         | none (reason only) | StillBad   |
//! | degraded | good        | start cleared      | Recovered  |
//! | healthy  | good        | none               | none       |
//! | absent   | bad         | created degraded   | BecameBad  |
//! | absent   | good        | created healthy    | none       |
//!
//! Authentication failures never reach the engine; they are logged by the
//! pipeline each cycle and leave the outage timer untouched.

use chrono::{DateTime, Local};
use isapi_protocol::ChannelHealth;

use crate::event::{Entity, Event, Transition};
use crate::state::{ChannelKey, ChannelState, DeviceState};

/// Apply a device-reachability observation.
pub fn observe_connection(
    device: &str,
    state: &mut DeviceState,
    reachable: bool,
    now: DateTime<Local>,
) -> Option<Event> {
    let connection = &mut state.connection;

    match (connection.down_since, reachable) {
        (None, true) => None,
        (None, false) => {
            connection.down_since = Some(now);
            Some(Event {
                device: device.to_string(),
                entity: Entity::Connection,
                transition: Transition::BecameBad,
                reason: None,
                at: now,
                since: now,
                duration: None,
            })
        }
        (Some(since), false) => Some(Event {
            device: device.to_string(),
            entity: Entity::Connection,
            transition: Transition::StillBad,
            reason: None,
            at: now,
            since,
            duration: Some(now - since),
        }),
        (Some(since), true) => {
            connection.down_since = None;
            Some(Event {
                device: device.to_string(),
                entity: Entity::Connection,
                transition: Transition::Recovered,
                reason: None,
                at: now,
                since,
                duration: Some(now - since),
            })
        }
    }
}

/// Apply one channel observation, creating the channel entry on first sight.
pub fn observe_channel(
    device: &str,
    state: &mut DeviceState,
    key: ChannelKey,
    name: &str,
    health: ChannelHealth,
    now: DateTime<Local>,
) -> Option<Event> {
    let channel = state
        .channels
        .entry(key)
        .or_insert_with(|| ChannelState::healthy(name));
    // Keep the label current; the DVR operator may rename a camera mid-run.
    channel.name = name.to_string();

    match (channel.down_since, health) {
        (None, ChannelHealth::Good) => None,
        (None, ChannelHealth::Bad(reason)) => {
            channel.down_since = Some(now);
            channel.reason = Some(reason);
            Some(event(device, key, name, Transition::BecameBad, Some(reason), now, now, None))
        }
        (Some(since), ChannelHealth::Bad(reason)) => {
            // A reason change while degraded does not restart the outage;
            // only the latest reason is reported.
            channel.reason = Some(reason);
            Some(event(
                device,
                key,
                name,
                Transition::StillBad,
                Some(reason),
                now,
                since,
                Some(now - since),
            ))
        }
        (Some(since), ChannelHealth::Good) => {
            let reason = channel.reason.take();
            channel.down_since = None;
            Some(event(
                device,
                key,
                name,
                Transition::Recovered,
                reason,
                now,
                since,
                Some(now - since),
            ))
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn event(
    device: &str,
    key: ChannelKey,
    name: &str,
    transition: Transition,
    reason: Option<isapi_protocol::DegradeReason>,
    at: DateTime<Local>,
    since: DateTime<Local>,
    duration: Option<chrono::Duration>,
) -> Event {
    Event {
        device: device.to_string(),
        entity: Entity::Channel {
            key,
            name: name.to_string(),
        },
        transition,
        reason,
        at,
        since,
        duration,
    }
}
