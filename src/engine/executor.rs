// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Push cycle execution.
//!
//! Converts one coalesced intent into outbound commands, one per
//! field-group, in the family's fixed push order. Groups that require
//! the device to be on are skipped entirely while it is off. The first
//! field-group that fails its retry budget stops the cycle: its fields
//! are marked with an error source (values preserved) and the channel
//! failure is recorded for the selector.

use chrono::Utc;

use crate::channel::status_code::{self, CodeClass};
use crate::channel::{Channel, RemoteCommand};
use crate::command;
use crate::error::ChannelError;
use crate::event::DeviceEvent;
use crate::family::FieldGroup;
use crate::retry::{AttemptError, check_envelope};
use crate::select::Operation;
use crate::state::{Intent, StateUpdate};
use crate::types::PowerState;

use super::{BroadcastTransport, EngineInner};

/// Outcome of one outbound command attempt for a field-group.
///
/// Not persisted; drives retry/fallback decisions and failure records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushResult {
    /// The remote accepted the command.
    pub accepted: bool,
    /// The envelope status code (or the local success code for
    /// broadcast pushes, which have no envelope).
    pub remote_code: i64,
    /// Description of the failure, when not accepted.
    pub error_kind: Option<String>,
}

impl PushResult {
    pub(crate) fn accepted(remote_code: i64) -> Self {
        Self {
            accepted: true,
            remote_code,
            error_kind: None,
        }
    }

    pub(crate) fn failed(error: &ChannelError) -> Self {
        let remote_code = match error {
            ChannelError::Remote { code, .. } => *code,
            _ => 0,
        };
        Self {
            accepted: false,
            remote_code,
            error_kind: Some(error.to_string()),
        }
    }
}

/// Runs one push cycle for a coalesced intent.
///
/// Returns `true` when every applicable field-group was accepted.
pub(crate) async fn run_cycle<T: BroadcastTransport>(
    inner: &EngineInner<T>,
    intent: Intent,
) -> bool {
    let route = inner.selector.lock().choose(Operation::Push);
    let Some(route) = route else {
        tracing::warn!(device = %inner.key, "no usable push channel, applying offline defaults");
        inner.apply_offline_defaults();
        return false;
    };

    // A device that is off rejects level/color commands. The intent's own
    // power request wins over the last known state; unknown state is
    // treated as on so commands are not silently withheld.
    let mut powered_on = match intent.desired_value(crate::state::Field::Power) {
        Some(value) => value.as_power().is_some_and(|p| p.is_on()),
        None => inner.store.lock().snapshot().power() != Some(PowerState::Off),
    };

    for group in inner.family.push_order() {
        if !group_requested(*group, &intent) {
            continue;
        }
        if group.requires_power_on() && !powered_on {
            tracing::debug!(device = %inner.key, group = %group, "skipping group while device is off");
            continue;
        }

        let result = push_group(inner, route, *group, &intent).await;
        if result.accepted {
            inner.selector.lock().record_success(route);
            apply_accepted(inner, *group, &intent);
            if *group == FieldGroup::Power {
                powered_on = intent
                    .desired_value(crate::state::Field::Power)
                    .and_then(|v| v.as_power())
                    .is_some_and(|p| p.is_on());
            }
        } else {
            tracing::warn!(
                device = %inner.key,
                group = %group,
                code = result.remote_code,
                error = result.error_kind.as_deref().unwrap_or("unknown"),
                "field-group push failed, stopping cycle"
            );
            inner.selector.lock().record_failure(route);
            inner.store.lock().mark_error(group.fields());
            if matches!(status_code::classify(result.remote_code), CodeClass::Offline) {
                inner.apply_offline_defaults();
            }
            inner.events.publish(DeviceEvent::PushFailed {
                key: inner.key.clone(),
                group: *group,
                code: (result.remote_code != 0).then_some(result.remote_code),
            });
            return false;
        }
    }

    true
}

/// Returns `true` if the intent carries a value for any of the group's
/// fields.
fn group_requested(group: FieldGroup, intent: &Intent) -> bool {
    group
        .fields()
        .iter()
        .any(|field| intent.desired_value(*field).is_some())
}

async fn push_group<T: BroadcastTransport>(
    inner: &EngineInner<T>,
    route: Channel,
    group: FieldGroup,
    intent: &Intent,
) -> PushResult {
    match route {
        Channel::Poll => {
            let Some(api) = inner.api.as_ref() else {
                return PushResult::failed(&ChannelError::Unavailable(
                    "remote API not configured".to_string(),
                ));
            };
            let Some(command) = command::remote_command(inner.family, group, intent) else {
                return PushResult::failed(&ChannelError::Unavailable(format!(
                    "no remote command for group {group}"
                )));
            };
            push_remote(inner, api, &command).await
        }
        Channel::Broadcast => {
            let Some(scanner) = inner.broadcast.as_ref() else {
                return PushResult::failed(&ChannelError::Unavailable(
                    "broadcast transport not configured".to_string(),
                ));
            };
            let Some(frame) = command::broadcast_frame(inner.family, group, intent) else {
                return PushResult::failed(&ChannelError::Unavailable(format!(
                    "no broadcast command for group {group}"
                )));
            };
            let transport = scanner.transport();
            let outcome = inner
                .retry
                .run(|_attempt| async {
                    transport
                        .send_frame(&inner.key, &frame)
                        .await
                        .map_err(AttemptError::from_channel)
                })
                .await;
            match outcome {
                Ok(()) => PushResult::accepted(status_code::SUCCESS),
                Err(error) => PushResult::failed(&error),
            }
        }
        // The push-notification channel is inbound-only; the selector
        // never chooses it for outbound work.
        Channel::Push => PushResult::failed(&ChannelError::Unavailable(
            "push channel cannot carry commands".to_string(),
        )),
    }
}

async fn push_remote<T: BroadcastTransport>(
    inner: &EngineInner<T>,
    api: &crate::channel::ApiClient,
    command: &RemoteCommand,
) -> PushResult {
    let outcome = inner
        .retry
        .run(|_attempt| async {
            match api.send_command(&inner.key, command).await {
                Ok(envelope) => check_envelope(envelope),
                Err(error) => Err(AttemptError::from_channel(error)),
            }
        })
        .await;
    match outcome {
        Ok(envelope) => PushResult::accepted(envelope.status_code),
        Err(error) => PushResult::failed(&error),
    }
}

/// Applies the accepted group's desired values optimistically, sourced
/// as a command write; the confirmatory refresh reconciles any
/// server-side adjustments afterwards.
fn apply_accepted<T: BroadcastTransport>(
    inner: &EngineInner<T>,
    group: FieldGroup,
    intent: &Intent,
) {
    let mut update = StateUpdate::new();
    for field in group.fields() {
        if let Some(value) = intent.desired_value(*field) {
            update.insert(*field, value);
        }
    }
    if update.is_empty() {
        return;
    }

    let outcome = {
        let mut store = inner.store.lock();
        store.apply(&update, crate::state::Source::Command, Utc::now())
    };
    match outcome {
        Ok(outcome) => inner.publish_apply(&outcome, crate::state::Source::Command),
        Err(error) => {
            // The intent was schema-validated at enqueue; reaching this
            // would mean the family tables disagree with themselves.
            tracing::error!(device = %inner.key, %error, "optimistic apply rejected");
        }
    }
}
