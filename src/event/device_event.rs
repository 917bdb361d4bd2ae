// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Events emitted by sync engines and the registry.

use crate::family::FieldGroup;
use crate::state::{Connectivity, Field, Source};

use super::DeviceKey;

/// An event describing something that happened to a synchronized device.
///
/// Events are published on the [`EventBus`](super::EventBus) so a binding
/// layer can react to state changes without polling snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceEvent {
    /// One or more state fields changed.
    StateChanged {
        /// The device whose state changed.
        key: DeviceKey,
        /// The fields that changed, in schema order.
        fields: Vec<Field>,
        /// The provenance of the change.
        source: Source,
    },

    /// The device's connectivity assessment changed.
    ConnectivityChanged {
        /// The device whose connectivity changed.
        key: DeviceKey,
        /// The new connectivity.
        connectivity: Connectivity,
    },

    /// A push cycle completed with every field-group accepted.
    PushCompleted {
        /// The device the cycle ran against.
        key: DeviceKey,
    },

    /// A push cycle stopped at a failing field-group.
    PushFailed {
        /// The device the cycle ran against.
        key: DeviceKey,
        /// The field-group that failed.
        group: FieldGroup,
        /// The remote status code, if the failure was envelope-level.
        code: Option<i64>,
    },

    /// An engine was registered for the device.
    EngineRegistered {
        /// The registered device.
        key: DeviceKey,
    },

    /// The device's engine was deregistered and shut down.
    EngineRemoved {
        /// The removed device.
        key: DeviceKey,
    },
}

impl DeviceEvent {
    /// Returns the device key the event concerns.
    #[must_use]
    pub fn device_key(&self) -> &DeviceKey {
        match self {
            Self::StateChanged { key, .. }
            | Self::ConnectivityChanged { key, .. }
            | Self::PushCompleted { key }
            | Self::PushFailed { key, .. }
            | Self::EngineRegistered { key }
            | Self::EngineRemoved { key } => key,
        }
    }
}
