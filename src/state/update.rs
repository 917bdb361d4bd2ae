// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State fields, typed field values and partial state updates.
//!
//! A [`StateUpdate`] is the unit every inbound channel produces after
//! decoding: a set of typed field values, possibly accompanied by a
//! connectivity assessment. It carries only the fields present in the
//! payload; absent fields are left untouched when the update is applied.

use std::collections::BTreeMap;
use std::fmt;

use crate::types::{Celsius, ColorTemp, ContactState, HsbColor, Percent, PowerState};

/// A state field of a synchronized device.
///
/// The set of fields a given device carries is fixed by its
/// [`DeviceFamily`](crate::family::DeviceFamily) schema.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// On/off state.
    Power,
    /// Brightness level.
    Level,
    /// HSB color.
    Color,
    /// White color temperature.
    ColorTemp,
    /// Ambient temperature reading.
    Temperature,
    /// Relative humidity reading.
    Humidity,
    /// Battery charge.
    Battery,
    /// Door/window contact state.
    Contact,
    /// Curtain position (0 = closed, 100 = open).
    Position,
}

impl Field {
    /// Returns the value kind this field admits.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Power => ValueKind::Power,
            Self::Level | Self::Humidity | Self::Battery | Self::Position => ValueKind::Percent,
            Self::Color => ValueKind::Color,
            Self::ColorTemp => ValueKind::ColorTemp,
            Self::Temperature => ValueKind::Celsius,
            Self::Contact => ValueKind::Contact,
        }
    }

    /// Returns the snake_case name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Level => "level",
            Self::Color => "color",
            Self::ColorTemp => "color_temp",
            Self::Temperature => "temperature",
            Self::Humidity => "humidity",
            Self::Battery => "battery",
            Self::Contact => "contact",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The kind of value a field admits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// An on/off state.
    Power,
    /// A 0-100 percentage.
    Percent,
    /// An HSB color.
    Color,
    /// A mired color temperature.
    ColorTemp,
    /// A temperature in degrees Celsius.
    Celsius,
    /// An open/closed contact state.
    Contact,
}

/// A typed field value.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// An on/off state.
    Power(PowerState),
    /// A 0-100 percentage.
    Percent(Percent),
    /// An HSB color.
    Color(HsbColor),
    /// A mired color temperature.
    ColorTemp(ColorTemp),
    /// A temperature in degrees Celsius.
    Celsius(Celsius),
    /// An open/closed contact state.
    Contact(ContactState),
}

impl FieldValue {
    /// Returns the kind of this value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        match self {
            Self::Power(_) => ValueKind::Power,
            Self::Percent(_) => ValueKind::Percent,
            Self::Color(_) => ValueKind::Color,
            Self::ColorTemp(_) => ValueKind::ColorTemp,
            Self::Celsius(_) => ValueKind::Celsius,
            Self::Contact(_) => ValueKind::Contact,
        }
    }

    /// Returns the contained power state, if this is a power value.
    #[must_use]
    pub const fn as_power(&self) -> Option<PowerState> {
        match self {
            Self::Power(state) => Some(*state),
            _ => None,
        }
    }

    /// Returns the contained percentage, if this is a percent value.
    #[must_use]
    pub const fn as_percent(&self) -> Option<Percent> {
        match self {
            Self::Percent(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Power(v) => write!(f, "{v}"),
            Self::Percent(v) => write!(f, "{v}"),
            Self::Color(v) => write!(f, "{v}"),
            Self::ColorTemp(v) => write!(f, "{v}"),
            Self::Celsius(v) => write!(f, "{v}"),
            Self::Contact(v) => write!(f, "{v}"),
        }
    }
}

/// Provenance of a state field: which source last set it.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// Set from a broadcast advertisement.
    Broadcast,
    /// Set from a remote-API poll response.
    Poll,
    /// Set from an inbound push notification.
    Push,
    /// Set optimistically after an accepted outbound command.
    Command,
    /// The last outbound command for this field failed; the value is the
    /// last known good one.
    Error,
}

impl Source {
    /// Returns the snake_case name of the source.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Poll => "poll",
            Self::Push => "push",
            Self::Command => "command",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Connectivity assessment of a device.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Connectivity {
    /// The device answered on some channel recently.
    Reachable,
    /// The device failed to answer on the channels that were tried.
    Unreachable,
    /// No channel has been tried yet.
    #[default]
    Unknown,
}

/// A partial device state produced by decoding one payload.
///
/// # Examples
///
/// ```
/// use homesync_lib::state::{Field, FieldValue, StateUpdate};
/// use homesync_lib::types::PowerState;
///
/// let update = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
/// assert_eq!(update.fields().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StateUpdate {
    fields: BTreeMap<Field, FieldValue>,
    connectivity: Option<Connectivity>,
}

impl StateUpdate {
    /// Creates an empty update.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field value to the update, replacing any previous value for
    /// the same field.
    #[must_use]
    pub fn with_field(mut self, field: Field, value: FieldValue) -> Self {
        self.fields.insert(field, value);
        self
    }

    /// Sets the connectivity assessment carried by this update.
    #[must_use]
    pub fn with_connectivity(mut self, connectivity: Connectivity) -> Self {
        self.connectivity = Some(connectivity);
        self
    }

    /// Inserts a field value.
    pub fn insert(&mut self, field: Field, value: FieldValue) {
        self.fields.insert(field, value);
    }

    /// Returns the fields carried by this update.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<Field, FieldValue> {
        &self.fields
    }

    /// Returns the connectivity assessment, if any.
    #[must_use]
    pub fn connectivity(&self) -> Option<Connectivity> {
        self.connectivity
    }

    /// Returns `true` if the update carries neither fields nor a
    /// connectivity assessment.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.connectivity.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kinds_match_value_kinds() {
        assert_eq!(Field::Power.kind(), ValueKind::Power);
        assert_eq!(Field::Level.kind(), ValueKind::Percent);
        assert_eq!(Field::Battery.kind(), ValueKind::Percent);
        assert_eq!(Field::Temperature.kind(), ValueKind::Celsius);
        assert_eq!(Field::Contact.kind(), ValueKind::Contact);
    }

    #[test]
    fn field_value_kind() {
        let value = FieldValue::Power(PowerState::On);
        assert_eq!(value.kind(), ValueKind::Power);
        assert_eq!(value.as_power(), Some(PowerState::On));
        assert!(value.as_percent().is_none());
    }

    #[test]
    fn update_builder() {
        let update = StateUpdate::new()
            .with_field(Field::Power, FieldValue::Power(PowerState::On))
            .with_field(Field::Level, FieldValue::Percent(Percent::new(80).unwrap()))
            .with_connectivity(Connectivity::Reachable);

        assert_eq!(update.fields().len(), 2);
        assert_eq!(update.connectivity(), Some(Connectivity::Reachable));
        assert!(!update.is_empty());
    }

    #[test]
    fn empty_update() {
        assert!(StateUpdate::new().is_empty());
    }

    #[test]
    fn last_insert_wins_per_field() {
        let update = StateUpdate::new()
            .with_field(Field::Power, FieldValue::Power(PowerState::On))
            .with_field(Field::Power, FieldValue::Power(PowerState::Off));

        assert_eq!(
            update.fields()[&Field::Power].as_power(),
            Some(PowerState::Off)
        );
    }
}
