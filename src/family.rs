// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device family tables.
//!
//! A [`DeviceFamily`] fixes everything that varies between device types:
//! which state fields exist, how outbound pushes are grouped and ordered,
//! the broadcast model tag, and the state a device is assumed to be in
//! when it is offline. Device-specific behavior is data in these tables,
//! not separate control flow per device type.

use std::fmt;

use crate::state::{Connectivity, Field, FieldValue, StateUpdate};
use crate::types::{ContactState, Percent, PowerState};

/// The supported device families.
///
/// # Examples
///
/// ```
/// use homesync_lib::family::DeviceFamily;
/// use homesync_lib::state::Field;
///
/// let family = DeviceFamily::Bulb;
/// assert!(family.carries(Field::Level));
/// assert!(!family.carries(Field::Humidity));
/// ```
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
#[serde(rename_all = "lowercase")]
pub enum DeviceFamily {
    /// A color light bulb.
    Bulb,
    /// A switched plug.
    Plug,
    /// A motorized curtain.
    Curtain,
    /// A temperature/humidity meter.
    Meter,
    /// A door/window contact sensor.
    Contact,
}

impl DeviceFamily {
    /// Returns the state fields this family carries.
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        match self {
            Self::Bulb => &[Field::Power, Field::Level, Field::Color, Field::ColorTemp],
            Self::Plug => &[Field::Power],
            Self::Curtain => &[Field::Position, Field::Battery],
            Self::Meter => &[Field::Temperature, Field::Humidity, Field::Battery],
            Self::Contact => &[Field::Contact, Field::Battery],
        }
    }

    /// Returns `true` if the family's schema includes `field`.
    #[must_use]
    pub fn carries(&self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    /// Returns the outbound field-groups in push order.
    ///
    /// The order is load-bearing: a device that is off rejects level and
    /// color commands, so power is always pushed first.
    #[must_use]
    pub const fn push_order(&self) -> &'static [FieldGroup] {
        match self {
            Self::Bulb => &[
                FieldGroup::Power,
                FieldGroup::Level,
                FieldGroup::ColorTemp,
                FieldGroup::Color,
            ],
            Self::Plug => &[FieldGroup::Power],
            Self::Curtain => &[FieldGroup::Position],
            // Sensor-only families accept no commands.
            Self::Meter | Self::Contact => &[],
        }
    }

    /// Returns the one-byte model tag carried in broadcast advertisements.
    #[must_use]
    pub const fn model_tag(&self) -> u8 {
        match self {
            Self::Bulb => b'u',
            Self::Plug => b'g',
            Self::Curtain => b'c',
            Self::Meter => b'T',
            Self::Contact => b'd',
        }
    }

    /// Resolves a broadcast model tag to a family.
    #[must_use]
    pub const fn from_model_tag(tag: u8) -> Option<Self> {
        match tag {
            b'u' => Some(Self::Bulb),
            b'g' => Some(Self::Plug),
            b'c' => Some(Self::Curtain),
            b'T' => Some(Self::Meter),
            b'd' => Some(Self::Contact),
            _ => None,
        }
    }

    /// Returns the documented offline-default state for this family.
    ///
    /// Applied when no channel is usable or the remote reports the device
    /// offline, so the binding layer never displays silently-frozen state.
    /// The snapshot is an approximation, not a real reading: a light is
    /// assumed off, a curtain closed, a contact sensor closed. Sensor
    /// readings (temperature, humidity, battery) have no meaningful
    /// default and are left at their last known values.
    #[must_use]
    pub fn offline_defaults(&self) -> StateUpdate {
        let update = StateUpdate::new().with_connectivity(Connectivity::Unreachable);
        match self {
            Self::Bulb => update
                .with_field(Field::Power, FieldValue::Power(PowerState::Off))
                .with_field(Field::Level, FieldValue::Percent(Percent::MIN)),
            Self::Plug => update.with_field(Field::Power, FieldValue::Power(PowerState::Off)),
            Self::Curtain => update.with_field(Field::Position, FieldValue::Percent(Percent::MIN)),
            Self::Contact => {
                update.with_field(Field::Contact, FieldValue::Contact(ContactState::Closed))
            }
            Self::Meter => update,
        }
    }

    /// Returns the lowercase family name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Bulb => "bulb",
            Self::Plug => "plug",
            Self::Curtain => "curtain",
            Self::Meter => "meter",
            Self::Contact => "contact",
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A group of related fields pushed together as one outbound command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldGroup {
    /// On/off command.
    Power,
    /// Brightness command.
    Level,
    /// Color command (three channels pushed as one command).
    Color,
    /// Color temperature command.
    ColorTemp,
    /// Curtain position command.
    Position,
}

impl FieldGroup {
    /// Returns the fields belonging to this group.
    #[must_use]
    pub const fn fields(&self) -> &'static [Field] {
        match self {
            Self::Power => &[Field::Power],
            Self::Level => &[Field::Level],
            Self::Color => &[Field::Color],
            Self::ColorTemp => &[Field::ColorTemp],
            Self::Position => &[Field::Position],
        }
    }

    /// Returns `true` if the remote device must be on for this group's
    /// command to be accepted.
    #[must_use]
    pub const fn requires_power_on(&self) -> bool {
        match self {
            Self::Level | Self::Color | Self::ColorTemp => true,
            Self::Power | Self::Position => false,
        }
    }

    /// Returns the lowercase group name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Power => "power",
            Self::Level => "level",
            Self::Color => "color",
            Self::ColorTemp => "color_temp",
            Self::Position => "position",
        }
    }
}

impl fmt::Display for FieldGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schemas_cover_expected_fields() {
        assert!(DeviceFamily::Bulb.carries(Field::Color));
        assert!(DeviceFamily::Meter.carries(Field::Humidity));
        assert!(!DeviceFamily::Meter.carries(Field::Power));
        assert!(DeviceFamily::Contact.carries(Field::Battery));
    }

    #[test]
    fn power_pushes_before_level_and_color() {
        let order = DeviceFamily::Bulb.push_order();
        let power = order.iter().position(|g| *g == FieldGroup::Power).unwrap();
        let level = order.iter().position(|g| *g == FieldGroup::Level).unwrap();
        let color = order.iter().position(|g| *g == FieldGroup::Color).unwrap();
        assert!(power < level);
        assert!(power < color);
    }

    #[test]
    fn sensor_families_accept_no_commands() {
        assert!(DeviceFamily::Meter.push_order().is_empty());
        assert!(DeviceFamily::Contact.push_order().is_empty());
    }

    #[test]
    fn model_tags_round_trip() {
        for family in [
            DeviceFamily::Bulb,
            DeviceFamily::Plug,
            DeviceFamily::Curtain,
            DeviceFamily::Meter,
            DeviceFamily::Contact,
        ] {
            assert_eq!(DeviceFamily::from_model_tag(family.model_tag()), Some(family));
        }
        assert_eq!(DeviceFamily::from_model_tag(0x00), None);
    }

    #[test]
    fn offline_defaults_per_family() {
        let bulb = DeviceFamily::Bulb.offline_defaults();
        assert_eq!(bulb.connectivity(), Some(Connectivity::Unreachable));
        assert_eq!(
            bulb.fields()[&Field::Power].as_power(),
            Some(PowerState::Off)
        );

        let contact = DeviceFamily::Contact.offline_defaults();
        assert_eq!(
            contact.fields()[&Field::Contact],
            FieldValue::Contact(ContactState::Closed)
        );

        // Meter readings keep their last known values
        let meter = DeviceFamily::Meter.offline_defaults();
        assert!(meter.fields().is_empty());
        assert_eq!(meter.connectivity(), Some(Connectivity::Unreachable));
    }

    #[test]
    fn groups_requiring_power() {
        assert!(FieldGroup::Level.requires_power_on());
        assert!(FieldGroup::Color.requires_power_on());
        assert!(!FieldGroup::Power.requires_power_on());
        assert!(!FieldGroup::Position.requires_power_on());
    }
}
