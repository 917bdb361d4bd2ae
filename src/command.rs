// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Outbound command construction.
//!
//! Translates one field-group of a coalesced intent into either a remote
//! API command or a broadcast command frame. Pure construction only; the
//! push executor decides which channel carries the result.

use crate::channel::RemoteCommand;
use crate::family::{DeviceFamily, FieldGroup};
use crate::state::{Field, FieldValue, Intent};
use crate::types::RgbColor;

/// Broadcast command frame opcodes, following the model tag byte.
mod opcode {
    pub const POWER: u8 = 0x01;
    pub const LEVEL: u8 = 0x02;
    pub const COLOR: u8 = 0x03;
    pub const COLOR_TEMP: u8 = 0x04;
    pub const POSITION: u8 = 0x05;
}

/// Builds the remote API command for one field-group of an intent.
///
/// Returns `None` when the intent carries no value for the group's
/// fields (the group is then skipped, not pushed).
///
/// # Examples
///
/// ```
/// use homesync_lib::command::remote_command;
/// use homesync_lib::family::{DeviceFamily, FieldGroup};
/// use homesync_lib::state::{Field, FieldValue, Intent};
/// use homesync_lib::types::PowerState;
///
/// let intent = Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
/// let cmd = remote_command(DeviceFamily::Plug, FieldGroup::Power, &intent).unwrap();
/// assert_eq!(cmd.command, "turnOn");
/// ```
#[must_use]
pub fn remote_command(
    _family: DeviceFamily,
    group: FieldGroup,
    intent: &Intent,
) -> Option<RemoteCommand> {
    match group {
        FieldGroup::Power => match intent.desired_value(Field::Power)? {
            FieldValue::Power(state) if state.is_on() => Some(RemoteCommand::bare("turnOn")),
            FieldValue::Power(_) => Some(RemoteCommand::bare("turnOff")),
            _ => None,
        },
        FieldGroup::Level => match intent.desired_value(Field::Level)? {
            FieldValue::Percent(level) => Some(RemoteCommand::new(
                "setBrightness",
                level.value().to_string(),
            )),
            _ => None,
        },
        FieldGroup::Color => match intent.desired_value(Field::Color)? {
            FieldValue::Color(hsb) => Some(RemoteCommand::new(
                "setColor",
                RgbColor::from_hsb(hsb).to_triplet(),
            )),
            _ => None,
        },
        FieldGroup::ColorTemp => match intent.desired_value(Field::ColorTemp)? {
            FieldValue::ColorTemp(ct) => Some(RemoteCommand::new(
                "setColorTemperature",
                ct.to_kelvin().to_string(),
            )),
            _ => None,
        },
        FieldGroup::Position => match intent.desired_value(Field::Position)? {
            FieldValue::Percent(position) => Some(RemoteCommand::new(
                "setPosition",
                position.value().to_string(),
            )),
            _ => None,
        },
    }
}

/// Builds the broadcast command frame for one field-group of an intent.
///
/// The frame starts with the family's model tag and an opcode byte,
/// followed by the group's value bytes. Returns `None` when the intent
/// carries no value for the group.
#[must_use]
pub fn broadcast_frame(
    family: DeviceFamily,
    group: FieldGroup,
    intent: &Intent,
) -> Option<Vec<u8>> {
    let tag = family.model_tag();
    match group {
        FieldGroup::Power => match intent.desired_value(Field::Power)? {
            FieldValue::Power(state) => Some(vec![tag, opcode::POWER, u8::from(state.is_on())]),
            _ => None,
        },
        FieldGroup::Level => match intent.desired_value(Field::Level)? {
            FieldValue::Percent(level) => Some(vec![tag, opcode::LEVEL, level.value()]),
            _ => None,
        },
        FieldGroup::Color => match intent.desired_value(Field::Color)? {
            FieldValue::Color(hsb) => {
                let rgb = RgbColor::from_hsb(hsb);
                Some(vec![
                    tag,
                    opcode::COLOR,
                    rgb.red(),
                    rgb.green(),
                    rgb.blue(),
                ])
            }
            _ => None,
        },
        FieldGroup::ColorTemp => match intent.desired_value(Field::ColorTemp)? {
            FieldValue::ColorTemp(ct) => {
                let mireds = ct.value().to_le_bytes();
                Some(vec![tag, opcode::COLOR_TEMP, mireds[0], mireds[1]])
            }
            _ => None,
        },
        FieldGroup::Position => match intent.desired_value(Field::Position)? {
            FieldValue::Percent(position) => {
                Some(vec![tag, opcode::POSITION, position.value()])
            }
            _ => None,
        },
    }
}
