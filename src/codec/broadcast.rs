// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Broadcast advertisement frame decoding.
//!
//! Advertisement service data is a short binary frame: a one-byte model
//! tag followed by a family-specific layout. Numeric readings outside a
//! field's documented range are clamped rather than rejected, so one bad
//! byte never discards a whole frame.
//!
//! Frame layouts (byte offsets after the model tag):
//!
//! | Family  | Layout                                                   |
//! |---------|----------------------------------------------------------|
//! | Bulb    | power, level, red, green, blue, mired lo, mired hi       |
//! | Plug    | power                                                    |
//! | Curtain | position, battery                                        |
//! | Meter   | temperature whole (i8), tenths, humidity, battery        |
//! | Contact | contact, battery                                         |

use crate::error::DecodeError;
use crate::family::DeviceFamily;
use crate::state::{Field, FieldValue, StateUpdate};
use crate::types::{Celsius, ColorTemp, ContactState, Percent, PowerState, RgbColor};

/// Decodes one advertisement service-data frame for the given family.
///
/// The frame's model tag must match the family's: an unrecognized tag
/// yields [`DecodeError::UnknownModel`], a recognized tag belonging to a
/// different family yields [`DecodeError::UnexpectedFormat`].
///
/// # Errors
///
/// Returns `DecodeError` if the frame is empty, too short for the
/// family's layout, or tagged for the wrong model.
pub fn decode_frame(frame: &[u8], family: DeviceFamily) -> Result<StateUpdate, DecodeError> {
    let Some((&tag, data)) = frame.split_first() else {
        return Err(DecodeError::FrameTooShort {
            expected: 1,
            actual: 0,
        });
    };

    match DeviceFamily::from_model_tag(tag) {
        None => return Err(DecodeError::UnknownModel(tag)),
        Some(advertised) if advertised != family => {
            return Err(DecodeError::UnexpectedFormat(format!(
                "frame tagged {advertised}, expected {family}"
            )));
        }
        Some(_) => {}
    }

    let expected = body_len(family);
    if data.len() < expected {
        return Err(DecodeError::FrameTooShort {
            expected: expected + 1,
            actual: frame.len(),
        });
    }

    let update = match family {
        DeviceFamily::Bulb => {
            let rgb = RgbColor::new(data[2], data[3], data[4]);
            let mireds = u16::from_le_bytes([data[5], data[6]]);
            StateUpdate::new()
                .with_field(Field::Power, FieldValue::Power(PowerState::from(data[0] != 0)))
                .with_field(Field::Level, FieldValue::Percent(Percent::clamped(data[1])))
                .with_field(Field::Color, FieldValue::Color(rgb.to_hsb()))
                .with_field(
                    Field::ColorTemp,
                    FieldValue::ColorTemp(ColorTemp::clamped(mireds)),
                )
        }
        DeviceFamily::Plug => StateUpdate::new().with_field(
            Field::Power,
            FieldValue::Power(PowerState::from(data[0] != 0)),
        ),
        DeviceFamily::Curtain => StateUpdate::new()
            .with_field(
                Field::Position,
                FieldValue::Percent(Percent::clamped(data[0])),
            )
            .with_field(
                Field::Battery,
                FieldValue::Percent(Percent::clamped(data[1])),
            ),
        DeviceFamily::Meter => {
            #[allow(clippy::cast_possible_wrap)]
            let whole = data[0] as i8;
            StateUpdate::new()
                .with_field(
                    Field::Temperature,
                    FieldValue::Celsius(Celsius::from_parts(whole, data[1])),
                )
                .with_field(
                    Field::Humidity,
                    FieldValue::Percent(Percent::clamped(data[2])),
                )
                .with_field(
                    Field::Battery,
                    FieldValue::Percent(Percent::clamped(data[3])),
                )
        }
        DeviceFamily::Contact => {
            let contact = if data[0] == 0 {
                ContactState::Closed
            } else {
                ContactState::Open
            };
            StateUpdate::new()
                .with_field(Field::Contact, FieldValue::Contact(contact))
                .with_field(
                    Field::Battery,
                    FieldValue::Percent(Percent::clamped(data[1])),
                )
        }
    };

    Ok(update)
}

/// Body length (excluding the model tag) of a family's frame.
const fn body_len(family: DeviceFamily) -> usize {
    match family {
        DeviceFamily::Bulb => 7,
        DeviceFamily::Plug => 1,
        DeviceFamily::Curtain | DeviceFamily::Contact => 2,
        DeviceFamily::Meter => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_plug_frame() {
        let update = decode_frame(&[b'g', 1], DeviceFamily::Plug).unwrap();
        assert_eq!(
            update.fields()[&Field::Power].as_power(),
            Some(PowerState::On)
        );
    }

    #[test]
    fn decodes_meter_frame() {
        let update = decode_frame(&[b'T', 21, 4, 47, 90], DeviceFamily::Meter).unwrap();
        assert_eq!(
            update.fields()[&Field::Temperature],
            FieldValue::Celsius(Celsius::new(21.4))
        );
        assert_eq!(
            update.fields()[&Field::Humidity],
            FieldValue::Percent(Percent::new(47).unwrap())
        );
        assert_eq!(
            update.fields()[&Field::Battery],
            FieldValue::Percent(Percent::new(90).unwrap())
        );
    }

    #[test]
    fn decodes_negative_temperature() {
        // -5.5 degrees as two's-complement whole part
        #[allow(clippy::cast_sign_loss)]
        let whole = (-5i8) as u8;
        let update = decode_frame(&[b'T', whole, 5, 40, 80], DeviceFamily::Meter).unwrap();
        assert_eq!(
            update.fields()[&Field::Temperature],
            FieldValue::Celsius(Celsius::new(-5.5))
        );
    }

    #[test]
    fn clamps_out_of_range_humidity() {
        let update = decode_frame(&[b'T', 21, 0, 150, 90], DeviceFamily::Meter).unwrap();
        assert_eq!(
            update.fields()[&Field::Humidity],
            FieldValue::Percent(Percent::MAX)
        );
    }

    #[test]
    fn decodes_bulb_frame() {
        let mireds = 250u16.to_le_bytes();
        let frame = [b'u', 1, 80, 255, 0, 0, mireds[0], mireds[1]];
        let update = decode_frame(&frame, DeviceFamily::Bulb).unwrap();

        assert_eq!(
            update.fields()[&Field::Power].as_power(),
            Some(PowerState::On)
        );
        assert_eq!(
            update.fields()[&Field::Level],
            FieldValue::Percent(Percent::new(80).unwrap())
        );
        assert_eq!(
            update.fields()[&Field::ColorTemp],
            FieldValue::ColorTemp(ColorTemp::new(250).unwrap())
        );
    }

    #[test]
    fn clamps_bulb_mireds() {
        let mireds = 900u16.to_le_bytes();
        let frame = [b'u', 1, 80, 0, 0, 0, mireds[0], mireds[1]];
        let update = decode_frame(&frame, DeviceFamily::Bulb).unwrap();
        assert_eq!(
            update.fields()[&Field::ColorTemp],
            FieldValue::ColorTemp(ColorTemp::new(500).unwrap())
        );
    }

    #[test]
    fn decodes_contact_frame() {
        let update = decode_frame(&[b'd', 1, 77], DeviceFamily::Contact).unwrap();
        assert_eq!(
            update.fields()[&Field::Contact],
            FieldValue::Contact(ContactState::Open)
        );
    }

    #[test]
    fn unknown_model_tag_is_rejected() {
        let result = decode_frame(&[0x7F, 1], DeviceFamily::Plug);
        assert!(matches!(result, Err(DecodeError::UnknownModel(0x7F))));
    }

    #[test]
    fn mismatched_model_tag_is_rejected() {
        let result = decode_frame(&[b'T', 21, 4, 47, 90], DeviceFamily::Plug);
        assert!(matches!(result, Err(DecodeError::UnexpectedFormat(_))));
    }

    #[test]
    fn short_frame_is_rejected() {
        let result = decode_frame(&[b'T', 21], DeviceFamily::Meter);
        assert!(matches!(result, Err(DecodeError::FrameTooShort { .. })));

        let result = decode_frame(&[], DeviceFamily::Meter);
        assert!(matches!(result, Err(DecodeError::FrameTooShort { .. })));
    }
}
