// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON status payload decoding.
//!
//! Both the remote status endpoint and push notifications deliver the
//! same field shape; neither guarantees which fields are present, so
//! every field is optional and an update carries only what the payload
//! held.

use serde::Deserialize;

use crate::error::DecodeError;
use crate::family::DeviceFamily;
use crate::state::{Field, FieldValue, StateUpdate};
use crate::types::{Celsius, ColorTemp, ContactState, Percent, PowerState, RgbColor};

/// A JSON status payload from the remote API or a push notification.
///
/// Not all fields are present in every payload. Numeric readings are
/// clamped to their documented ranges when converted to typed values.
///
/// # Examples
///
/// ```
/// use homesync_lib::codec::RemoteStatus;
///
/// let json = r#"{"power":"on","brightness":75,"colorTemperature":4000}"#;
/// let status: RemoteStatus = serde_json::from_str(json).unwrap();
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoteStatus {
    /// Power state as a string (`"on"` / `"off"`).
    #[serde(default)]
    power: Option<String>,

    /// Brightness level (0-100).
    #[serde(default)]
    brightness: Option<i64>,

    /// Color as an `"r:g:b"` triplet.
    #[serde(default)]
    color: Option<String>,

    /// Color temperature in Kelvin.
    #[serde(rename = "colorTemperature", default)]
    color_temperature: Option<i64>,

    /// Ambient temperature in degrees Celsius.
    #[serde(default)]
    temperature: Option<f64>,

    /// Relative humidity (0-100).
    #[serde(default)]
    humidity: Option<i64>,

    /// Battery charge (0-100).
    #[serde(default)]
    battery: Option<i64>,

    /// Contact sensor state (`"open"` / `"close"` / `"timeOutNotClose"`).
    #[serde(rename = "openState", default)]
    open_state: Option<String>,

    /// Curtain position (0-100).
    #[serde(rename = "slidePosition", default)]
    slide_position: Option<i64>,
}

impl RemoteStatus {
    /// Converts the payload into a state update for the given family.
    ///
    /// Only fields belonging to the family's schema are carried over;
    /// anything else in the payload is ignored. String fields with
    /// unparseable values are skipped rather than failing the update.
    #[must_use]
    pub fn to_update(&self, family: DeviceFamily) -> StateUpdate {
        let mut update = StateUpdate::new();

        if family.carries(Field::Power)
            && let Some(power) = self
                .power
                .as_deref()
                .and_then(|s| s.parse::<PowerState>().ok())
        {
            update.insert(Field::Power, FieldValue::Power(power));
        }
        if family.carries(Field::Level)
            && let Some(brightness) = self.brightness
        {
            update.insert(Field::Level, FieldValue::Percent(clamp_percent(brightness)));
        }
        if family.carries(Field::Color)
            && let Some(color) = self
                .color
                .as_deref()
                .and_then(|s| RgbColor::from_triplet(s).ok())
        {
            update.insert(Field::Color, FieldValue::Color(color.to_hsb()));
        }
        if family.carries(Field::ColorTemp)
            && let Some(kelvin) = self.color_temperature
        {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let kelvin = kelvin.clamp(0, i64::from(u16::MAX)) as u16;
            update.insert(
                Field::ColorTemp,
                FieldValue::ColorTemp(ColorTemp::from_kelvin(kelvin)),
            );
        }
        if family.carries(Field::Temperature)
            && let Some(temperature) = self.temperature
        {
            #[allow(clippy::cast_possible_truncation)]
            let temperature = temperature as f32;
            update.insert(Field::Temperature, FieldValue::Celsius(Celsius::new(temperature)));
        }
        if family.carries(Field::Humidity)
            && let Some(humidity) = self.humidity
        {
            update.insert(Field::Humidity, FieldValue::Percent(clamp_percent(humidity)));
        }
        if family.carries(Field::Battery)
            && let Some(battery) = self.battery
        {
            update.insert(Field::Battery, FieldValue::Percent(clamp_percent(battery)));
        }
        if family.carries(Field::Contact)
            && let Some(contact) = self
                .open_state
                .as_deref()
                .and_then(|s| s.parse::<ContactState>().ok())
        {
            update.insert(Field::Contact, FieldValue::Contact(contact));
        }
        if family.carries(Field::Position)
            && let Some(position) = self.slide_position
        {
            update.insert(Field::Position, FieldValue::Percent(clamp_percent(position)));
        }

        update
    }
}

/// Decodes a JSON status payload into a state update.
///
/// # Errors
///
/// Returns `DecodeError::Json` if the value is not an object of the
/// expected shape. Missing fields are fine; the update simply carries
/// fewer entries.
pub fn decode_json(
    value: &serde_json::Value,
    family: DeviceFamily,
) -> Result<StateUpdate, DecodeError> {
    let status: RemoteStatus = serde_json::from_value(value.clone())?;
    Ok(status.to_update(family))
}

fn clamp_percent(value: i64) -> Percent {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let value = value.clamp(0, 100) as u8;
    Percent::clamped(value)
}
