// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Temperature reading type.

use std::fmt;

/// A temperature reading in degrees Celsius.
///
/// Readings are clamped to the documented sensor range of -20.0 to 80.0 °C.
/// Out-of-range raw values from a payload are clamped rather than rejected,
/// so a single bad reading never discards an otherwise valid update.
///
/// # Examples
///
/// ```
/// use homesync_lib::types::Celsius;
///
/// let t = Celsius::new(21.4);
/// assert_eq!(t.value(), 21.4);
///
/// // Out-of-range readings clamp to the sensor range
/// assert_eq!(Celsius::new(120.0).value(), 80.0);
/// assert_eq!(Celsius::new(-40.0).value(), -20.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct Celsius(f32);

impl Celsius {
    /// Minimum reportable temperature.
    pub const MIN: f32 = -20.0;

    /// Maximum reportable temperature.
    pub const MAX: f32 = 80.0;

    /// Creates a temperature reading, clamping to the sensor range.
    #[must_use]
    pub fn new(value: f32) -> Self {
        Self(value.clamp(Self::MIN, Self::MAX))
    }

    /// Creates a reading from an integer part and tenths, as carried in
    /// broadcast frames.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::types::Celsius;
    ///
    /// let t = Celsius::from_parts(21, 4);
    /// assert_eq!(t.value(), 21.4);
    ///
    /// let below = Celsius::from_parts(-5, 5);
    /// assert_eq!(below.value(), -5.5);
    /// ```
    #[must_use]
    pub fn from_parts(whole: i8, tenths: u8) -> Self {
        let magnitude = f32::from(whole.unsigned_abs()) + f32::from(tenths.min(9)) / 10.0;
        let value = if whole < 0 { -magnitude } else { magnitude };
        Self::new(value)
    }

    /// Returns the temperature in degrees Celsius.
    #[must_use]
    pub const fn value(&self) -> f32 {
        self.0
    }
}

impl fmt::Display for Celsius {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.1}\u{b0}C", self.0)
    }
}
