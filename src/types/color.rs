// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color types for light control.
//!
//! This module provides types for color temperature (CCT) and HSB color
//! control on light accessories.

use std::fmt;

use crate::error::ValueError;

/// Color temperature in mireds (153-500).
///
/// Broadcast frames carry color temperature in mireds, where lower values
/// are cooler (bluer) and higher values are warmer (more orange/yellow).
/// The remote API works in Kelvin; the conversions below are inverses of
/// each other within one unit of rounding.
///
/// - 153 (6500K) - Cool daylight
/// - 250 (4000K) - Neutral white
/// - 500 (2000K) - Warm candlelight
///
/// # Examples
///
/// ```
/// use homesync_lib::types::ColorTemp;
///
/// // Create a neutral white color temperature
/// let ct = ColorTemp::new(250).unwrap();
/// assert_eq!(ct.value(), 250);
///
/// // Use predefined values
/// let cool = ColorTemp::COOL;
/// let warm = ColorTemp::WARM;
/// ```
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
pub struct ColorTemp(u16);

impl ColorTemp {
    /// Minimum color temperature (coolest, ~6500K).
    pub const MIN: u16 = 153;

    /// Maximum color temperature (warmest, ~2000K).
    pub const MAX: u16 = 500;

    /// Cool daylight (~6500K).
    pub const COOL: Self = Self(153);

    /// Neutral white (~4000K).
    pub const NEUTRAL: Self = Self(250);

    /// Warm white (~2700K).
    pub const WARM: Self = Self(370);

    /// Candlelight (~2000K).
    pub const CANDLE: Self = Self(500);

    /// Creates a new color temperature value.
    ///
    /// # Arguments
    ///
    /// * `value` - The color temperature in mireds (153-500)
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [153, 500].
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Creates a color temperature, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u16) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the color temperature value in mireds.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the color temperature in Kelvin.
    ///
    /// Rounds half away from zero (the rounding mode of [`f64::round`]),
    /// so converting back with [`ColorTemp::from_kelvin`] lands within one
    /// mired of the original value.
    #[must_use]
    pub fn to_kelvin(&self) -> u16 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let kelvin = (1_000_000.0 / f64::from(self.0)).round() as u16;
        kelvin
    }

    /// Creates a color temperature from a Kelvin value.
    ///
    /// The resulting mired value is rounded half away from zero and clamped
    /// to the valid range, so any Kelvin input yields a usable value.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::types::ColorTemp;
    ///
    /// let ct = ColorTemp::from_kelvin(4000);
    /// assert_eq!(ct.value(), 250);
    ///
    /// // Out-of-range Kelvin clamps to the mired bounds
    /// assert_eq!(ColorTemp::from_kelvin(10_000).value(), 153);
    /// ```
    #[must_use]
    pub fn from_kelvin(kelvin: u16) -> Self {
        if kelvin == 0 {
            return Self(Self::MAX);
        }
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let mireds = (1_000_000.0 / f64::from(kelvin)).round() as u16;
        Self::clamped(mireds)
    }
}

impl Default for ColorTemp {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl fmt::Display for ColorTemp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}K", self.to_kelvin())
    }
}

/// HSB color representation (Hue, Saturation, Brightness).
///
/// # Examples
///
/// ```
/// use homesync_lib::types::HsbColor;
///
/// // Create a pure red color at full brightness
/// let red = HsbColor::new(0, 100, 100).unwrap();
/// assert_eq!(red.hue(), 0);
/// assert_eq!(red.saturation(), 100);
/// assert_eq!(red.brightness(), 100);
///
/// // Create a green color
/// let green = HsbColor::new(120, 100, 100).unwrap();
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct HsbColor {
    hue: u16,
    saturation: u8,
    brightness: u8,
}

impl HsbColor {
    /// Maximum hue value (wraps at 360).
    pub const MAX_HUE: u16 = 360;

    /// Maximum saturation value.
    pub const MAX_SATURATION: u8 = 100;

    /// Maximum brightness value.
    pub const MAX_BRIGHTNESS: u8 = 100;

    /// Creates a new HSB color.
    ///
    /// # Arguments
    ///
    /// * `hue` - Color hue (0-360 degrees, where 0/360 is red)
    /// * `saturation` - Color saturation (0-100%)
    /// * `brightness` - Color brightness (0-100%)
    ///
    /// # Errors
    ///
    /// Returns error if any value is outside its valid range.
    pub fn new(hue: u16, saturation: u8, brightness: u8) -> Result<Self, ValueError> {
        if hue > Self::MAX_HUE {
            return Err(ValueError::InvalidHue(hue));
        }
        if saturation > Self::MAX_SATURATION {
            return Err(ValueError::InvalidSaturation(saturation));
        }
        if brightness > Self::MAX_BRIGHTNESS {
            return Err(ValueError::InvalidBrightness(brightness));
        }
        Ok(Self {
            hue,
            saturation,
            brightness,
        })
    }

    /// Creates an HSB color, wrapping the hue at 360 and clamping
    /// saturation and brightness to 100.
    #[must_use]
    pub const fn clamped(hue: u16, saturation: u8, brightness: u8) -> Self {
        Self {
            hue: hue % (Self::MAX_HUE + 1),
            saturation: if saturation > Self::MAX_SATURATION {
                Self::MAX_SATURATION
            } else {
                saturation
            },
            brightness: if brightness > Self::MAX_BRIGHTNESS {
                Self::MAX_BRIGHTNESS
            } else {
                brightness
            },
        }
    }

    /// Creates a pure red color at full brightness.
    #[must_use]
    pub const fn red() -> Self {
        Self {
            hue: 0,
            saturation: 100,
            brightness: 100,
        }
    }

    /// Creates a pure green color at full brightness.
    #[must_use]
    pub const fn green() -> Self {
        Self {
            hue: 120,
            saturation: 100,
            brightness: 100,
        }
    }

    /// Creates a pure blue color at full brightness.
    #[must_use]
    pub const fn blue() -> Self {
        Self {
            hue: 240,
            saturation: 100,
            brightness: 100,
        }
    }

    /// Creates a white color (no saturation).
    #[must_use]
    pub const fn white() -> Self {
        Self {
            hue: 0,
            saturation: 0,
            brightness: 100,
        }
    }

    /// Returns the hue value (0-360).
    #[must_use]
    pub const fn hue(&self) -> u16 {
        self.hue
    }

    /// Returns the saturation value (0-100).
    #[must_use]
    pub const fn saturation(&self) -> u8 {
        self.saturation
    }

    /// Returns the brightness value (0-100).
    #[must_use]
    pub const fn brightness(&self) -> u8 {
        self.brightness
    }

    /// Creates a new color with a different hue.
    ///
    /// # Errors
    ///
    /// Returns error if hue is greater than 360.
    pub fn with_hue(&self, hue: u16) -> Result<Self, ValueError> {
        Self::new(hue, self.saturation, self.brightness)
    }

    /// Creates a new color with a different saturation.
    ///
    /// # Errors
    ///
    /// Returns error if saturation is greater than 100.
    pub fn with_saturation(&self, saturation: u8) -> Result<Self, ValueError> {
        Self::new(self.hue, saturation, self.brightness)
    }

    /// Creates a new color with a different brightness.
    ///
    /// # Errors
    ///
    /// Returns error if brightness is greater than 100.
    pub fn with_brightness(&self, brightness: u8) -> Result<Self, ValueError> {
        Self::new(self.hue, self.saturation, brightness)
    }
}

impl Default for HsbColor {
    fn default() -> Self {
        Self::white()
    }
}

impl fmt::Display for HsbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HSB({}, {}%, {}%)",
            self.hue, self.saturation, self.brightness
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_temp_valid() {
        for v in 153..=500 {
            let ct = ColorTemp::new(v).unwrap();
            assert_eq!(ct.value(), v);
        }
    }

    #[test]
    fn color_temp_invalid() {
        assert!(ColorTemp::new(152).is_err());
        assert!(ColorTemp::new(501).is_err());
    }

    #[test]
    fn color_temp_clamped() {
        assert_eq!(ColorTemp::clamped(100).value(), 153);
        assert_eq!(ColorTemp::clamped(600).value(), 500);
        assert_eq!(ColorTemp::clamped(300).value(), 300);
    }

    #[test]
    fn color_temp_kelvin_round_trip_within_one_mired() {
        for m in ColorTemp::MIN..=ColorTemp::MAX {
            let ct = ColorTemp::new(m).unwrap();
            let back = ColorTemp::from_kelvin(ct.to_kelvin());
            let diff = i32::from(back.value()) - i32::from(m);
            assert!(diff.abs() <= 1, "mired {m} round-tripped to {}", back.value());
        }
    }

    #[test]
    fn color_temp_from_kelvin() {
        assert_eq!(ColorTemp::from_kelvin(4000).value(), 250);
        assert_eq!(ColorTemp::from_kelvin(2000).value(), 500);
    }

    #[test]
    fn color_temp_from_kelvin_clamps() {
        assert_eq!(ColorTemp::from_kelvin(10_000).value(), 153);
        assert_eq!(ColorTemp::from_kelvin(1_000).value(), 500);
        assert_eq!(ColorTemp::from_kelvin(0).value(), 500);
    }

    #[test]
    fn hsb_color_valid() {
        let color = HsbColor::new(180, 50, 75).unwrap();
        assert_eq!(color.hue(), 180);
        assert_eq!(color.saturation(), 50);
        assert_eq!(color.brightness(), 75);
    }

    #[test]
    fn hsb_color_invalid_hue() {
        let result = HsbColor::new(361, 50, 50);
        assert!(matches!(result, Err(ValueError::InvalidHue(361))));
    }

    #[test]
    fn hsb_color_invalid_saturation() {
        let result = HsbColor::new(180, 101, 50);
        assert!(matches!(result, Err(ValueError::InvalidSaturation(101))));
    }

    #[test]
    fn hsb_color_invalid_brightness() {
        let result = HsbColor::new(180, 50, 101);
        assert!(matches!(result, Err(ValueError::InvalidBrightness(101))));
    }

    #[test]
    fn hsb_color_presets() {
        assert_eq!(HsbColor::red().hue(), 0);
        assert_eq!(HsbColor::green().hue(), 120);
        assert_eq!(HsbColor::blue().hue(), 240);
        assert_eq!(HsbColor::white().saturation(), 0);
    }

    #[test]
    fn hsb_color_with_methods() {
        let color = HsbColor::red();
        let green = color.with_hue(120).unwrap();
        assert_eq!(green.hue(), 120);
        assert_eq!(green.saturation(), 100);
    }
}
