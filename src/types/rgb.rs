// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! RGB color type with hex parsing and HSB conversion.
//!
//! Broadcast frames and remote color commands carry colors as 8-bit RGB
//! channels, while the binding layer works in HSB. The conversions here
//! round half away from zero (the rounding mode of [`f64::round`]) and are
//! inverses of each other within one unit per component.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

use super::HsbColor;

/// RGB color with 8-bit channels (0-255).
///
/// # Examples
///
/// ```
/// use homesync_lib::types::RgbColor;
///
/// // Create from RGB values
/// let color = RgbColor::new(255, 128, 0);  // Orange
/// assert_eq!(color.red(), 255);
/// assert_eq!(color.green(), 128);
/// assert_eq!(color.blue(), 0);
///
/// // Parse from hex string
/// let red = RgbColor::from_hex("#FF0000").unwrap();
/// assert_eq!(red.to_hex(), "FF0000");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RgbColor {
    red: u8,
    green: u8,
    blue: u8,
}

impl RgbColor {
    /// Creates a new RGB color.
    ///
    /// # Arguments
    ///
    /// * `red` - Red component (0-255)
    /// * `green` - Green component (0-255)
    /// * `blue` - Blue component (0-255)
    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// Parses an RGB color from a hex string.
    ///
    /// Accepts formats: `#RRGGBB`, `RRGGBB`, `#RGB`, `RGB`
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the hex string is invalid.
    pub fn from_hex(hex: &str) -> Result<Self, ValueError> {
        let hex = hex.trim_start_matches('#');

        match hex.len() {
            3 => {
                let chars: Vec<char> = hex.chars().collect();
                let r = parse_hex_char(chars[0])?;
                let g = parse_hex_char(chars[1])?;
                let b = parse_hex_char(chars[2])?;
                // Expand 0-F to 0-255
                Ok(Self::new(r * 17, g * 17, b * 17))
            }
            6 => {
                let r = parse_hex_pair(&hex[0..2])?;
                let g = parse_hex_pair(&hex[2..4])?;
                let b = parse_hex_pair(&hex[4..6])?;
                Ok(Self::new(r, g, b))
            }
            _ => Err(ValueError::InvalidHexColor(hex.to_string())),
        }
    }

    /// Parses an RGB color from the remote API's `"r:g:b"` notation.
    ///
    /// Components above 255 are clamped.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidHexColor` if the string does not have
    /// three numeric components.
    pub fn from_triplet(s: &str) -> Result<Self, ValueError> {
        let mut parts = s.split(':');
        let mut next = || -> Result<u8, ValueError> {
            let part = parts
                .next()
                .ok_or_else(|| ValueError::InvalidHexColor(s.to_string()))?;
            let value: u32 = part
                .trim()
                .parse()
                .map_err(|_| ValueError::InvalidHexColor(s.to_string()))?;
            #[allow(clippy::cast_possible_truncation)]
            let value = value.min(255) as u8;
            Ok(value)
        };
        let r = next()?;
        let g = next()?;
        let b = next()?;
        Ok(Self::new(r, g, b))
    }

    /// Returns the red component.
    #[must_use]
    pub const fn red(&self) -> u8 {
        self.red
    }

    /// Returns the green component.
    #[must_use]
    pub const fn green(&self) -> u8 {
        self.green
    }

    /// Returns the blue component.
    #[must_use]
    pub const fn blue(&self) -> u8 {
        self.blue
    }

    /// Returns the color as a hex string without the hash prefix.
    #[must_use]
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }

    /// Returns the color in the remote API's `"r:g:b"` notation.
    #[must_use]
    pub fn to_triplet(&self) -> String {
        format!("{}:{}:{}", self.red, self.green, self.blue)
    }

    /// Converts the color to HSB.
    ///
    /// Hue lands in [0, 359], saturation and brightness in [0, 100], each
    /// rounded half away from zero.
    #[must_use]
    pub fn to_hsb(&self) -> HsbColor {
        let r = f64::from(self.red) / 255.0;
        let g = f64::from(self.green) / 255.0;
        let b = f64::from(self.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta.abs() < f64::EPSILON {
            0.0
        } else if (max - r).abs() < f64::EPSILON {
            60.0 * (((g - b) / delta).rem_euclid(6.0))
        } else if (max - g).abs() < f64::EPSILON {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };

        let saturation = if max.abs() < f64::EPSILON {
            0.0
        } else {
            delta / max * 100.0
        };
        let brightness = max * 100.0;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let components = (
            (hue.round() as u16) % 360,
            saturation.round() as u8,
            brightness.round() as u8,
        );
        HsbColor::clamped(components.0, components.1, components.2)
    }

    /// Creates an RGB color from HSB.
    ///
    /// Each channel is rounded half away from zero.
    #[must_use]
    pub fn from_hsb(hsb: HsbColor) -> Self {
        let h = f64::from(hsb.hue() % 360);
        let s = f64::from(hsb.saturation()) / 100.0;
        let v = f64::from(hsb.brightness()) / 100.0;

        let c = v * s;
        let hp = h / 60.0;
        let x = c * (1.0 - ((hp % 2.0) - 1.0).abs());
        let m = v - c;

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sextant = hp as u32;
        let (r1, g1, b1) = match sextant {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let channels = (
            ((r1 + m) * 255.0).round() as u8,
            ((g1 + m) * 255.0).round() as u8,
            ((b1 + m) * 255.0).round() as u8,
        );
        Self::new(channels.0, channels.1, channels.2)
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}

impl FromStr for RgbColor {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            Self::from_triplet(s)
        } else {
            Self::from_hex(s)
        }
    }
}

impl From<HsbColor> for RgbColor {
    fn from(hsb: HsbColor) -> Self {
        Self::from_hsb(hsb)
    }
}

impl From<RgbColor> for HsbColor {
    fn from(rgb: RgbColor) -> Self {
        rgb.to_hsb()
    }
}

fn parse_hex_char(c: char) -> Result<u8, ValueError> {
    c.to_digit(16)
        .map(|d| {
            #[allow(clippy::cast_possible_truncation)]
            let d = d as u8;
            d
        })
        .ok_or_else(|| ValueError::InvalidHexColor(c.to_string()))
}

fn parse_hex_pair(s: &str) -> Result<u8, ValueError> {
    u8::from_str_radix(s, 16).map_err(|_| ValueError::InvalidHexColor(s.to_string()))
}
