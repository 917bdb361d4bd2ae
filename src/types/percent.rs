// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Percentage type for levels, positions and battery readings.
//!
//! This module provides a type-safe representation of percentage values,
//! ensuring values are always within the valid range of 0-100.

use std::fmt;

use crate::error::ValueError;

/// A percentage value (0-100).
///
/// Used for brightness levels, curtain positions, humidity and battery
/// readings.
///
/// # Examples
///
/// ```
/// use homesync_lib::types::Percent;
///
/// // Create a level at 75%
/// let level = Percent::new(75).unwrap();
/// assert_eq!(level.value(), 75);
///
/// // Use predefined values
/// let zero = Percent::MIN;
/// let full = Percent::MAX;
/// assert_eq!(zero.value(), 0);
/// assert_eq!(full.value(), 100);
///
/// // Invalid values return error
/// assert!(Percent::new(101).is_err());
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
pub struct Percent(u8);

impl Percent {
    /// Minimum percentage value (0%).
    pub const MIN: Self = Self(0);

    /// Maximum percentage value (100%).
    pub const MAX: Self = Self(100);

    /// Creates a new percentage value.
    ///
    /// # Arguments
    ///
    /// * `value` - The percentage (0-100)
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value exceeds 100.
    pub fn new(value: u8) -> Result<Self, ValueError> {
        if value > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(value),
            });
        }
        Ok(Self(value))
    }

    /// Creates a percentage value, clamping to the valid range.
    ///
    /// Values above 100 are clamped to 100.
    ///
    /// # Examples
    ///
    /// ```
    /// use homesync_lib::types::Percent;
    ///
    /// let level = Percent::clamped(150);
    /// assert_eq!(level.value(), 100);
    /// ```
    #[must_use]
    pub const fn clamped(value: u8) -> Self {
        if value > 100 { Self(100) } else { Self(value) }
    }

    /// Returns the percentage value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns `true` if the value is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl TryFrom<u8> for Percent {
    type Error = ValueError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}
