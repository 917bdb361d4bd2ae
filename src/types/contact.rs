// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Contact sensor state type.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// State of a door/window contact sensor.
///
/// # Examples
///
/// ```
/// use homesync_lib::types::ContactState;
///
/// let open: ContactState = "open".parse().unwrap();
/// assert!(open.is_open());
/// assert_eq!(ContactState::Closed.as_str(), "close");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactState {
    /// The contact is closed.
    Closed,
    /// The contact is open.
    Open,
}

impl ContactState {
    /// Returns the remote payload string representation.
    ///
    /// The remote system reports the closed state as `"close"`.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "close",
            Self::Open => "open",
        }
    }

    /// Returns `true` if the contact is open.
    #[must_use]
    pub const fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ContactState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContactState {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "close" | "closed" | "0" => Ok(Self::Closed),
            "open" | "opened" | "1" | "timeoutnotclose" => Ok(Self::Open),
            _ => Err(ValueError::InvalidContactState(s.to_string())),
        }
    }
}
