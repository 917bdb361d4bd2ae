// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device identifier type.

use std::fmt;

/// Identifier of a physical device, as carried by every inbound channel.
///
/// Broadcast advertisements, push notifications and the remote API all
/// address a device by its MAC-style identifier, but spell it differently
/// (`AA:BB:CC:DD:EE:FF`, `aabbccddeeff`, ...). A `DeviceKey` normalizes
/// the spelling (separators stripped, uppercased) so the same device keys
/// identically no matter which channel named it.
///
/// # Examples
///
/// ```
/// use homesync_lib::DeviceKey;
///
/// let a = DeviceKey::new("AA:BB:CC:DD:EE:FF");
/// let b = DeviceKey::new("aabbcc-ddeeff");
/// assert_eq!(a, b);
/// assert_eq!(a.as_str(), "AABBCCDDEEFF");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct DeviceKey(String);

impl DeviceKey {
    /// Creates a device key, normalizing the identifier spelling.
    ///
    /// Separators (`:`, `-`) are stripped and hex letters uppercased.
    #[must_use]
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .chars()
            .filter(|c| *c != ':' && *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();
        Self(normalized)
    }

    /// Returns the normalized identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceKey {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl From<String> for DeviceKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_separators_and_case() {
        let key = DeviceKey::new("aa:bb:cc-dd:ee:ff");
        assert_eq!(key.as_str(), "AABBCCDDEEFF");
    }

    #[test]
    fn equal_across_spellings() {
        assert_eq!(
            DeviceKey::new("AA:BB:CC:DD:EE:FF"),
            DeviceKey::new("aabbccddeeff")
        );
    }

    #[test]
    fn display_uses_normalized_form() {
        assert_eq!(DeviceKey::new("ab:cd").to_string(), "ABCD");
    }
}
