// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Remote envelope status-code taxonomy.
//!
//! The remote API wraps every response in an envelope whose `statusCode`
//! is distinct from the HTTP status. This module is the single mapping
//! from those codes to retry eligibility and operator-facing log text.

/// Command executed successfully.
pub const SUCCESS: i64 = 100;

/// Request accepted (alternate success code).
pub const OK: i64 = 200;

/// The device does not support the requested command.
pub const COMMAND_NOT_SUPPORTED: i64 = 151;

/// The device is not registered with the remote system.
pub const DEVICE_NOT_FOUND: i64 = 152;

/// The device is offline (hub reachable, device not).
pub const DEVICE_OFFLINE: i64 = 161;

/// The hub itself is offline.
pub const HUB_OFFLINE: i64 = 171;

/// The per-account request budget is exhausted.
pub const RATE_LIMIT_EXCEEDED: i64 = 190;

/// Classification of an envelope status code, driving retry decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodeClass {
    /// The request succeeded.
    Success,
    /// The device or its hub is offline; not retried, the engine applies
    /// the offline-default state instead.
    Offline,
    /// Transient remote-side pressure; retried, and polling should back
    /// off when it recurs.
    RateLimited,
    /// Application-level rejection; never retried.
    Terminal,
    /// Anything else is treated as transient and retried.
    Transient,
}

/// Classifies an envelope status code.
#[must_use]
pub const fn classify(code: i64) -> CodeClass {
    match code {
        SUCCESS | OK => CodeClass::Success,
        DEVICE_OFFLINE | HUB_OFFLINE => CodeClass::Offline,
        RATE_LIMIT_EXCEEDED => CodeClass::RateLimited,
        COMMAND_NOT_SUPPORTED | DEVICE_NOT_FOUND => CodeClass::Terminal,
        _ => CodeClass::Transient,
    }
}

/// Returns `true` if the code counts as success.
#[must_use]
pub const fn is_success(code: i64) -> bool {
    matches!(classify(code), CodeClass::Success)
}

/// Returns the operator-facing description of a code, used in log lines.
#[must_use]
pub const fn describe(code: i64) -> &'static str {
    match code {
        SUCCESS => "success",
        OK => "request accepted",
        COMMAND_NOT_SUPPORTED => "command not supported by this device",
        DEVICE_NOT_FOUND => "device not found",
        DEVICE_OFFLINE => "device offline",
        HUB_OFFLINE => "hub offline",
        RATE_LIMIT_EXCEEDED => "rate limit exceeded",
        _ => "unrecognized remote status code",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_codes() {
        assert!(is_success(100));
        assert!(is_success(200));
        assert!(!is_success(151));
    }

    #[test]
    fn terminal_codes_are_not_retried() {
        assert_eq!(classify(151), CodeClass::Terminal);
        assert_eq!(classify(152), CodeClass::Terminal);
    }

    #[test]
    fn offline_codes() {
        assert_eq!(classify(161), CodeClass::Offline);
        assert_eq!(classify(171), CodeClass::Offline);
    }

    #[test]
    fn rate_limit_is_transient() {
        assert_eq!(classify(190), CodeClass::RateLimited);
    }

    #[test]
    fn unknown_codes_default_to_transient() {
        assert_eq!(classify(500), CodeClass::Transient);
        assert_eq!(classify(0), CodeClass::Transient);
    }

    #[test]
    fn every_known_code_has_a_description() {
        for code in [100, 200, 151, 152, 161, 171, 190] {
            assert_ne!(describe(code), "unrecognized remote status code");
        }
    }
}
