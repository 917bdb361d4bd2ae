// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the `HomeSync` library.
//!
//! This module provides a comprehensive error hierarchy for handling failures
//! across the library: value validation, channel communication, payload
//! decoding, and device operations.

use thiserror::Error;

/// The main error type for this library.
///
/// This enum encompasses all possible errors that can occur when
/// synchronizing accessory state.
#[derive(Debug, Error)]
pub enum Error {
    /// Error occurred during value validation.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Error occurred on one of the transport channels.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Error occurred while decoding a status payload.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Error occurred during device operations.
    #[error("device error: {0}")]
    Device(#[from] DeviceError),

    /// Device was not found in the registry.
    #[error("device not found")]
    DeviceNotFound,
}

/// Errors related to value validation and constraints.
///
/// These errors occur when attempting to create constrained types
/// with invalid values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// An invalid power state string was provided.
    #[error("invalid power state: {0}")]
    InvalidPowerState(String),

    /// An invalid contact state string was provided.
    #[error("invalid contact state: {0}")]
    InvalidContactState(String),

    /// A hue value is outside the valid range (0-360).
    #[error("hue value {0} is out of range [0, 360]")]
    InvalidHue(u16),

    /// A saturation value is outside the valid range (0-100).
    #[error("saturation value {0} is out of range [0, 100]")]
    InvalidSaturation(u8),

    /// A brightness value is outside the valid range (0-100).
    #[error("brightness value {0} is out of range [0, 100]")]
    InvalidBrightness(u8),

    /// An invalid hex color string was provided.
    #[error("invalid hex color: {0}")]
    InvalidHexColor(String),
}

/// Errors related to channel communication (remote API, broadcast, relay).
#[derive(Debug, Error)]
pub enum ChannelError {
    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Relay connection or communication failed.
    #[cfg(feature = "relay")]
    #[error("relay error: {0}")]
    Relay(#[from] rumqttc::ClientError),

    /// Connection to the remote endpoint failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Operation timed out.
    #[error("operation timed out after {0} ms")]
    Timeout(u64),

    /// A broadcast scan window closed without a matching advertisement.
    #[error("scan window closed after {0} ms without a matching advertisement")]
    ScanTimeout(u64),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Authentication with the remote endpoint failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// The remote envelope carried a non-success status code.
    #[error("remote rejected request with code {code}: {description}")]
    Remote {
        /// The envelope-level status code.
        code: i64,
        /// Operator-facing description of the code.
        description: &'static str,
    },

    /// The channel is not configured or not usable for this device.
    #[error("channel unavailable: {0}")]
    Unavailable(String),

    /// Internal channel was closed.
    #[error("channel closed: {0}")]
    ChannelClosed(String),
}

/// Errors related to decoding status payloads.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// JSON parsing failed.
    #[error("JSON decode error: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload carried an unrecognized device model tag.
    #[error("unknown model tag: 0x{0:02X}")]
    UnknownModel(u8),

    /// A broadcast frame is too short for its family's layout.
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum frame length for the family.
        expected: usize,
        /// Actual frame length.
        actual: usize,
    },

    /// Expected field is missing from the payload.
    #[error("missing field in payload: {0}")]
    MissingField(String),

    /// Unexpected payload format.
    #[error("unexpected payload format: {0}")]
    UnexpectedFormat(String),
}

/// Errors related to device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// A field is not part of the device family's schema.
    #[error("family {family} does not carry field {field}")]
    UnsupportedField {
        /// The device family.
        family: String,
        /// The rejected field.
        field: String,
    },

    /// A field value does not match the field's expected kind.
    #[error("value kind mismatch for field {field}")]
    ValueKindMismatch {
        /// The field with the mismatched value.
        field: String,
    },

    /// Command was rejected by the remote system.
    #[error("command rejected: {0}")]
    CommandRejected(String),

    /// Engine configuration is invalid.
    #[error("invalid engine configuration: {0}")]
    InvalidConfiguration(String),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
