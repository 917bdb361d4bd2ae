// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Inbound push notification handling.
//!
//! Push delivery is a passive sink: the webhook endpoint or relay
//! collaborator calls [`PushReceiver::deliver`] whenever a notification
//! arrives, and the payload is routed to the matching engine by device
//! key. Delivery is at-most-once best-effort; there is no polling and no
//! retry on this channel.

use serde::Deserialize;

use crate::error::{DecodeError, Error};
use crate::event::DeviceKey;
use crate::registry::EngineRegistry;

use super::scanner::BroadcastTransport;

/// The body of an inbound push notification.
///
/// Both the HTTP callback and the relay deliver the same shape: a
/// `context` object carrying the device identifier and status fields.
///
/// # Examples
///
/// ```
/// use homesync_lib::channel::PushEnvelope;
///
/// let body = serde_json::json!({"context": {"deviceMac": "AA:BB:CC:DD:EE:FF", "temperature": 21.6}});
/// let envelope = PushEnvelope::parse(&body).unwrap();
/// assert_eq!(envelope.device_key().unwrap().as_str(), "AABBCCDDEEFF");
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    /// The status payload, including the `deviceMac` routing field.
    pub context: serde_json::Value,
}

impl PushEnvelope {
    /// Parses a push notification body.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the body has no `context` object.
    pub fn parse(body: &serde_json::Value) -> Result<Self, DecodeError> {
        let envelope: Self = serde_json::from_value(body.clone())?;
        if !envelope.context.is_object() {
            return Err(DecodeError::UnexpectedFormat(
                "push context is not an object".to_string(),
            ));
        }
        Ok(envelope)
    }

    /// Extracts the device key from the context.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::MissingField` if the context carries no
    /// `deviceMac`.
    pub fn device_key(&self) -> Result<DeviceKey, DecodeError> {
        self.context
            .get("deviceMac")
            .and_then(serde_json::Value::as_str)
            .map(DeviceKey::new)
            .ok_or_else(|| DecodeError::MissingField("context.deviceMac".to_string()))
    }
}

/// Routes inbound push notifications to the engine registered for the
/// notifying device.
#[derive(Debug)]
pub struct PushReceiver<T: BroadcastTransport> {
    registry: EngineRegistry<T>,
}

impl<T: BroadcastTransport> Clone for PushReceiver<T> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
        }
    }
}

impl<T: BroadcastTransport> PushReceiver<T> {
    /// Creates a receiver routing into the given registry.
    #[must_use]
    pub fn new(registry: EngineRegistry<T>) -> Self {
        Self { registry }
    }

    /// Delivers one push notification body.
    ///
    /// The payload is forwarded to the registered engine's codec; a
    /// malformed body or an unknown device is logged once and dropped
    /// without mutating any state.
    ///
    /// # Errors
    ///
    /// Returns `Error::Decode` for malformed bodies and
    /// `Error::DeviceNotFound` when no engine is registered for the
    /// notifying device.
    pub async fn deliver(&self, body: &serde_json::Value) -> Result<DeviceKey, Error> {
        let envelope = PushEnvelope::parse(body).map_err(|error| {
            tracing::warn!(%error, "discarding malformed push notification");
            error
        })?;
        let key = envelope.device_key().map_err(|error| {
            tracing::warn!(%error, "discarding unroutable push notification");
            error
        })?;

        let Some(engine) = self.registry.get(&key).await else {
            tracing::warn!(device = %key, "push notification for unregistered device");
            return Err(Error::DeviceNotFound);
        };

        engine.ingest_push(envelope.context);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_context_and_key() {
        let body = serde_json::json!({
            "context": {"deviceMac": "AA:BB:CC:DD:EE:FF", "temperature": 21.6}
        });
        let envelope = PushEnvelope::parse(&body).unwrap();
        assert_eq!(envelope.device_key().unwrap(), DeviceKey::new("AABBCCDDEEFF"));
    }

    #[test]
    fn rejects_body_without_context() {
        let body = serde_json::json!({"deviceMac": "AA:BB"});
        assert!(PushEnvelope::parse(&body).is_err());
    }

    #[test]
    fn rejects_non_object_context() {
        let body = serde_json::json!({"context": "hello"});
        assert!(matches!(
            PushEnvelope::parse(&body),
            Err(DecodeError::UnexpectedFormat(_))
        ));
    }

    #[test]
    fn missing_mac_is_reported() {
        let body = serde_json::json!({"context": {"temperature": 21.6}});
        let envelope = PushEnvelope::parse(&body).unwrap();
        assert!(matches!(
            envelope.device_key(),
            Err(DecodeError::MissingField(_))
        ));
    }
}
