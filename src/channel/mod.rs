// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Channel implementations for ingesting device status and pushing
//! commands.
//!
//! Three inbound channels feed the sync engine:
//!
//! - [`BroadcastScanner`]: time-boxed scans for short-range advertisements
//! - [`PollClient`]: periodic polls of the remote status endpoint
//! - [`PushReceiver`]: passive sink for inbound push notifications
//!
//! Outbound commands travel over the remote API ([`ApiClient`]) or the
//! broadcast transport, chosen per operation by the
//! [`ConnectionSelector`](crate::select::ConnectionSelector).

mod api;
mod poll;
mod push;
#[cfg(feature = "relay")]
mod relay;
mod scanner;
mod signing;
pub mod status_code;

pub use api::{ApiClient, ApiConfig, RemoteCommand, ResponseEnvelope};
pub use poll::PollClient;
pub use push::{PushEnvelope, PushReceiver};
#[cfg(feature = "relay")]
pub use relay::{RelayConfig, RelayListener};
pub use scanner::{Advertisement, BroadcastScanner, BroadcastTransport, NoBroadcast};
pub use signing::SignedHeaders;

use chrono::{DateTime, Utc};

use crate::state::Source;

/// One inbound or outbound transport path.
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
#[serde(rename_all = "snake_case")]
pub enum Channel {
    /// Short-range broadcast advertisements.
    Broadcast,
    /// The remote polling/command API.
    Poll,
    /// Push notification delivery (inbound only).
    Push,
}

impl Channel {
    /// Returns the provenance tag for state set from this channel.
    #[must_use]
    pub const fn source(&self) -> Source {
        match self {
            Self::Broadcast => Source::Broadcast,
            Self::Poll => Source::Poll,
            Self::Push => Source::Push,
        }
    }

    /// Returns the lowercase channel name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Broadcast => "broadcast",
            Self::Poll => "poll",
            Self::Push => "push",
        }
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A raw status payload before decoding.
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    /// A binary broadcast service-data frame.
    Frame(Vec<u8>),
    /// A JSON body from the remote API or a push notification.
    Json(serde_json::Value),
}

/// A raw payload plus its provenance and receive time, as emitted by
/// every channel listener.
#[derive(Debug, Clone)]
pub struct ChannelEvent {
    /// The raw payload.
    pub payload: RawPayload,
    /// The channel that produced it.
    pub channel: Channel,
    /// When the payload was received.
    pub received_at: DateTime<Utc>,
}

impl ChannelEvent {
    /// Creates an event stamped with the current time.
    #[must_use]
    pub fn now(payload: RawPayload, channel: Channel) -> Self {
        Self {
            payload,
            channel,
            received_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sources() {
        assert_eq!(Channel::Broadcast.source(), Source::Broadcast);
        assert_eq!(Channel::Poll.source(), Source::Poll);
        assert_eq!(Channel::Push.source(), Source::Push);
    }

    #[test]
    fn channel_display() {
        assert_eq!(Channel::Broadcast.to_string(), "broadcast");
    }
}
