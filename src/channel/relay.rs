// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Publish/subscribe relay adapter for push notifications.
//!
//! Some installations deliver push notifications over a topic-per-device
//! relay (`<prefix>/webhook/<mac>`) instead of an HTTP callback. This
//! adapter subscribes to the wildcard topic and forwards each payload
//! into the same [`PushReceiver`] the HTTP callback would use; everything
//! below the message handoff stays the relay broker's concern.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use rumqttc::{AsyncClient, Event, EventLoop, MqttOptions, Packet, QoS};
use tokio::task::JoinHandle;

use crate::error::ChannelError;

use super::push::PushReceiver;
use super::scanner::BroadcastTransport;

/// Global counter for generating unique client IDs.
static CLIENT_ID_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Configuration for the relay connection.
///
/// # Examples
///
/// ```
/// use homesync_lib::channel::RelayConfig;
///
/// let config = RelayConfig::new("mqtt://192.168.1.50:1883", "home")
///     .with_credentials("user", "password");
/// ```
#[derive(Debug, Clone)]
pub struct RelayConfig {
    broker_url: String,
    topic_prefix: String,
    credentials: Option<(String, String)>,
}

impl RelayConfig {
    /// Default relay port.
    pub const DEFAULT_PORT: u16 = 1883;

    /// Creates a relay configuration.
    ///
    /// # Arguments
    ///
    /// * `broker_url` - The relay broker URL (e.g. `mqtt://host:1883`)
    /// * `topic_prefix` - The topic prefix in front of `/webhook/<mac>`
    #[must_use]
    pub fn new(broker_url: impl Into<String>, topic_prefix: impl Into<String>) -> Self {
        Self {
            broker_url: broker_url.into(),
            topic_prefix: topic_prefix.into(),
            credentials: None,
        }
    }

    /// Sets broker credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// Returns the wildcard subscription topic.
    #[must_use]
    pub fn subscription_topic(&self) -> String {
        let prefix = self.topic_prefix.trim_end_matches('/');
        format!("{prefix}/webhook/+")
    }
}

/// A running relay subscription forwarding into a [`PushReceiver`].
#[derive(Debug)]
pub struct RelayListener {
    client: AsyncClient,
    topic: String,
    handle: JoinHandle<()>,
}

impl RelayListener {
    /// Connects to the relay broker and starts forwarding notifications.
    ///
    /// # Errors
    ///
    /// Returns `ChannelError` if the broker URL is invalid or the
    /// subscription fails.
    pub async fn connect<T: BroadcastTransport>(
        config: RelayConfig,
        receiver: PushReceiver<T>,
    ) -> Result<Self, ChannelError> {
        let (host, port) = parse_relay_url(&config.broker_url)?;

        // Unique client ID (PID + counter) to avoid broker-side conflicts
        let counter = CLIENT_ID_COUNTER.fetch_add(1, Ordering::Relaxed);
        let client_id = format!("homesync_{}_{}", std::process::id(), counter);

        let mut options = MqttOptions::new(&client_id, host, port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_clean_session(true);
        if let Some((username, password)) = &config.credentials {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options, 10);

        let topic = config.subscription_topic();
        client
            .subscribe(&topic, QoS::AtLeastOnce)
            .await
            .map_err(ChannelError::Relay)?;

        tracing::debug!(topic = %topic, "subscribed to relay notifications");

        let handle = tokio::spawn(forward_notifications(event_loop, receiver));

        Ok(Self {
            client,
            topic,
            handle,
        })
    }

    /// Returns the wildcard topic this listener is subscribed to.
    #[must_use]
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Disconnects from the broker and stops forwarding.
    pub async fn disconnect(self) {
        let _ = self.client.disconnect().await;
        self.handle.abort();
    }
}

async fn forward_notifications<T: BroadcastTransport>(
    mut event_loop: EventLoop,
    receiver: PushReceiver<T>,
) {
    loop {
        match event_loop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                match serde_json::from_slice::<serde_json::Value>(&publish.payload) {
                    Ok(body) => {
                        // Malformed or unroutable bodies are already
                        // logged inside deliver
                        let _ = receiver.deliver(&body).await;
                    }
                    Err(error) => {
                        tracing::warn!(
                            topic = %publish.topic,
                            %error,
                            "discarding non-JSON relay payload"
                        );
                    }
                }
            }
            Ok(_) => {}
            Err(error) => {
                tracing::warn!(%error, "relay connection error, retrying");
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}

/// Parses a relay broker URL into host and port.
fn parse_relay_url(url: &str) -> Result<(String, u16), ChannelError> {
    let stripped = url
        .strip_prefix("mqtt://")
        .or_else(|| url.strip_prefix("tcp://"))
        .unwrap_or(url);

    if stripped.is_empty() {
        return Err(ChannelError::InvalidAddress(url.to_string()));
    }

    match stripped.rsplit_once(':') {
        Some((host, port)) => {
            let port = port
                .parse()
                .map_err(|_| ChannelError::InvalidAddress(url.to_string()))?;
            Ok((host.to_string(), port))
        }
        None => Ok((stripped.to_string(), RelayConfig::DEFAULT_PORT)),
    }
}
