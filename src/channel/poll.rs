// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Periodic polling of the remote status endpoint.

use std::time::Duration;

use crate::error::ChannelError;
use crate::event::DeviceKey;
use crate::retry::{AttemptError, RetryOrchestrator, check_envelope};

use super::status_code::RATE_LIMIT_EXCEEDED;
use super::{ApiClient, Channel, ChannelEvent, RawPayload, ResponseEnvelope};

/// Polls the remote status endpoint on a fixed interval.
///
/// Each tick issues one bounded-retry status fetch and hands the outcome
/// to the caller's handler. The interval is clamped to a minimum of five
/// seconds to stay under the remote API's account throttling; repeated
/// rate-limit rejections back the interval off further (up to 4x) until
/// a fetch succeeds.
#[derive(Debug, Clone)]
pub struct PollClient {
    api: ApiClient,
    key: DeviceKey,
    interval: Duration,
    retry: RetryOrchestrator,
}

impl PollClient {
    /// Minimum polling interval.
    pub const MIN_INTERVAL: Duration = Duration::from_secs(5);

    /// Maximum rate-limit backoff, as a multiple of the interval.
    const MAX_BACKOFF_MULTIPLIER: u32 = 4;

    /// Creates a poll client. The interval is clamped to
    /// [`Self::MIN_INTERVAL`].
    #[must_use]
    pub fn new(
        api: ApiClient,
        key: DeviceKey,
        interval: Duration,
        retry: RetryOrchestrator,
    ) -> Self {
        Self {
            api,
            key,
            interval: interval.max(Self::MIN_INTERVAL),
            retry,
        }
    }

    /// Returns the effective polling interval.
    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Issues one status fetch under the retry policy.
    ///
    /// # Errors
    ///
    /// Returns the final `ChannelError` after the retry bound is
    /// exhausted, or immediately for terminal rejections.
    pub async fn fetch_once(&self) -> Result<ResponseEnvelope, ChannelError> {
        self.retry
            .run(|_attempt| async {
                match self.api.fetch_status(&self.key).await {
                    Ok(envelope) => check_envelope(envelope),
                    Err(error) => Err(AttemptError::from_channel(error)),
                }
            })
            .await
    }

    /// Runs the polling loop until the handler returns `false`.
    ///
    /// The handler receives either a [`ChannelEvent`] carrying the status
    /// body or the failure left after exhausting retries. It runs on the
    /// polling task; returning `false` ends the loop (used when the
    /// owning engine has shut down).
    pub async fn run<F>(self, mut handler: F)
    where
        F: FnMut(Result<ChannelEvent, ChannelError>) -> bool,
    {
        let mut delay = self.interval;
        loop {
            tokio::time::sleep(delay).await;

            let outcome = self.fetch_once().await;
            delay = match &outcome {
                Err(ChannelError::Remote {
                    code: RATE_LIMIT_EXCEEDED,
                    ..
                }) => {
                    let backed_off =
                        (delay * 2).min(self.interval * Self::MAX_BACKOFF_MULTIPLIER);
                    tracing::warn!(
                        device = %self.key,
                        delay_secs = backed_off.as_secs(),
                        "rate limited, backing off polling"
                    );
                    backed_off
                }
                _ => self.interval,
            };

            let event = outcome
                .map(|envelope| ChannelEvent::now(RawPayload::Json(envelope.body), Channel::Poll));
            if !handler(event) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::ApiConfig;
    use crate::retry::RetryPolicy;

    #[test]
    fn interval_is_clamped_to_minimum() {
        let api = ApiConfig::new("http://localhost", "t", "s")
            .into_client()
            .unwrap();
        let client = PollClient::new(
            api,
            DeviceKey::new("AABBCCDDEEFF"),
            Duration::from_secs(1),
            RetryOrchestrator::new(RetryPolicy::default()),
        );
        assert_eq!(client.interval(), PollClient::MIN_INTERVAL);
    }

    #[test]
    fn configured_interval_above_minimum_is_kept() {
        let api = ApiConfig::new("http://localhost", "t", "s")
            .into_client()
            .unwrap();
        let client = PollClient::new(
            api,
            DeviceKey::new("AABBCCDDEEFF"),
            Duration::from_secs(60),
            RetryOrchestrator::new(RetryPolicy::default()),
        );
        assert_eq!(client.interval(), Duration::from_secs(60));
    }
}
