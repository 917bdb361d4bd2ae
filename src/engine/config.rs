// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration.

use std::time::Duration;

use crate::channel::Channel;
use crate::retry::RetryPolicy;
use crate::select::SelectorConfig;

/// Timing and policy configuration for one sync engine.
///
/// # Examples
///
/// ```
/// use homesync_lib::engine::EngineConfig;
/// use homesync_lib::channel::Channel;
/// use homesync_lib::select::SelectorConfig;
/// use std::time::Duration;
///
/// let config = EngineConfig::new()
///     .with_selector(SelectorConfig::new(Channel::Broadcast).with_fallback(Channel::Poll))
///     .with_debounce_window(Duration::from_millis(50));
/// ```
#[derive(Debug, Clone)]
pub struct EngineConfig {
    debounce_window: Duration,
    poll_interval: Duration,
    scan_window: Duration,
    confirm_delay: Duration,
    retry: RetryPolicy,
    selector: SelectorConfig,
}

impl EngineConfig {
    /// Default intent-coalescing window.
    pub const DEFAULT_DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

    /// Default remote status polling interval.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

    /// Default broadcast scan window.
    pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(1);

    /// Default delay before the confirmatory refresh after a push cycle.
    pub const DEFAULT_CONFIRM_DELAY: Duration = Duration::from_secs(15);

    /// Creates a configuration with default timings, preferring the
    /// remote-API channel with no fallback.
    #[must_use]
    pub fn new() -> Self {
        Self {
            debounce_window: Self::DEFAULT_DEBOUNCE_WINDOW,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            scan_window: Self::DEFAULT_SCAN_WINDOW,
            confirm_delay: Self::DEFAULT_CONFIRM_DELAY,
            retry: RetryPolicy::default(),
            selector: SelectorConfig::new(Channel::Poll),
        }
    }

    /// Sets the intent-coalescing window.
    #[must_use]
    pub fn with_debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = window;
        self
    }

    /// Sets the status polling interval (clamped to the poll client's
    /// minimum when the engine starts).
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the broadcast scan window (capped at the scanner's platform
    /// maximum).
    #[must_use]
    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }

    /// Sets the delay before the confirmatory refresh after a fully
    /// successful push cycle.
    #[must_use]
    pub fn with_confirm_delay(mut self, delay: Duration) -> Self {
        self.confirm_delay = delay;
        self
    }

    /// Sets the retry policy shared by the poll client and push executor.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the channel selector configuration.
    #[must_use]
    pub fn with_selector(mut self, selector: SelectorConfig) -> Self {
        self.selector = selector;
        self
    }

    /// Returns the intent-coalescing window.
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        self.debounce_window
    }

    /// Returns the status polling interval.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Returns the broadcast scan window.
    #[must_use]
    pub fn scan_window(&self) -> Duration {
        self.scan_window
    }

    /// Returns the confirmatory refresh delay.
    #[must_use]
    pub fn confirm_delay(&self) -> Duration {
        self.confirm_delay
    }

    /// Returns the retry policy.
    #[must_use]
    pub fn retry(&self) -> RetryPolicy {
        self.retry
    }

    /// Returns the selector configuration.
    #[must_use]
    pub fn selector(&self) -> SelectorConfig {
        self.selector
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}
