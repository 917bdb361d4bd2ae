// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-operation channel selection with failure-driven fallback.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::channel::Channel;

/// The operations a channel can be chosen for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Fetch the device's current status.
    Refresh,
    /// Push an outbound command.
    Push,
}

/// What a configured channel is capable of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelCapability {
    /// The channel can fetch device status.
    pub refresh: bool,
    /// The channel can carry outbound commands.
    pub push: bool,
}

impl ChannelCapability {
    /// A channel usable for both operations.
    pub const FULL: Self = Self {
        refresh: true,
        push: true,
    };

    /// A channel usable only for status fetches.
    pub const REFRESH_ONLY: Self = Self {
        refresh: true,
        push: false,
    };

    /// Returns `true` if the capability covers `op`.
    #[must_use]
    pub const fn supports(&self, op: Operation) -> bool {
        match op {
            Operation::Refresh => self.refresh,
            Operation::Push => self.push,
        }
    }
}

/// Rolling failure state of one channel.
///
/// The consecutive count resets to zero on any success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChannelFailure {
    consecutive: u32,
    last_failure_at: Option<DateTime<Utc>>,
}

impl ChannelFailure {
    /// Returns the number of consecutive failures.
    #[must_use]
    pub fn consecutive(&self) -> u32 {
        self.consecutive
    }

    /// Returns when the channel last failed, if it ever has.
    #[must_use]
    pub fn last_failure_at(&self) -> Option<DateTime<Utc>> {
        self.last_failure_at
    }
}

/// Static selector configuration.
///
/// # Examples
///
/// ```
/// use homesync_lib::channel::Channel;
/// use homesync_lib::select::SelectorConfig;
///
/// let config = SelectorConfig::new(Channel::Broadcast)
///     .with_fallback(Channel::Poll);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectorConfig {
    preferred: Channel,
    fallback: Option<Channel>,
    failure_threshold: u32,
}

impl SelectorConfig {
    /// Default consecutive-failure threshold before falling back.
    pub const DEFAULT_FAILURE_THRESHOLD: u32 = 1;

    /// Creates a configuration with the given preferred channel and no
    /// fallback.
    #[must_use]
    pub fn new(preferred: Channel) -> Self {
        Self {
            preferred,
            fallback: None,
            failure_threshold: Self::DEFAULT_FAILURE_THRESHOLD,
        }
    }

    /// Sets the fallback channel.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Channel) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Sets the consecutive-failure threshold (clamped to at least 1).
    #[must_use]
    pub fn with_failure_threshold(mut self, threshold: u32) -> Self {
        self.failure_threshold = threshold.max(1);
        self
    }

    /// Returns the preferred channel.
    #[must_use]
    pub fn preferred(&self) -> Channel {
        self.preferred
    }

    /// Returns the fallback channel, if configured.
    #[must_use]
    pub fn fallback(&self) -> Option<Channel> {
        self.fallback
    }
}

/// Decides, per operation, which channel to use.
///
/// The preferred channel is returned until its consecutive-failure count
/// reaches the threshold while a capable fallback is configured; then the
/// fallback takes over until a success on the preferred channel resets
/// its count. When no channel is usable at all, [`choose`] returns `None`
/// and the caller must short-circuit to the offline-default state without
/// touching any transport.
///
/// [`choose`]: ConnectionSelector::choose
#[derive(Debug, Clone)]
pub struct ConnectionSelector {
    config: SelectorConfig,
    capabilities: BTreeMap<Channel, ChannelCapability>,
    failures: BTreeMap<Channel, ChannelFailure>,
}

impl ConnectionSelector {
    /// Creates a selector with no capable channels.
    ///
    /// Grant capabilities with [`with_capability`](Self::with_capability)
    /// before use; a selector with no capabilities always chooses `None`.
    #[must_use]
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            capabilities: BTreeMap::new(),
            failures: BTreeMap::new(),
        }
    }

    /// Grants a channel a capability.
    #[must_use]
    pub fn with_capability(mut self, channel: Channel, capability: ChannelCapability) -> Self {
        self.capabilities.insert(channel, capability);
        self
    }

    /// Returns the selector configuration.
    #[must_use]
    pub fn config(&self) -> SelectorConfig {
        self.config
    }

    /// Chooses a channel for `op`, or `None` when no channel is usable.
    #[must_use]
    pub fn choose(&self, op: Operation) -> Option<Channel> {
        let preferred = self
            .capable(self.config.preferred, op)
            .then_some(self.config.preferred);
        let fallback = self
            .config
            .fallback
            .filter(|ch| self.capable(*ch, op));

        match (preferred, fallback) {
            (Some(preferred), Some(fallback))
                if self.failure_count(preferred) >= self.config.failure_threshold =>
            {
                tracing::warn!(
                    from = %preferred,
                    to = %fallback,
                    failures = self.failure_count(preferred),
                    "channel degraded, using fallback"
                );
                Some(fallback)
            }
            (Some(preferred), _) => Some(preferred),
            (None, fallback) => fallback,
        }
    }

    /// Records a failed operation on a channel.
    pub fn record_failure(&mut self, channel: Channel) {
        let entry = self.failures.entry(channel).or_default();
        entry.consecutive += 1;
        entry.last_failure_at = Some(Utc::now());
    }

    /// Records a successful operation on a channel, resetting its
    /// consecutive-failure count.
    pub fn record_success(&mut self, channel: Channel) {
        self.failures.remove(&channel);
    }

    /// Returns the consecutive-failure count for a channel.
    #[must_use]
    pub fn failure_count(&self, channel: Channel) -> u32 {
        self.failures
            .get(&channel)
            .map_or(0, ChannelFailure::consecutive)
    }

    /// Returns the failure record for a channel, if it has one.
    #[must_use]
    pub fn failure(&self, channel: Channel) -> Option<ChannelFailure> {
        self.failures.get(&channel).copied()
    }

    fn capable(&self, channel: Channel, op: Operation) -> bool {
        self.capabilities
            .get(&channel)
            .is_some_and(|cap| cap.supports(op))
    }
}
