// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bounded retry with delay, shared by the poll client and push executor.

use std::time::Duration;

use crate::channel::ResponseEnvelope;
use crate::channel::status_code::{self, CodeClass};
use crate::error::ChannelError;

/// Retry bounds for remote operations.
///
/// # Examples
///
/// ```
/// use homesync_lib::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new(3, Duration::from_secs(1));
/// assert_eq!(policy.max_attempts(), 3);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// Default number of attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

    /// Default delay between attempts.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

    /// Creates a retry policy. `max_attempts` is clamped to at least 1.
    #[must_use]
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Returns the maximum number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the delay between attempts.
    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

/// A failed attempt, classified by whether retrying can help.
#[derive(Debug)]
pub enum AttemptError {
    /// Worth retrying: transport failure, timeout, rate limit, 5xx.
    Transient(ChannelError),
    /// Retrying cannot help: terminal after one attempt.
    Terminal(ChannelError),
}

impl AttemptError {
    /// Classifies a channel error.
    ///
    /// Authentication and addressing failures are terminal; everything
    /// transport-shaped is transient.
    #[must_use]
    pub fn from_channel(error: ChannelError) -> Self {
        match &error {
            ChannelError::AuthenticationFailed
            | ChannelError::InvalidAddress(_)
            | ChannelError::Unavailable(_) => Self::Terminal(error),
            _ => Self::Transient(error),
        }
    }

    /// Returns the contained channel error.
    #[must_use]
    pub fn into_inner(self) -> ChannelError {
        match self {
            Self::Transient(e) | Self::Terminal(e) => e,
        }
    }
}

/// Classifies a response envelope into an attempt outcome.
///
/// Success codes pass the envelope through. Terminal application codes
/// and offline codes fail without retry; rate-limit and unrecognized
/// codes are transient.
///
/// # Errors
///
/// Returns the classified [`AttemptError`] for non-success envelopes.
pub fn check_envelope(envelope: ResponseEnvelope) -> Result<ResponseEnvelope, AttemptError> {
    let code = envelope.status_code;
    match status_code::classify(code) {
        CodeClass::Success => Ok(envelope),
        CodeClass::Terminal | CodeClass::Offline => {
            Err(AttemptError::Terminal(ChannelError::Remote {
                code,
                description: status_code::describe(code),
            }))
        }
        CodeClass::RateLimited | CodeClass::Transient => {
            Err(AttemptError::Transient(ChannelError::Remote {
                code,
                description: status_code::describe(code),
            }))
        }
    }
}

/// Runs operations under a [`RetryPolicy`].
///
/// # Examples
///
/// ```no_run
/// use homesync_lib::retry::{RetryOrchestrator, RetryPolicy};
///
/// # async fn example() {
/// let retry = RetryOrchestrator::new(RetryPolicy::default());
/// let result: Result<u32, _> = retry.run(|_attempt| async { Ok(42) }).await;
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryOrchestrator {
    policy: RetryPolicy,
}

impl RetryOrchestrator {
    /// Creates an orchestrator with the given policy.
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// Returns the policy in force.
    #[must_use]
    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Invokes `op` until it succeeds, fails terminally, or the attempt
    /// bound is exhausted, waiting the configured delay between attempts.
    ///
    /// The closure receives the 1-based attempt number.
    ///
    /// # Errors
    ///
    /// Returns the error of the last attempt when all attempts are
    /// exhausted, or the terminal error immediately.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, ChannelError>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let max = self.policy.max_attempts();
        let mut last_error = None;

        for attempt in 1..=max {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(AttemptError::Terminal(error)) => {
                    tracing::warn!(attempt, %error, "attempt failed terminally");
                    return Err(error);
                }
                Err(AttemptError::Transient(error)) => {
                    tracing::warn!(attempt, max, %error, "attempt failed");
                    last_error = Some(error);
                    if attempt < max {
                        tokio::time::sleep(self.policy.delay()).await;
                    }
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ChannelError::ConnectionFailed("no attempts were made".to_string())))
    }
}
