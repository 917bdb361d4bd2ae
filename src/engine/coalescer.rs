// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Intent debouncing.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::task::JoinHandle;

/// Debounces bursts of intent submissions into single flushes.
///
/// Every [`schedule`](Self::schedule) restarts the window timer; the
/// flush runs only once the window has elapsed with no further
/// submissions, so N submissions inside one window produce exactly one
/// flush. Cancelling (or dropping) the coalescer aborts a pending timer
/// without flushing.
#[derive(Debug)]
pub struct ChangeCoalescer {
    window: Duration,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl ChangeCoalescer {
    /// Creates a coalescer with the given debounce window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            timer: Mutex::new(None),
        }
    }

    /// Returns the debounce window.
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// (Re)starts the window timer; `flush` runs when it elapses.
    ///
    /// A timer already pending from an earlier call is aborted, so only
    /// the latest scheduled flush ever runs.
    pub fn schedule<F, Fut>(&self, flush: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let window = self.window;
        let mut timer = self.timer.lock();
        if let Some(pending) = timer.take() {
            pending.abort();
        }
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(window).await;
            flush().await;
        }));
    }

    /// Aborts a pending timer without flushing.
    pub fn cancel(&self) {
        if let Some(pending) = self.timer.lock().take() {
            pending.abort();
        }
    }

    /// Returns `true` if a flush is scheduled and has not run yet.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.timer
            .lock()
            .as_ref()
            .is_some_and(|timer| !timer.is_finished())
    }
}

impl Drop for ChangeCoalescer {
    fn drop(&mut self) {
        self.cancel();
    }
}
