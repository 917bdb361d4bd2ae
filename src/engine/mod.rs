// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device synchronization engine.
//!
//! A [`SyncEngine`] reconciles status from up to four inbound sources
//! (broadcast scans, remote polling, push notifications, the relay) into
//! one authoritative snapshot, coalesces user intents, and drives
//! outbound commands with retry and channel fallback. Engines for
//! different devices are fully independent; tearing one down cancels its
//! timers, scans and background tasks without touching any other engine.

mod coalescer;
mod config;
mod executor;

pub use coalescer::ChangeCoalescer;
pub use config::EngineConfig;
pub use executor::PushResult;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::channel::status_code::{self, CodeClass};
use crate::channel::{
    ApiClient, BroadcastScanner, BroadcastTransport, Channel, ChannelEvent, PollClient, RawPayload,
};
use crate::error::{ChannelError, DeviceError, Error, Result};
use crate::event::{DeviceEvent, DeviceKey, EventBus};
use crate::family::DeviceFamily;
use crate::retry::{AttemptError, RetryOrchestrator, check_envelope};
use crate::select::{ChannelCapability, ConnectionSelector, Operation};
use crate::state::{ApplyOutcome, Connectivity, DeviceState, Intent, Source, StateStore};

/// Per-device state synchronization engine.
///
/// The engine is the object a binding layer holds per device. It is
/// cheap to clone (clones share the same engine) and internally
/// synchronized; all methods take `&self`.
///
/// # Examples
///
/// ```no_run
/// use homesync_lib::channel::{ApiConfig, NoBroadcast};
/// use homesync_lib::engine::SyncEngine;
/// use homesync_lib::family::DeviceFamily;
/// use homesync_lib::state::{Field, FieldValue, Intent};
/// use homesync_lib::types::PowerState;
/// use homesync_lib::DeviceKey;
///
/// # async fn example() -> homesync_lib::Result<()> {
/// let api = ApiConfig::new("https://api.example.com/v1.1", "token", "secret")
///     .into_client()?;
///
/// let engine = SyncEngine::<NoBroadcast>::builder(DeviceKey::new("AA:BB:CC:DD:EE:FF"), DeviceFamily::Plug)
///     .with_api(api)
///     .build();
/// engine.start();
///
/// engine.submit_intent(
///     Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On)),
/// )?;
///
/// println!("{:?}", engine.snapshot());
/// engine.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SyncEngine<T: BroadcastTransport> {
    inner: Arc<EngineInner<T>>,
}

impl<T: BroadcastTransport> Clone for SyncEngine<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Shared engine internals.
#[derive(Debug)]
pub(crate) struct EngineInner<T: BroadcastTransport> {
    pub(crate) key: DeviceKey,
    pub(crate) family: DeviceFamily,
    pub(crate) config: EngineConfig,
    pub(crate) store: Mutex<StateStore>,
    pub(crate) selector: Mutex<ConnectionSelector>,
    pub(crate) api: Option<ApiClient>,
    pub(crate) broadcast: Option<BroadcastScanner<T>>,
    pub(crate) retry: RetryOrchestrator,
    pub(crate) events: EventBus,
    coalescer: ChangeCoalescer,
    /// One-in-flight push token: a new cycle only starts when no cycle
    /// holds it.
    cycle_active: AtomicBool,
    started: AtomicBool,
    shutdown: AtomicBool,
    confirm_timer: Mutex<Option<JoinHandle<()>>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl<T: BroadcastTransport> SyncEngine<T> {
    /// Starts building an engine for one device.
    #[must_use]
    pub fn builder(key: DeviceKey, family: DeviceFamily) -> SyncEngineBuilder<T> {
        SyncEngineBuilder {
            key,
            family,
            config: EngineConfig::default(),
            api: None,
            transport: None,
            events: None,
            initial: None,
        }
    }

    /// Returns the device key.
    #[must_use]
    pub fn key(&self) -> &DeviceKey {
        &self.inner.key
    }

    /// Returns the device family.
    #[must_use]
    pub fn family(&self) -> DeviceFamily {
        self.inner.family
    }

    /// Returns an immutable copy of the current device state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.inner.store.lock().snapshot()
    }

    /// Subscribes to this engine's device events.
    #[must_use]
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DeviceEvent> {
        self.inner.events.subscribe()
    }

    /// Starts the engine's background work (the polling loop, when a
    /// remote API is configured). Calling it twice is a no-op.
    pub fn start(&self) {
        if self.inner.started.swap(true, Ordering::SeqCst) {
            return;
        }
        let Some(api) = self.inner.api.clone() else {
            return;
        };

        let poll = PollClient::new(
            api,
            self.inner.key.clone(),
            self.inner.config.poll_interval(),
            self.inner.retry,
        );
        let weak = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(poll.run(move |outcome| {
            let Some(inner) = weak.upgrade() else {
                return false;
            };
            if inner.shutdown.load(Ordering::SeqCst) {
                return false;
            }
            inner.handle_poll_outcome(outcome);
            true
        }));
        self.inner.tasks.lock().push(handle);
    }

    /// Submits a user intent.
    ///
    /// The intent is merged into the pending slot and flushed as one
    /// push cycle once the debounce window elapses with no further
    /// submissions. An intent arriving while a cycle is executing is
    /// queued for the next cycle, never interleaved with the current
    /// one.
    ///
    /// # Errors
    ///
    /// Returns an error if the intent names fields outside the device
    /// family's schema or the engine is shut down.
    pub fn submit_intent(&self, intent: Intent) -> Result<()> {
        if self.inner.shutdown.load(Ordering::SeqCst) {
            return Err(Error::Device(DeviceError::CommandRejected(
                "engine is shut down".to_string(),
            )));
        }
        self.inner.store.lock().enqueue(intent)?;
        EngineInner::schedule_flush(&self.inner);
        Ok(())
    }

    /// Fetches the device's current status over the selected channel and
    /// applies it.
    ///
    /// When the preferred channel fails, the fallback (if configured and
    /// capable) is tried within the same call. When no channel is usable
    /// the offline-default state is applied without touching any
    /// transport.
    ///
    /// # Errors
    ///
    /// Returns the final channel error when every tried channel failed.
    pub async fn refresh(&self) -> Result<()> {
        EngineInner::refresh(&self.inner).await
    }

    /// Shuts the engine down: cancels the debounce timer (dropping any
    /// pending intent), the confirmatory refresh, and all background
    /// tasks. In-flight remote requests are left to finish on their own;
    /// no further action follows them.
    pub fn shutdown(&self) {
        if self.inner.shutdown.swap(true, Ordering::SeqCst) {
            return;
        }
        self.inner.coalescer.cancel();
        self.inner.store.lock().clear_pending();
        if let Some(timer) = self.inner.confirm_timer.lock().take() {
            timer.abort();
        }
        for task in self.inner.tasks.lock().drain(..) {
            task.abort();
        }
        tracing::debug!(device = %self.inner.key, "engine shut down");
    }

    /// Forwards a push notification context to the codec.
    pub(crate) fn ingest_push(&self, context: serde_json::Value) {
        self.inner
            .ingest(RawPayload::Json(context), Channel::Push, Utc::now());
    }
}

impl<T: BroadcastTransport> EngineInner<T> {
    /// Ingests one raw payload: decode, apply, publish.
    ///
    /// Decode and schema failures are logged once and discarded without
    /// mutating state. A successfully applied payload also proves the
    /// device reachable.
    pub(crate) fn ingest(&self, payload: RawPayload, channel: Channel, at: DateTime<Utc>) {
        let update = match crate::codec::decode(&payload, channel, self.family) {
            Ok(update) => update,
            Err(error) => {
                tracing::warn!(device = %self.key, %channel, %error, "discarding undecodable payload");
                return;
            }
        };

        let (outcome, now_reachable) = {
            let mut store = self.store.lock();
            let outcome = match store.apply(&update, channel.source(), at) {
                Ok(outcome) => outcome,
                Err(error) => {
                    tracing::warn!(device = %self.key, %channel, %error, "discarding invalid update");
                    return;
                }
            };
            let now_reachable = store.set_connectivity(Connectivity::Reachable);
            (outcome, now_reachable)
        };

        self.publish_apply(&outcome, channel.source());
        if now_reachable {
            self.events.publish(DeviceEvent::ConnectivityChanged {
                key: self.key.clone(),
                connectivity: Connectivity::Reachable,
            });
        }
    }

    /// Applies the family's documented offline-default state.
    pub(crate) fn apply_offline_defaults(&self) {
        let update = self.family.offline_defaults();
        let outcome = self
            .store
            .lock()
            .apply(&update, Source::Error, Utc::now());
        match outcome {
            Ok(outcome) => self.publish_apply(&outcome, Source::Error),
            Err(error) => {
                tracing::error!(device = %self.key, %error, "offline defaults rejected by schema");
            }
        }
    }

    /// Publishes the events resulting from an applied update.
    pub(crate) fn publish_apply(&self, outcome: &ApplyOutcome, source: Source) {
        if !outcome.changed.is_empty() {
            self.events.publish(DeviceEvent::StateChanged {
                key: self.key.clone(),
                fields: outcome.changed.clone(),
                source,
            });
        }
        if let Some(connectivity) = outcome.connectivity_changed {
            self.events.publish(DeviceEvent::ConnectivityChanged {
                key: self.key.clone(),
                connectivity,
            });
        }
    }

    fn handle_poll_outcome(&self, outcome: std::result::Result<ChannelEvent, ChannelError>) {
        match outcome {
            Ok(event) => {
                self.selector.lock().record_success(Channel::Poll);
                self.ingest(event.payload, event.channel, event.received_at);
            }
            Err(ChannelError::Remote { code, description })
                if matches!(status_code::classify(code), CodeClass::Offline) =>
            {
                // The channel answered; the device itself is gone.
                tracing::warn!(device = %self.key, code, description, "remote reports device offline");
                self.selector.lock().record_success(Channel::Poll);
                self.apply_offline_defaults();
            }
            Err(error) => {
                tracing::warn!(device = %self.key, %error, "status poll failed");
                self.selector.lock().record_failure(Channel::Poll);
                let changed = self
                    .store
                    .lock()
                    .set_connectivity(Connectivity::Unreachable);
                if changed {
                    self.events.publish(DeviceEvent::ConnectivityChanged {
                        key: self.key.clone(),
                        connectivity: Connectivity::Unreachable,
                    });
                }
            }
        }
    }

    /// (Re)starts the debounce timer toward a push cycle.
    fn schedule_flush(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        inner.coalescer.schedule(move || async move {
            if let Some(inner) = weak.upgrade() {
                Self::run_push_cycle(&inner).await;
            }
        });
    }

    /// Runs push cycles until the pending slot stays empty.
    ///
    /// The cycle token guarantees at most one cycle in flight; a flush
    /// firing while a cycle runs leaves its intent pending and the
    /// running cycle picks it up before releasing the token.
    async fn run_push_cycle(inner: &Arc<Self>) {
        if inner.shutdown.load(Ordering::SeqCst) {
            return;
        }
        if inner.cycle_active.swap(true, Ordering::SeqCst) {
            return;
        }
        loop {
            let intent = inner.store.lock().take_pending();
            if let Some(intent) = intent.filter(|intent| !intent.is_empty()) {
                let completed = executor::run_cycle(inner, intent).await;
                if completed {
                    inner.events.publish(DeviceEvent::PushCompleted {
                        key: inner.key.clone(),
                    });
                    Self::schedule_confirm_refresh(inner);
                }
            }

            inner.cycle_active.store(false, Ordering::SeqCst);
            let more_pending =
                inner.store.lock().has_pending() && !inner.shutdown.load(Ordering::SeqCst);
            if more_pending && !inner.cycle_active.swap(true, Ordering::SeqCst) {
                continue;
            }
            break;
        }
    }

    /// Schedules the confirmatory refresh that reconciles server-side
    /// adjustments (for example clamped values) after a push cycle.
    fn schedule_confirm_refresh(inner: &Arc<Self>) {
        let weak = Arc::downgrade(inner);
        let delay = inner.config.confirm_delay();
        let mut timer = inner.confirm_timer.lock();
        if let Some(pending) = timer.take() {
            pending.abort();
        }
        *timer = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = weak.upgrade() else { return };
            if inner.shutdown.load(Ordering::SeqCst) {
                return;
            }
            if let Err(error) = Self::refresh(&inner).await {
                tracing::warn!(device = %inner.key, %error, "confirmatory refresh failed");
            }
        }));
    }

    /// Refreshes over the selected channel, falling back once within the
    /// same call when the preferred channel fails.
    pub(crate) async fn refresh(inner: &Arc<Self>) -> Result<()> {
        let route = inner.selector.lock().choose(Operation::Refresh);
        let Some(route) = route else {
            tracing::warn!(device = %inner.key, "no usable refresh channel, applying offline defaults");
            inner.apply_offline_defaults();
            return Ok(());
        };

        match inner.refresh_via(route).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::warn!(device = %inner.key, channel = %route, %error, "refresh failed");
                inner.selector.lock().record_failure(route);
                let changed = inner
                    .store
                    .lock()
                    .set_connectivity(Connectivity::Unreachable);
                if changed {
                    inner.events.publish(DeviceEvent::ConnectivityChanged {
                        key: inner.key.clone(),
                        connectivity: Connectivity::Unreachable,
                    });
                }

                let second = inner.selector.lock().choose(Operation::Refresh);
                if let Some(second) = second
                    && second != route
                {
                    match inner.refresh_via(second).await {
                        Ok(()) => return Ok(()),
                        Err(second_error) => {
                            tracing::warn!(
                                device = %inner.key,
                                channel = %second,
                                error = %second_error,
                                "fallback refresh failed"
                            );
                            inner.selector.lock().record_failure(second);
                            return Err(second_error.into());
                        }
                    }
                }
                Err(error.into())
            }
        }
    }

    async fn refresh_via(&self, route: Channel) -> std::result::Result<(), ChannelError> {
        match route {
            Channel::Broadcast => {
                let scanner = self.broadcast.as_ref().ok_or_else(|| {
                    ChannelError::Unavailable("no broadcast transport configured".to_string())
                })?;
                let advertisement = scanner.scan_for(&self.key, self.family).await?;
                self.selector.lock().record_success(Channel::Broadcast);
                self.ingest(
                    RawPayload::Frame(advertisement.service_data),
                    Channel::Broadcast,
                    Utc::now(),
                );
                Ok(())
            }
            Channel::Poll => {
                let api = self.api.as_ref().ok_or_else(|| {
                    ChannelError::Unavailable("remote API not configured".to_string())
                })?;
                let outcome = self
                    .retry
                    .run(|_attempt| async {
                        match api.fetch_status(&self.key).await {
                            Ok(envelope) => check_envelope(envelope),
                            Err(error) => Err(AttemptError::from_channel(error)),
                        }
                    })
                    .await;
                match outcome {
                    Ok(envelope) => {
                        self.selector.lock().record_success(Channel::Poll);
                        self.ingest(RawPayload::Json(envelope.body), Channel::Poll, Utc::now());
                        Ok(())
                    }
                    Err(ChannelError::Remote { code, description })
                        if matches!(status_code::classify(code), CodeClass::Offline) =>
                    {
                        tracing::warn!(device = %self.key, code, description, "remote reports device offline");
                        self.selector.lock().record_success(Channel::Poll);
                        self.apply_offline_defaults();
                        Ok(())
                    }
                    Err(error) => Err(error),
                }
            }
            Channel::Push => Err(ChannelError::Unavailable(
                "push channel cannot refresh".to_string(),
            )),
        }
    }
}

/// Builder for [`SyncEngine`].
#[derive(Debug)]
pub struct SyncEngineBuilder<T: BroadcastTransport> {
    key: DeviceKey,
    family: DeviceFamily,
    config: EngineConfig,
    api: Option<ApiClient>,
    transport: Option<Arc<T>>,
    events: Option<EventBus>,
    initial: Option<DeviceState>,
}

impl<T: BroadcastTransport> SyncEngineBuilder<T> {
    /// Sets the engine configuration.
    #[must_use]
    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Configures the remote API channel.
    #[must_use]
    pub fn with_api(mut self, api: ApiClient) -> Self {
        self.api = Some(api);
        self
    }

    /// Configures the broadcast channel.
    #[must_use]
    pub fn with_broadcast(mut self, transport: Arc<T>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Shares an existing event bus (the registry's, usually) instead of
    /// creating a private one.
    #[must_use]
    pub fn with_event_bus(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Seeds the engine with a persisted last-known state.
    #[must_use]
    pub fn with_initial_state(mut self, state: DeviceState) -> Self {
        self.initial = Some(state);
        self
    }

    /// Builds the engine. Call [`SyncEngine::start`] to begin polling.
    #[must_use]
    pub fn build(self) -> SyncEngine<T> {
        let mut selector = ConnectionSelector::new(self.config.selector());
        if self.api.is_some() {
            selector = selector.with_capability(Channel::Poll, ChannelCapability::FULL);
        }
        if self.transport.is_some() {
            selector = selector.with_capability(
                Channel::Broadcast,
                ChannelCapability {
                    refresh: true,
                    push: !self.family.push_order().is_empty(),
                },
            );
        }

        let store = match self.initial {
            Some(state) => StateStore::with_initial(self.family, state),
            None => StateStore::new(self.family),
        };

        let broadcast = self
            .transport
            .map(|t| BroadcastScanner::new(t).with_window(self.config.scan_window()));

        let inner = EngineInner {
            key: self.key,
            family: self.family,
            store: Mutex::new(store),
            selector: Mutex::new(selector),
            api: self.api,
            broadcast,
            retry: RetryOrchestrator::new(self.config.retry()),
            events: self.events.unwrap_or_default(),
            coalescer: ChangeCoalescer::new(self.config.debounce_window()),
            cycle_active: AtomicBool::new(false),
            started: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            confirm_timer: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
            config: self.config,
        };

        SyncEngine {
            inner: Arc::new(inner),
        }
    }
}
