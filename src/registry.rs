// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine registry: the composition root's map from device to engine.
//!
//! Inbound push and relay traffic is routed by device key, so something
//! has to own the key-to-engine mapping. The registry is that owner:
//! registration and deregistration are tied to engine lifecycle, and
//! there is no ambient global map anywhere else.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::channel::BroadcastTransport;
use crate::engine::SyncEngine;
use crate::event::{DeviceEvent, DeviceKey, EventBus};

/// Registry of sync engines, keyed by device.
///
/// Cheap to clone; clones share the same map and event bus. Engines
/// registered here should be built with the registry's event bus (see
/// [`event_bus`](Self::event_bus)) so one subscription observes every
/// device.
///
/// # Examples
///
/// ```no_run
/// use homesync_lib::channel::NoBroadcast;
/// use homesync_lib::engine::SyncEngine;
/// use homesync_lib::family::DeviceFamily;
/// use homesync_lib::registry::EngineRegistry;
/// use homesync_lib::DeviceKey;
///
/// # async fn example() {
/// let registry: EngineRegistry<NoBroadcast> = EngineRegistry::new();
///
/// let key = DeviceKey::new("AA:BB:CC:DD:EE:FF");
/// let engine = SyncEngine::builder(key.clone(), DeviceFamily::Meter)
///     .with_event_bus(registry.event_bus().clone())
///     .build();
/// registry.register(engine).await;
///
/// assert!(registry.get(&key).await.is_some());
/// # }
/// ```
#[derive(Debug)]
pub struct EngineRegistry<T: BroadcastTransport> {
    engines: Arc<RwLock<HashMap<DeviceKey, SyncEngine<T>>>>,
    events: EventBus,
}

impl<T: BroadcastTransport> Clone for EngineRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            engines: Arc::clone(&self.engines),
            events: self.events.clone(),
        }
    }
}

impl<T: BroadcastTransport> EngineRegistry<T> {
    /// Creates an empty registry with its own event bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            engines: Arc::new(RwLock::new(HashMap::new())),
            events: EventBus::new(),
        }
    }

    /// Returns the registry's event bus.
    #[must_use]
    pub fn event_bus(&self) -> &EventBus {
        &self.events
    }

    /// Registers an engine under its device key.
    ///
    /// A previous engine registered for the same key is shut down and
    /// replaced.
    pub async fn register(&self, engine: SyncEngine<T>) {
        let key = engine.key().clone();
        let replaced = self.engines.write().await.insert(key.clone(), engine);
        if let Some(old) = replaced {
            tracing::warn!(device = %key, "replacing registered engine");
            old.shutdown();
        }
        self.events.publish(DeviceEvent::EngineRegistered { key });
    }

    /// Deregisters and shuts down the engine for a device.
    ///
    /// Returns `true` if an engine was registered.
    pub async fn deregister(&self, key: &DeviceKey) -> bool {
        let removed = self.engines.write().await.remove(key);
        match removed {
            Some(engine) => {
                engine.shutdown();
                self.events
                    .publish(DeviceEvent::EngineRemoved { key: key.clone() });
                true
            }
            None => false,
        }
    }

    /// Looks up the engine for a device.
    pub async fn get(&self, key: &DeviceKey) -> Option<SyncEngine<T>> {
        self.engines.read().await.get(key).cloned()
    }

    /// Returns the registered device keys.
    pub async fn keys(&self) -> Vec<DeviceKey> {
        self.engines.read().await.keys().cloned().collect()
    }

    /// Returns the number of registered engines.
    pub async fn len(&self) -> usize {
        self.engines.read().await.len()
    }

    /// Returns `true` if no engine is registered.
    pub async fn is_empty(&self) -> bool {
        self.engines.read().await.is_empty()
    }

    /// Shuts down and removes every registered engine.
    pub async fn shutdown_all(&self) {
        let engines: Vec<_> = self.engines.write().await.drain().collect();
        for (key, engine) in engines {
            engine.shutdown();
            self.events.publish(DeviceEvent::EngineRemoved { key });
        }
    }
}

impl<T: BroadcastTransport> Default for EngineRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}
