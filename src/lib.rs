// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `HomeSync` Lib - state synchronization for smart-home accessories.
//!
//! This library keeps one authoritative state snapshot per physical
//! device, reconciled from up to four independent, differently-timed
//! sources, and drives outbound commands back to the device with
//! coalescing, bounded retry and channel fallback.
//!
//! # Channels
//!
//! - **Broadcast**: time-boxed scans for short-range advertisements
//! - **Poll**: periodic fetches from the signed remote status API
//! - **Push**: inbound notifications via an HTTP callback or the
//!   topic-per-device relay (feature `relay`)
//!
//! Status updates merge last-writer-wins per field in arrival order;
//! every field remembers which channel set it.
//!
//! # Quick Start
//!
//! ```no_run
//! use homesync_lib::channel::{ApiConfig, Channel, NoBroadcast};
//! use homesync_lib::engine::{EngineConfig, SyncEngine};
//! use homesync_lib::family::DeviceFamily;
//! use homesync_lib::select::SelectorConfig;
//! use homesync_lib::state::{Field, FieldValue, Intent};
//! use homesync_lib::types::{Percent, PowerState};
//! use homesync_lib::DeviceKey;
//!
//! #[tokio::main]
//! async fn main() -> homesync_lib::Result<()> {
//!     let api = ApiConfig::new("https://api.example.com/v1.1", "token", "secret")
//!         .into_client()?;
//!
//!     let engine = SyncEngine::<NoBroadcast>::builder(
//!         DeviceKey::new("AA:BB:CC:DD:EE:FF"),
//!         DeviceFamily::Bulb,
//!     )
//!     .with_api(api)
//!     .with_config(EngineConfig::new().with_selector(SelectorConfig::new(Channel::Poll)))
//!     .build();
//!
//!     // Begin background polling
//!     engine.start();
//!
//!     // Bursts of intents coalesce into one push cycle
//!     engine.submit_intent(
//!         Intent::new()
//!             .with_field(Field::Power, FieldValue::Power(PowerState::On))
//!             .with_field(Field::Level, FieldValue::Percent(Percent::new(80)?)),
//!     )?;
//!
//!     // Force a status fetch over the selected channel
//!     engine.refresh().await?;
//!     println!("{:?}", engine.snapshot());
//!
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```
//!
//! # Routing inbound pushes
//!
//! Register engines in an [`registry::EngineRegistry`] and hand a
//! [`channel::PushReceiver`] to whatever delivers notifications (an HTTP
//! callback handler, or the built-in relay adapter):
//!
//! ```no_run
//! use homesync_lib::channel::{NoBroadcast, PushReceiver};
//! use homesync_lib::registry::EngineRegistry;
//!
//! # async fn example(registry: EngineRegistry<NoBroadcast>) -> homesync_lib::Result<()> {
//! let receiver = PushReceiver::new(registry.clone());
//! let body = serde_json::json!({
//!     "context": {"deviceMac": "AA:BB:CC:DD:EE:FF", "temperature": 21.6}
//! });
//! receiver.deliver(&body).await?;
//! # Ok(())
//! # }
//! ```

pub mod channel;
pub mod codec;
pub mod command;
pub mod engine;
pub mod error;
pub mod event;
pub mod family;
pub mod registry;
pub mod retry;
pub mod select;
pub mod state;
pub mod types;

pub use channel::{ApiClient, ApiConfig, Channel, NoBroadcast, PushReceiver};
pub use engine::{EngineConfig, PushResult, SyncEngine, SyncEngineBuilder};
pub use error::{ChannelError, DecodeError, DeviceError, Error, Result, ValueError};
pub use event::{DeviceEvent, DeviceKey, EventBus};
pub use family::{DeviceFamily, FieldGroup};
pub use registry::EngineRegistry;
pub use retry::{RetryOrchestrator, RetryPolicy};
pub use select::{ConnectionSelector, SelectorConfig};
pub use state::{Connectivity, DeviceState, Field, FieldValue, Intent, Source, StateUpdate};
pub use types::{Celsius, ColorTemp, ContactState, HsbColor, Percent, PowerState, RgbColor};
