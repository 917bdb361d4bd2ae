// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state, updates, intents and the store that reconciles them.

mod device_state;
mod intent;
mod store;
mod update;

pub use device_state::DeviceState;
pub use intent::Intent;
pub use store::{ApplyOutcome, StateStore};
pub use update::{Connectivity, Field, FieldValue, Source, StateUpdate, ValueKind};
