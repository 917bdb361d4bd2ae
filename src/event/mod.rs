// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device events and the broadcast bus they travel on.

mod device_event;
mod device_key;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_key::DeviceKey;
pub use event_bus::EventBus;
