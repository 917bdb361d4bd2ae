// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Constrained value types shared across the library.
//!
//! Every state field carries one of these types, so out-of-range values
//! are impossible to represent once a payload has been decoded.

mod color;
mod contact;
mod measure;
mod percent;
mod power;
mod rgb;

pub use color::{ColorTemp, HsbColor};
pub use contact::ContactState;
pub use measure::Celsius;
pub use percent::Percent;
pub use power::PowerState;
pub use rgb::RgbColor;
