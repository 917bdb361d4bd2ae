// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Status payload decoding.
//!
//! Pure, deterministic mapping from raw channel payloads to
//! [`StateUpdate`]s. No I/O happens here; callers log and discard
//! decode failures without mutating any state.

mod broadcast;
mod status;

pub use broadcast::decode_frame;
pub use status::{RemoteStatus, decode_json};

use crate::channel::{Channel, RawPayload};
use crate::error::DecodeError;
use crate::family::DeviceFamily;
use crate::state::StateUpdate;

/// Decodes a raw payload from any channel into a state update for one
/// device family.
///
/// Binary frames are decoded against the family's broadcast layout; JSON
/// payloads against the shared remote/push field shape. The channel tag
/// only disambiguates logging; both JSON channels share one decode table.
///
/// # Errors
///
/// Returns `DecodeError` for malformed frames, unknown model tags, or
/// unparseable JSON. A frame on a JSON channel (or vice versa) is an
/// unexpected-format error.
pub fn decode(
    raw: &RawPayload,
    channel: Channel,
    family: DeviceFamily,
) -> Result<StateUpdate, DecodeError> {
    match (raw, channel) {
        (RawPayload::Frame(frame), Channel::Broadcast) => decode_frame(frame, family),
        (RawPayload::Json(value), Channel::Poll | Channel::Push) => decode_json(value, family),
        (RawPayload::Frame(_), _) => Err(DecodeError::UnexpectedFormat(format!(
            "binary frame on {channel} channel"
        ))),
        (RawPayload::Json(_), Channel::Broadcast) => Err(DecodeError::UnexpectedFormat(
            "JSON payload on broadcast channel".to_string(),
        )),
    }
}
