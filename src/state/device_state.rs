// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state tracking.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::types::PowerState;

use super::{Connectivity, Field, FieldValue, Source, StateUpdate};

/// The last-known condition of one physical device.
///
/// Every field value carries a provenance entry recording which source
/// last set it. `observed_at` is the last time any field actually changed
/// and is monotonically non-decreasing for a given device.
///
/// State is mutated only through the owning
/// [`StateStore`](super::StateStore); the binding layer sees immutable
/// snapshots.
///
/// # Examples
///
/// ```
/// use homesync_lib::state::DeviceState;
///
/// let state = DeviceState::new();
/// assert!(state.fields().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DeviceState {
    fields: BTreeMap<Field, FieldValue>,
    source_of: BTreeMap<Field, Source>,
    observed_at: DateTime<Utc>,
    connectivity: Connectivity,
}

impl DeviceState {
    /// Creates a new empty device state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
            source_of: BTreeMap::new(),
            observed_at: DateTime::UNIX_EPOCH,
            connectivity: Connectivity::Unknown,
        }
    }

    /// Returns the value of a field, if known.
    #[must_use]
    pub fn field(&self, field: Field) -> Option<FieldValue> {
        self.fields.get(&field).copied()
    }

    /// Returns the source that last set a field, if the field is known.
    #[must_use]
    pub fn source_of(&self, field: Field) -> Option<Source> {
        self.source_of.get(&field).copied()
    }

    /// Returns all known field values.
    #[must_use]
    pub fn fields(&self) -> &BTreeMap<Field, FieldValue> {
        &self.fields
    }

    /// Returns the last time any field changed.
    #[must_use]
    pub fn observed_at(&self) -> DateTime<Utc> {
        self.observed_at
    }

    /// Returns the current connectivity assessment.
    #[must_use]
    pub fn connectivity(&self) -> Connectivity {
        self.connectivity
    }

    /// Returns the known power state, if any.
    #[must_use]
    pub fn power(&self) -> Option<PowerState> {
        self.field(Field::Power).and_then(|v| v.as_power())
    }

    /// Merges a pre-validated update into the state.
    ///
    /// Fields are overwritten last-writer-wins in arrival order; the
    /// provenance of each changed field is set to `source`. `observed_at`
    /// advances to `at` only when something actually changed and `at` is
    /// newer, keeping it monotonic. Returns the fields that changed.
    pub(crate) fn merge(
        &mut self,
        update: &StateUpdate,
        source: Source,
        at: DateTime<Utc>,
    ) -> Vec<Field> {
        let mut changed = Vec::new();
        for (field, value) in update.fields() {
            if self.fields.get(field) != Some(value) {
                self.fields.insert(*field, *value);
                self.source_of.insert(*field, source);
                changed.push(*field);
            }
        }
        if !changed.is_empty() && at > self.observed_at {
            self.observed_at = at;
        }
        if let Some(connectivity) = update.connectivity() {
            self.connectivity = connectivity;
        }
        changed
    }

    /// Marks fields as having failed their last outbound command.
    ///
    /// Values are preserved; only the provenance flips to
    /// [`Source::Error`]. Fields with no known value are skipped.
    pub(crate) fn mark_error(&mut self, fields: &[Field]) {
        for field in fields {
            if self.fields.contains_key(field) {
                self.source_of.insert(*field, Source::Error);
            }
        }
    }

    /// Sets the connectivity assessment. Returns `true` if it changed.
    pub(crate) fn set_connectivity(&mut self, connectivity: Connectivity) -> bool {
        if self.connectivity == connectivity {
            false
        } else {
            self.connectivity = connectivity;
            true
        }
    }
}

impl Default for DeviceState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Percent;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn new_state_is_empty() {
        let state = DeviceState::new();
        assert!(state.fields().is_empty());
        assert!(state.power().is_none());
        assert_eq!(state.connectivity(), Connectivity::Unknown);
    }

    #[test]
    fn merge_sets_fields_and_provenance() {
        let mut state = DeviceState::new();
        let update = StateUpdate::new()
            .with_field(Field::Power, FieldValue::Power(PowerState::On))
            .with_field(Field::Level, FieldValue::Percent(Percent::new(80).unwrap()));

        let changed = state.merge(&update, Source::Poll, at(10));

        assert_eq!(changed.len(), 2);
        assert_eq!(state.power(), Some(PowerState::On));
        assert_eq!(state.source_of(Field::Power), Some(Source::Poll));
        assert_eq!(state.observed_at(), at(10));
    }

    #[test]
    fn merge_is_idempotent() {
        let mut state = DeviceState::new();
        let update = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));

        state.merge(&update, Source::Poll, at(10));
        let snapshot = state.clone();

        let changed = state.merge(&update, Source::Poll, at(10));
        assert!(changed.is_empty());
        assert_eq!(state, snapshot);
    }

    #[test]
    fn unchanged_value_keeps_previous_source() {
        let mut state = DeviceState::new();
        let update = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));

        state.merge(&update, Source::Poll, at(10));
        state.merge(&update, Source::Push, at(20));

        assert_eq!(state.source_of(Field::Power), Some(Source::Poll));
    }

    #[test]
    fn observed_at_never_regresses() {
        let mut state = DeviceState::new();
        let on = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
        let off = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::Off));

        state.merge(&on, Source::Poll, at(100));
        // A late-arriving payload still wins the field, but cannot move
        // the observation time backwards.
        state.merge(&off, Source::Push, at(50));

        assert_eq!(state.power(), Some(PowerState::Off));
        assert_eq!(state.observed_at(), at(100));
    }

    #[test]
    fn mark_error_preserves_values() {
        let mut state = DeviceState::new();
        let update = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
        state.merge(&update, Source::Poll, at(10));

        state.mark_error(&[Field::Power, Field::Level]);

        assert_eq!(state.power(), Some(PowerState::On));
        assert_eq!(state.source_of(Field::Power), Some(Source::Error));
        // Level was never known, so it gains no provenance entry
        assert!(state.source_of(Field::Level).is_none());
    }

    #[test]
    fn set_connectivity_reports_change() {
        let mut state = DeviceState::new();
        assert!(state.set_connectivity(Connectivity::Reachable));
        assert!(!state.set_connectivity(Connectivity::Reachable));
    }
}
