// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The per-device state store.

use chrono::{DateTime, Utc};

use crate::error::DeviceError;
use crate::family::DeviceFamily;

use super::{Connectivity, DeviceState, Field, FieldValue, Intent, Source, StateUpdate};

/// Outcome of applying a status update.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ApplyOutcome {
    /// Fields whose values changed.
    pub changed: Vec<Field>,
    /// The new connectivity, if the update changed it.
    pub connectivity_changed: Option<Connectivity>,
}

/// Holds the authoritative [`DeviceState`] and the pending [`Intent`].
///
/// All mutation of device state funnels through this store, which
/// validates every update against the device family's schema before
/// touching anything: a structurally invalid update is rejected in full,
/// never half-applied.
///
/// # Merge semantics
///
/// Fields merge last-writer-wins in *arrival order*. A stale poll
/// response that arrives after a fresher push notification will overwrite
/// it; there is no device-side-timestamp conflict resolution. This is a
/// known limitation inherited from the systems this library talks to,
/// kept deliberately rather than papered over.
///
/// # Examples
///
/// ```
/// use homesync_lib::family::DeviceFamily;
/// use homesync_lib::state::{Field, FieldValue, Source, StateStore, StateUpdate};
/// use homesync_lib::types::PowerState;
/// use chrono::Utc;
///
/// let mut store = StateStore::new(DeviceFamily::Plug);
/// let update = StateUpdate::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
/// store.apply(&update, Source::Poll, Utc::now()).unwrap();
/// assert_eq!(store.snapshot().power(), Some(PowerState::On));
/// ```
#[derive(Debug, Clone)]
pub struct StateStore {
    family: DeviceFamily,
    state: DeviceState,
    pending: Option<Intent>,
}

impl StateStore {
    /// Creates a store with empty state.
    #[must_use]
    pub fn new(family: DeviceFamily) -> Self {
        Self {
            family,
            state: DeviceState::new(),
            pending: None,
        }
    }

    /// Creates a store seeded with a persisted last-known state.
    #[must_use]
    pub fn with_initial(family: DeviceFamily, state: DeviceState) -> Self {
        Self {
            family,
            state,
            pending: None,
        }
    }

    /// Returns the device family this store validates against.
    #[must_use]
    pub fn family(&self) -> DeviceFamily {
        self.family
    }

    /// Applies a status update.
    ///
    /// The whole update is validated against the family schema first; if
    /// any field is foreign to the family or carries a mismatched value
    /// kind, nothing is mutated.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the update fails schema validation.
    pub fn apply(
        &mut self,
        update: &StateUpdate,
        source: Source,
        at: DateTime<Utc>,
    ) -> Result<ApplyOutcome, DeviceError> {
        self.validate(update.fields().iter().map(|(f, v)| (*f, *v)))?;

        let previous_connectivity = self.state.connectivity();
        let changed = self.state.merge(update, source, at);
        let connectivity_changed = update
            .connectivity()
            .filter(|c| *c != previous_connectivity);

        Ok(ApplyOutcome {
            changed,
            connectivity_changed,
        })
    }

    /// Merges an intent into the single pending slot.
    ///
    /// # Errors
    ///
    /// Returns `DeviceError` if the intent names a field outside the
    /// family schema or a mismatched value kind; nothing is queued then.
    pub fn enqueue(&mut self, intent: Intent) -> Result<(), DeviceError> {
        self.validate(intent.desired().iter().map(|(f, v)| (*f, *v)))?;

        match &mut self.pending {
            Some(pending) => pending.merge(intent),
            None => self.pending = Some(intent),
        }
        Ok(())
    }

    /// Takes the pending intent, leaving the slot empty.
    pub fn take_pending(&mut self) -> Option<Intent> {
        self.pending.take()
    }

    /// Returns `true` if an intent is waiting to be pushed.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drops the pending intent without pushing it.
    pub fn clear_pending(&mut self) {
        self.pending = None;
    }

    /// Returns an immutable copy of the current state.
    #[must_use]
    pub fn snapshot(&self) -> DeviceState {
        self.state.clone()
    }

    /// Marks fields as having failed their last outbound command,
    /// preserving their values.
    pub fn mark_error(&mut self, fields: &[Field]) {
        self.state.mark_error(fields);
    }

    /// Sets the connectivity assessment. Returns `true` if it changed.
    pub fn set_connectivity(&mut self, connectivity: Connectivity) -> bool {
        self.state.set_connectivity(connectivity)
    }

    fn validate(
        &self,
        fields: impl Iterator<Item = (Field, FieldValue)>,
    ) -> Result<(), DeviceError> {
        for (field, value) in fields {
            if !self.family.carries(field) {
                return Err(DeviceError::UnsupportedField {
                    family: self.family.to_string(),
                    field: field.to_string(),
                });
            }
            if field.kind() != value.kind() {
                return Err(DeviceError::ValueKindMismatch {
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }
}
