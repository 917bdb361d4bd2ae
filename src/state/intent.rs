// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! User-intent mutations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use super::{Field, FieldValue};

/// A requested change to one or more state fields.
///
/// Intents submitted within the coalescing window are merged
/// last-value-wins per field; the earliest submission time survives the
/// merge so end-to-end latency stays attributable to the first request
/// in a burst.
///
/// # Examples
///
/// ```
/// use homesync_lib::state::{Field, FieldValue, Intent};
/// use homesync_lib::types::PowerState;
///
/// let intent = Intent::new().with_field(Field::Power, FieldValue::Power(PowerState::On));
/// assert_eq!(intent.desired().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Intent {
    desired: BTreeMap<Field, FieldValue>,
    submitted_at: DateTime<Utc>,
}

impl Intent {
    /// Creates an empty intent stamped with the current time.
    #[must_use]
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    /// Creates an empty intent with an explicit submission time.
    #[must_use]
    pub fn at(submitted_at: DateTime<Utc>) -> Self {
        Self {
            desired: BTreeMap::new(),
            submitted_at,
        }
    }

    /// Adds a desired field value, replacing any previous value for the
    /// same field.
    #[must_use]
    pub fn with_field(mut self, field: Field, value: FieldValue) -> Self {
        self.desired.insert(field, value);
        self
    }

    /// Returns the desired field values.
    #[must_use]
    pub fn desired(&self) -> &BTreeMap<Field, FieldValue> {
        &self.desired
    }

    /// Returns the desired value for one field, if requested.
    #[must_use]
    pub fn desired_value(&self, field: Field) -> Option<FieldValue> {
        self.desired.get(&field).copied()
    }

    /// Returns the submission time (the earliest across merged intents).
    #[must_use]
    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }

    /// Returns `true` if the intent requests no changes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.desired.is_empty()
    }

    /// Merges a newer intent into this one.
    ///
    /// Later values win per field; the earlier submission time is kept.
    pub fn merge(&mut self, newer: Intent) {
        for (field, value) in newer.desired {
            self.desired.insert(field, value);
        }
        if newer.submitted_at < self.submitted_at {
            self.submitted_at = newer.submitted_at;
        }
    }
}

impl Default for Intent {
    fn default() -> Self {
        Self::new()
    }
}
