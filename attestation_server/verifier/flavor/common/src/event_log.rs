/*
 * Copyright (c) Huawei Technologies Co., Ltd. 2025. All rights reserved.
 * Global Trust Authority is licensed under the Mulan PSL v2.
 * You can use this software according to the terms and conditions of the Mulan PSL v2.
 * You may obtain a copy of Mulan PSL v2 at:
 *     http://license.coscl.org.cn/MulanPSL2
 * THIS SOFTWARE IS PROVIDED ON AN "AS IS" BASIS, WITHOUT WARRANTIES OF ANY KIND, EITHER EXPRESS OR
 * IMPLIED, INCLUDING BUT NOT LIMITED TO NON-INFRINGEMENT, MERCHANTABILITY OR FIT FOR A PARTICULAR
 * PURPOSE.
 * See the Mulan PSL v2 for more details.
 */

//! TCG event logs scoped to a single PCR.
//!
//! Two operations drive the event-log rules:
//! - replay: extend a reset PCR with every event digest in log order and
//!   compare the result with the PCR value quoted by the TPM
//! - set difference: compare two logs by `(measurement, type_id)` ignoring
//!   order, optionally dropping events that carry excluded tags first

use std::collections::{BTreeSet, HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::MeasurementError;
use crate::pcr::Pcr;

/// One measured event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub type_id: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
    pub measurement: String,
}

impl Event {
    pub fn new(type_id: &str, type_name: &str, tags: &[&str], measurement: &str) -> Self {
        Self {
            type_id: type_id.to_string(),
            type_name: type_name.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
            measurement: measurement.to_string(),
        }
    }

    /// Primary key used for set difference
    fn key(&self) -> (String, String) {
        (self.measurement.trim().to_lowercase(), self.type_id.trim().to_lowercase())
    }

    /// True if any of the event's tags is in `tags`
    pub fn has_any_tag(&self, tags: &BTreeSet<String>) -> bool {
        !self.tags.is_disjoint(tags)
    }
}

/// Expected/actual pair that agree on measurement and type id but not on the
/// descriptive fields
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventFieldMismatch {
    pub expected: Event,
    pub actual: Event,
}

/// Outcome of comparing an expected log with an actual one
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EventLogDiff {
    /// In expected, not in actual
    pub missing: Vec<Event>,
    /// In actual, not in expected
    pub unexpected: Vec<Event>,
    /// Advisory only
    pub field_mismatches: Vec<EventFieldMismatch>,
}

impl EventLogDiff {
    /// No missing and no unexpected events; field mismatches do not count
    pub fn is_empty(&self) -> bool {
        self.missing.is_empty() && self.unexpected.is_empty()
    }
}

/// Ordered events extended into one PCR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub pcr: Pcr,
    #[serde(rename = "tpm_events", alias = "events", default)]
    pub events: Vec<Event>,
}

impl EventLogEntry {
    pub fn new(pcr: Pcr, events: Vec<Event>) -> Self {
        Self { pcr, events }
    }

    /// Calculates the value the TPM would hold after extending every event
    ///
    /// # Returns
    /// * `Result<String, MeasurementError>` - hex encoded cumulative digest
    ///
    /// # Errors
    /// * `MeasurementError::InputError` - if an event measurement is not valid hex
    pub fn replay(&self) -> Result<String, MeasurementError> {
        self.pcr.bank.replay(self.events.iter().map(|event| event.measurement.as_str()))
    }

    /// Events of `self` whose key does not appear in `other`
    ///
    /// # Errors
    /// * `MeasurementError::ValidationError` - if the two logs belong to different PCRs
    pub fn subtract(&self, other: &EventLogEntry) -> Result<EventLogEntry, MeasurementError> {
        self.ensure_same_pcr(other)?;

        let other_keys: HashSet<(String, String)> = other.events.iter().map(Event::key).collect();
        let events = self
            .events
            .iter()
            .filter(|event| !other_keys.contains(&event.key()))
            .cloned()
            .collect();

        Ok(EventLogEntry::new(self.pcr, events))
    }

    /// Copy of the log without events tagged with any of `exclude_tags`
    pub fn without_tags(&self, exclude_tags: &BTreeSet<String>) -> EventLogEntry {
        if exclude_tags.is_empty() {
            return self.clone();
        }
        let events = self
            .events
            .iter()
            .filter(|event| !event.has_any_tag(exclude_tags))
            .cloned()
            .collect();
        EventLogEntry::new(self.pcr, events)
    }

    /// Compares `self` as the expected log against `actual`
    ///
    /// # Errors
    /// * `MeasurementError::ValidationError` - if the two logs belong to different PCRs
    pub fn diff(&self, actual: &EventLogEntry) -> Result<EventLogDiff, MeasurementError> {
        let unexpected = actual.subtract(self)?.events;
        let missing = self.subtract(actual)?.events;

        let mut actual_by_key: HashMap<(String, String), &Event> = HashMap::new();
        for event in &actual.events {
            actual_by_key.entry(event.key()).or_insert(event);
        }

        let field_mismatches = self
            .events
            .iter()
            .filter_map(|expected| {
                actual_by_key.get(&expected.key()).and_then(|actual| {
                    if expected.type_name != actual.type_name || expected.tags != actual.tags {
                        Some(EventFieldMismatch { expected: expected.clone(), actual: (*actual).clone() })
                    } else {
                        None
                    }
                })
            })
            .collect();

        Ok(EventLogDiff { missing, unexpected, field_mismatches })
    }

    fn ensure_same_pcr(&self, other: &EventLogEntry) -> Result<(), MeasurementError> {
        if self.pcr != other.pcr {
            return Err(MeasurementError::ValidationError(format!(
                "Cannot compare event logs of different PCRs: {} and {}",
                self.pcr, other.pcr
            )));
        }
        Ok(())
    }
}
