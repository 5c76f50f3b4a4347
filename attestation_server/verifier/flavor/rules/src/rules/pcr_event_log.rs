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

//! Rules over the TCG event log of a single PCR.

use std::collections::BTreeSet;

use flavor_common_verifier::{EventLogEntry, HostManifest, Pcr};
use log::{debug, warn};

use super::{require_pcr_manifest, Rule};
use crate::error::VerifyError;
use crate::fault::{Fault, FaultKind};
use crate::flavor::FlavorPart;
use crate::result::{RuleInfo, RuleResult};

/// Host log must contain exactly the expected events, ignoring order.
///
/// With exclude tags, events carrying any of them are dropped from both logs
/// before comparing.
#[derive(Debug, Clone)]
pub struct PcrEventLogEquals {
    expected: EventLogEntry,
    exclude_tags: BTreeSet<String>,
    markers: Vec<FlavorPart>,
}

impl PcrEventLogEquals {
    pub fn new(expected: EventLogEntry, markers: &[FlavorPart]) -> Self {
        Self { expected, exclude_tags: BTreeSet::new(), markers: markers.to_vec() }
    }

    pub fn excluding(expected: EventLogEntry, exclude_tags: BTreeSet<String>, markers: &[FlavorPart]) -> Self {
        Self { expected, exclude_tags, markers: markers.to_vec() }
    }
}

impl Rule for PcrEventLogEquals {
    fn name(&self) -> &'static str {
        if self.exclude_tags.is_empty() {
            "PcrEventLogEquals"
        } else {
            "PcrEventLogEqualsExcluding"
        }
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers).with_expected(serde_json::to_value(&self.expected)?);
        let mut result = RuleResult::new(info);

        let Some(pcr_manifest) = require_pcr_manifest(manifest, &mut result) else {
            return Ok(result);
        };
        let pcr = self.expected.pcr;
        let Some(actual) = pcr_manifest.get_event_log(&pcr) else {
            result.add_fault(Fault::pcr_event_log_missing(pcr.index, pcr.bank));
            return Ok(result);
        };

        let expected = self.expected.without_tags(&self.exclude_tags);
        let actual = actual.without_tags(&self.exclude_tags);
        let diff = expected.diff(&actual)?;

        if !diff.unexpected.is_empty() {
            debug!("{} log has {} unexpected event(s)", pcr, diff.unexpected.len());
            result.add_fault(
                Fault::new(
                    FaultKind::PcrEventLogContainsUnexpectedEntries,
                    format!("Module manifest for {} contains {} unexpected entries", pcr, diff.unexpected.len()),
                )
                .with_pcr(pcr.index, pcr.bank)
                .with_unexpected_entries(diff.unexpected),
            );
        }
        if !diff.missing.is_empty() {
            debug!("{} log misses {} expected event(s)", pcr, diff.missing.len());
            result.add_fault(
                Fault::new(
                    FaultKind::PcrEventLogMissingExpectedEntries,
                    format!("Module manifest for {} missing {} expected entries", pcr, diff.missing.len()),
                )
                .with_pcr(pcr.index, pcr.bank)
                .with_missing_entries(diff.missing),
            );
        }
        if !diff.field_mismatches.is_empty() {
            warn!("{} log has {} event(s) with mismatched descriptive fields", pcr, diff.field_mismatches.len());
        }
        Ok(result.with_field_mismatches(diff.field_mismatches))
    }
}

/// Host log must contain at least the expected events
#[derive(Debug, Clone)]
pub struct PcrEventLogIncludes {
    expected: EventLogEntry,
    markers: Vec<FlavorPart>,
}

impl PcrEventLogIncludes {
    pub fn new(expected: EventLogEntry, markers: &[FlavorPart]) -> Self {
        Self { expected, markers: markers.to_vec() }
    }
}

impl Rule for PcrEventLogIncludes {
    fn name(&self) -> &'static str {
        "PcrEventLogIncludes"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers).with_expected(serde_json::to_value(&self.expected)?);
        let mut result = RuleResult::new(info);

        let Some(pcr_manifest) = require_pcr_manifest(manifest, &mut result) else {
            return Ok(result);
        };
        let pcr = self.expected.pcr;
        let Some(actual) = pcr_manifest.get_event_log(&pcr) else {
            result.add_fault(Fault::pcr_event_log_missing(pcr.index, pcr.bank));
            return Ok(result);
        };

        let missing = self.expected.subtract(actual)?.events;
        if !missing.is_empty() {
            result.add_fault(
                Fault::new(
                    FaultKind::PcrEventLogMissingExpectedEntries,
                    format!("Module manifest for {} missing {} expected entries", pcr, missing.len()),
                )
                .with_pcr(pcr.index, pcr.bank)
                .with_missing_entries(missing),
            );
        }
        Ok(result)
    }
}

/// Replaying the host log must reproduce the PCR value the host reported
#[derive(Debug, Clone)]
pub struct PcrEventLogIntegrity {
    pcr: Pcr,
    markers: Vec<FlavorPart>,
}

impl PcrEventLogIntegrity {
    pub fn new(pcr: Pcr, markers: &[FlavorPart]) -> Self {
        Self { pcr, markers: markers.to_vec() }
    }
}

impl Rule for PcrEventLogIntegrity {
    fn name(&self) -> &'static str {
        "PcrEventLogIntegrity"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers).with_expected(serde_json::to_value(self.pcr)?);
        let mut result = RuleResult::new(info);

        let Some(pcr_manifest) = require_pcr_manifest(manifest, &mut result) else {
            return Ok(result);
        };
        let pcr = self.pcr;
        let Some(actual_value) = pcr_manifest.get_pcr_value(&pcr) else {
            result.add_fault(Fault::pcr_value_missing(pcr.index, pcr.bank));
            return Ok(result);
        };
        let Some(event_log) = pcr_manifest.get_event_log(&pcr) else {
            result.add_fault(Fault::pcr_event_log_missing(pcr.index, pcr.bank));
            return Ok(result);
        };

        match event_log.replay() {
            Ok(replayed) if actual_value.matches(&replayed) => {},
            Ok(replayed) => {
                debug!("{} replays to {}, host reported {}", pcr, replayed, actual_value.value);
                result.add_fault(
                    Fault::pcr_event_log_invalid(pcr.index, pcr.bank).with_values(replayed, actual_value.value.clone()),
                );
            },
            Err(e) => {
                warn!("Event log for {} cannot be replayed: {}", pcr, e);
                result.add_fault(Fault::pcr_event_log_invalid(pcr.index, pcr.bank));
            },
        }
        Ok(result)
    }
}
