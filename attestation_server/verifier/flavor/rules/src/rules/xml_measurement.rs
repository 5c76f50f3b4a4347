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

//! Rules over the software measurement XML a host reports for a flavor.

use std::collections::BTreeMap;

use flavor_common_verifier::{HashAlgorithm, HostManifest};
use log::{debug, warn};
use serde_json::json;
use uuid::Uuid;

use super::Rule;
use crate::error::VerifyError;
use crate::fault::{Fault, FaultKind};
use crate::flavor::{FlavorPart, Software};
use crate::measurement_xml::{MeasurementXml, XmlMeasurement};
use crate::result::{RuleInfo, RuleResult};

/// Measurement XML of the flavor, recording `XmlMeasurementLogMissing` when absent
fn require_measurement_xml(
    manifest: &HostManifest,
    flavor_id: &Uuid,
    result: &mut RuleResult,
) -> Result<Option<MeasurementXml>, VerifyError> {
    let xml = MeasurementXml::find_for_flavor(&manifest.measurement_xmls, flavor_id)?;
    if xml.is_none() {
        result.add_fault(Fault::new(
            FaultKind::XmlMeasurementLogMissing,
            format!("Host report does not include a measurement log for flavor {}", flavor_id),
        ));
    }
    Ok(xml)
}

/// Measurement XML must use the flavor's digest algorithm
#[derive(Debug, Clone)]
pub struct XmlMeasurementLogDigestEquals {
    flavor_id: Uuid,
    digest_algorithm: HashAlgorithm,
    markers: Vec<FlavorPart>,
}

impl XmlMeasurementLogDigestEquals {
    pub fn new(flavor_id: Uuid, digest_algorithm: HashAlgorithm, markers: &[FlavorPart]) -> Self {
        Self { flavor_id, digest_algorithm, markers: markers.to_vec() }
    }
}

impl Rule for XmlMeasurementLogDigestEquals {
    fn name(&self) -> &'static str {
        "XmlMeasurementLogDigestEquals"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers)
            .with_expected(json!({ "flavor_id": self.flavor_id, "digest_algorithm": self.digest_algorithm }));
        let mut result = RuleResult::new(info);

        let Some(xml) = require_measurement_xml(manifest, &self.flavor_id, &mut result)? else {
            return Ok(result);
        };
        let actual = xml.digest_algorithm()?;
        if actual != self.digest_algorithm {
            result.add_fault(
                Fault::new(
                    FaultKind::XmlMeasurementsDigestValueMismatch,
                    format!("Measurement log uses {} instead of {}", actual, self.digest_algorithm),
                )
                .with_values(self.digest_algorithm.to_string(), actual.to_string()),
            );
        }
        Ok(result)
    }
}

/// Cumulative hash recomputed from the XML entries must equal both the value
/// the XML states and the flavor's expected value
#[derive(Debug, Clone)]
pub struct XmlMeasurementLogIntegrity {
    flavor_id: Uuid,
    expected_cumulative_hash: String,
    markers: Vec<FlavorPart>,
}

impl XmlMeasurementLogIntegrity {
    pub fn new(flavor_id: Uuid, expected_cumulative_hash: impl Into<String>, markers: &[FlavorPart]) -> Self {
        Self { flavor_id, expected_cumulative_hash: expected_cumulative_hash.into(), markers: markers.to_vec() }
    }
}

impl Rule for XmlMeasurementLogIntegrity {
    fn name(&self) -> &'static str {
        "XmlMeasurementLogIntegrity"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers).with_expected(
            json!({ "flavor_id": self.flavor_id, "cumulative_hash": self.expected_cumulative_hash }),
        );
        let mut result = RuleResult::new(info);

        let Some(xml) = require_measurement_xml(manifest, &self.flavor_id, &mut result)? else {
            return Ok(result);
        };
        let replayed = match xml.replay() {
            Ok(replayed) => replayed,
            Err(e) => {
                warn!("Measurement log of flavor {} cannot be replayed: {}", self.flavor_id, e);
                result.add_fault(Fault::new(
                    FaultKind::XmlMeasurementLogInvalid,
                    format!("Measurement log of flavor {} cannot be replayed", self.flavor_id),
                ));
                return Ok(result);
            },
        };

        let stated = xml.cumulative_hash.as_deref().unwrap_or_default();
        let matches_stated = replayed.eq_ignore_ascii_case(stated);
        let matches_expected = replayed.eq_ignore_ascii_case(self.expected_cumulative_hash.trim());
        if !matches_stated || !matches_expected {
            debug!(
                "Measurement log of flavor {} replays to {}, stated {}, expected {}",
                self.flavor_id, replayed, stated, self.expected_cumulative_hash
            );
            result.add_fault(
                Fault::new(
                    FaultKind::XmlMeasurementLogInvalid,
                    format!("Cumulative hash of the measurement log for flavor {} does not verify", self.flavor_id),
                )
                .with_values(self.expected_cumulative_hash.clone(), replayed),
            );
        }
        Ok(result)
    }
}

/// XML entries must match the flavor's software measurements path by path
#[derive(Debug, Clone)]
pub struct XmlMeasurementLogEquals {
    flavor_id: Uuid,
    expected: Vec<XmlMeasurement>,
    markers: Vec<FlavorPart>,
}

impl XmlMeasurementLogEquals {
    pub fn new(flavor_id: Uuid, software: &Software, markers: &[FlavorPart]) -> Self {
        let expected = software
            .measurements
            .iter()
            .map(|(path, measurement)| XmlMeasurement {
                measurement_type: measurement.measurement_type,
                path: path.clone(),
                value: measurement.value.clone(),
                include: measurement.include.clone(),
                exclude: measurement.exclude.clone(),
            })
            .collect();
        Self { flavor_id, expected, markers: markers.to_vec() }
    }
}

impl Rule for XmlMeasurementLogEquals {
    fn name(&self) -> &'static str {
        "XmlMeasurementLogEquals"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let info = RuleInfo::new(self.name(), &self.markers).with_expected(serde_json::to_value(&self.expected)?);
        let mut result = RuleResult::new(info);

        let Some(xml) = require_measurement_xml(manifest, &self.flavor_id, &mut result)? else {
            return Ok(result);
        };

        let actual_by_path: BTreeMap<&str, &XmlMeasurement> =
            xml.measurements.iter().map(|m| (m.path.as_str(), m)).collect();
        let expected_by_path: BTreeMap<&str, &XmlMeasurement> =
            self.expected.iter().map(|m| (m.path.as_str(), m)).collect();

        let mut missing = Vec::new();
        let mut mismatched = Vec::new();
        for (path, expected) in &expected_by_path {
            match actual_by_path.get(path) {
                None => missing.push((*expected).clone()),
                Some(actual)
                    if actual.measurement_type != expected.measurement_type
                        || !actual.value.eq_ignore_ascii_case(&expected.value) =>
                {
                    mismatched.push((*actual).clone())
                },
                Some(_) => {},
            }
        }
        let unexpected: Vec<XmlMeasurement> = actual_by_path
            .iter()
            .filter(|(path, _)| !expected_by_path.contains_key(*path))
            .map(|(_, measurement)| (*measurement).clone())
            .collect();

        if !unexpected.is_empty() {
            let mut fault = Fault::new(
                FaultKind::XmlMeasurementLogContainsUnexpectedEntries,
                format!("Measurement log for flavor {} contains {} unexpected entries", self.flavor_id, unexpected.len()),
            );
            fault.unexpected_measurements = unexpected;
            result.add_fault(fault);
        }
        if !missing.is_empty() {
            let mut fault = Fault::new(
                FaultKind::XmlMeasurementLogMissingExpectedEntries,
                format!("Measurement log for flavor {} missing {} expected entries", self.flavor_id, missing.len()),
            );
            fault.missing_measurements = missing;
            result.add_fault(fault);
        }
        if !mismatched.is_empty() {
            let mut fault = Fault::new(
                FaultKind::XmlMeasurementValueMismatch,
                format!("Measurement log for flavor {} has {} mismatched entries", self.flavor_id, mismatched.len()),
            );
            fault.mismatch_measurements = mismatched;
            result.add_fault(fault);
        }
        Ok(result)
    }
}
