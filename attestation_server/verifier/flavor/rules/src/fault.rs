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

//! Fault taxonomy: the closed set of reasons a rule marks a host untrusted.

use std::fmt;
use std::str::FromStr;

use flavor_common_verifier::{Event, PcrBank, PcrValue};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::VerifyError;
use crate::measurement_xml::XmlMeasurement;

/// Namespace every fault name is published under
pub const FAULT_NAME_PREFIX: &str = "com.intel.mtwilson.core.verifier.policy.fault.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FaultKind {
    PcrManifestMissing,
    PcrValueMissing,
    PcrValueMismatch(PcrBank),
    PcrEventLogMissing,
    PcrEventLogContainsUnexpectedEntries,
    PcrEventLogMissingExpectedEntries,
    PcrEventLogInvalid,
    AikCertificateMissing,
    AikCertificateExpired,
    AikCertificateNotYetValid,
    AikCertificateNotTrusted,
    TagCertificateMissing,
    TagCertificateExpired,
    TagCertificateNotYetValid,
    TagCertificateNotTrusted,
    FlavorSignatureMissing,
    FlavorSignatureNotTrusted,
    FlavorSignatureVerificationFailed,
    XmlMeasurementLogMissing,
    XmlMeasurementLogInvalid,
    XmlMeasurementLogContainsUnexpectedEntries,
    XmlMeasurementLogMissingExpectedEntries,
    XmlMeasurementValueMismatch,
    XmlMeasurementsDigestValueMismatch,
    AllOfFlavorsMissing,
}

impl FaultKind {
    const SIMPLE_KINDS: [FaultKind; 24] = [
        FaultKind::PcrManifestMissing,
        FaultKind::PcrValueMissing,
        FaultKind::PcrEventLogMissing,
        FaultKind::PcrEventLogContainsUnexpectedEntries,
        FaultKind::PcrEventLogMissingExpectedEntries,
        FaultKind::PcrEventLogInvalid,
        FaultKind::AikCertificateMissing,
        FaultKind::AikCertificateExpired,
        FaultKind::AikCertificateNotYetValid,
        FaultKind::AikCertificateNotTrusted,
        FaultKind::TagCertificateMissing,
        FaultKind::TagCertificateExpired,
        FaultKind::TagCertificateNotYetValid,
        FaultKind::TagCertificateNotTrusted,
        FaultKind::FlavorSignatureMissing,
        FaultKind::FlavorSignatureNotTrusted,
        FaultKind::FlavorSignatureVerificationFailed,
        FaultKind::XmlMeasurementLogMissing,
        FaultKind::XmlMeasurementLogInvalid,
        FaultKind::XmlMeasurementLogContainsUnexpectedEntries,
        FaultKind::XmlMeasurementLogMissingExpectedEntries,
        FaultKind::XmlMeasurementValueMismatch,
        FaultKind::XmlMeasurementsDigestValueMismatch,
        FaultKind::AllOfFlavorsMissing,
    ];

    /// Name without the namespace, e.g. `PcrValueMismatchSHA256`
    pub fn short_name(&self) -> String {
        match self {
            Self::PcrValueMismatch(bank) => format!("PcrValueMismatch{}", bank),
            other => format!("{:?}", other),
        }
    }

    /// Fully qualified name as published in reports
    pub fn full_name(&self) -> String {
        format!("{}{}", FAULT_NAME_PREFIX, self.short_name())
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

impl FromStr for FaultKind {
    type Err = VerifyError;

    /// Accepts the short or the fully qualified name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let short = s.trim().strip_prefix(FAULT_NAME_PREFIX).unwrap_or(s.trim());
        if let Some(bank) = short.strip_prefix("PcrValueMismatch") {
            let bank = PcrBank::from_str(bank)
                .map_err(|_| VerifyError::InternalError(format!("Unknown fault name: '{}'", s)))?;
            return Ok(Self::PcrValueMismatch(bank));
        }
        Self::SIMPLE_KINDS
            .iter()
            .find(|kind| kind.short_name() == short)
            .copied()
            .ok_or_else(|| VerifyError::InternalError(format!("Unknown fault name: '{}'", s)))
    }
}

impl Serialize for FaultKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FaultKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        FaultKind::from_str(&name).map_err(serde::de::Error::custom)
    }
}

/// One discrepancy with the evidence that supports it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fault {
    #[serde(rename = "name")]
    pub kind: FaultKind,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr_index: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr_bank: Option<PcrBank>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_entries: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unexpected_entries: Vec<Event>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_measurements: Vec<XmlMeasurement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unexpected_measurements: Vec<XmlMeasurement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mismatch_measurements: Vec<XmlMeasurement>,
}

impl Fault {
    pub fn new(kind: FaultKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
            pcr_index: None,
            pcr_bank: None,
            expected_value: None,
            actual_value: None,
            missing_entries: Vec::new(),
            unexpected_entries: Vec::new(),
            missing_measurements: Vec::new(),
            unexpected_measurements: Vec::new(),
            mismatch_measurements: Vec::new(),
        }
    }

    pub fn name(&self) -> String {
        self.kind.full_name()
    }

    pub fn with_pcr(mut self, index: u8, bank: PcrBank) -> Self {
        self.pcr_index = Some(index);
        self.pcr_bank = Some(bank);
        self
    }

    pub fn with_values(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected_value = Some(expected.into());
        self.actual_value = Some(actual.into());
        self
    }

    pub fn with_missing_entries(mut self, events: Vec<Event>) -> Self {
        self.missing_entries = events;
        self
    }

    pub fn with_unexpected_entries(mut self, events: Vec<Event>) -> Self {
        self.unexpected_entries = events;
        self
    }

    pub fn pcr_manifest_missing() -> Self {
        Self::new(FaultKind::PcrManifestMissing, "Host report does not include a PCR manifest")
    }

    pub fn pcr_value_missing(index: u8, bank: PcrBank) -> Self {
        Self::new(FaultKind::PcrValueMissing, format!("Host report does not include PCR {} in bank {}", index, bank))
            .with_pcr(index, bank)
    }

    pub fn pcr_value_mismatch(expected: &PcrValue, actual: &PcrValue) -> Self {
        let bank = expected.pcr.bank;
        Self::new(
            FaultKind::PcrValueMismatch(bank),
            format!("Host PCR {} with value '{}' does not match expected value '{}'", expected.pcr, actual.value, expected.value),
        )
        .with_pcr(expected.pcr.index, bank)
        .with_values(expected.value.clone(), actual.value.clone())
    }

    pub fn pcr_event_log_missing(index: u8, bank: PcrBank) -> Self {
        Self::new(
            FaultKind::PcrEventLogMissing,
            format!("Host report does not include an event log for PCR {} in bank {}", index, bank),
        )
        .with_pcr(index, bank)
    }

    pub fn pcr_event_log_invalid(index: u8, bank: PcrBank) -> Self {
        Self::new(
            FaultKind::PcrEventLogInvalid,
            format!("Event log for PCR {} in bank {} does not replay to the reported value", index, bank),
        )
        .with_pcr(index, bank)
    }
}
