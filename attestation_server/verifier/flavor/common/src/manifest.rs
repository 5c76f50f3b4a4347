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

//! Host manifest: the attested state of a host as collected by a host
//! connector. The verifier only ever reads it.

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::MeasurementError;
use crate::event_log::EventLogEntry;
use crate::pcr::{Pcr, PcrBank, PcrValue};

/// Upper bound on the serialized manifest accepted by the parsers
pub const MAX_MANIFEST_SIZE: usize = 5 * 1024 * 1024;

/// Descriptive host information reported alongside the measurements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostInfo {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub hardware_uuid: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub os_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub os_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bios_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bios_version: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub vmm_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub tpm_version: String,
}

/// PCR values of every bank plus the event logs keyed by bank
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PcrManifest {
    #[serde(rename = "sha1pcrs", default)]
    pub sha1_pcrs: Vec<PcrValue>,
    #[serde(rename = "sha2pcrs", default)]
    pub sha2_pcrs: Vec<PcrValue>,
    #[serde(alias = "pcr_event_log_map_new", default)]
    pub pcr_event_log_map: BTreeMap<PcrBank, Vec<EventLogEntry>>,
}

impl PcrManifest {
    /// True when the host reported neither PCR values nor event logs
    pub fn is_empty(&self) -> bool {
        self.sha1_pcrs.is_empty()
            && self.sha2_pcrs.is_empty()
            && self.pcr_event_log_map.values().all(|entries| entries.is_empty())
    }

    pub fn get_pcr_value(&self, pcr: &Pcr) -> Option<&PcrValue> {
        let bank_values = match pcr.bank {
            PcrBank::Sha1 => &self.sha1_pcrs,
            _ => &self.sha2_pcrs,
        };
        bank_values.iter().find(|value| value.pcr == *pcr)
    }

    pub fn get_event_log(&self, pcr: &Pcr) -> Option<&EventLogEntry> {
        self.pcr_event_log_map
            .get(&pcr.bank)
            .and_then(|entries| entries.iter().find(|entry| entry.pcr == *pcr))
    }

    /// Checks digest formats, duplicate PCRs and that every event log sits
    /// under the bank it claims
    pub fn validate(&self) -> Result<(), MeasurementError> {
        let mut seen = std::collections::HashSet::new();
        for value in self.sha1_pcrs.iter().chain(self.sha2_pcrs.iter()) {
            value.validate()?;
            if !seen.insert(value.pcr) {
                return Err(MeasurementError::ValidationError(format!("Duplicate PCR value for {}", value.pcr)));
            }
        }
        if self.sha1_pcrs.iter().any(|value| value.pcr.bank != PcrBank::Sha1) {
            return Err(MeasurementError::ValidationError("sha1pcrs contains a non SHA1 PCR".to_string()));
        }
        if self.sha2_pcrs.iter().any(|value| value.pcr.bank == PcrBank::Sha1) {
            return Err(MeasurementError::ValidationError("sha2pcrs contains a SHA1 PCR".to_string()));
        }

        for (bank, entries) in &self.pcr_event_log_map {
            if let Some(entry) = entries.iter().find(|entry| entry.pcr.bank != *bank) {
                return Err(MeasurementError::ValidationError(format!(
                    "Event log for {} listed under bank {}",
                    entry.pcr, bank
                )));
            }
        }
        Ok(())
    }
}

/// Attested host state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostManifest {
    #[serde(default)]
    pub host_info: HostInfo,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pcr_manifest: Option<PcrManifest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aik_certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_key_certificate: Option<String>,
    /// Tag digest as reported by the host. Informational only: asset tag
    /// rules compare PCR 22 against the flavor's tag certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag_digest: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub measurement_xmls: Vec<String>,
}

impl HostManifest {
    /// Parses a manifest from JSON and validates its PCR manifest
    ///
    /// # Errors
    /// * `MeasurementError::InputError` - oversized or malformed JSON
    /// * `MeasurementError::ValidationError` - inconsistent PCR data
    pub fn from_json(json: &Value) -> Result<Self, MeasurementError> {
        if json.to_string().len() > MAX_MANIFEST_SIZE {
            return Err(MeasurementError::InputError("Host manifest exceeds 5MB limit".to_string()));
        }
        let manifest: HostManifest = serde_json::from_value(json.clone())
            .map_err(|e| MeasurementError::InputError(format!("Failed to parse host manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Same as [`HostManifest::from_json`] for raw bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, MeasurementError> {
        if bytes.len() > MAX_MANIFEST_SIZE {
            return Err(MeasurementError::InputError("Host manifest exceeds 5MB limit".to_string()));
        }
        let manifest: HostManifest = serde_json::from_slice(bytes)
            .map_err(|e| MeasurementError::InputError(format!("Failed to parse host manifest: {}", e)))?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), MeasurementError> {
        if let Some(pcr_manifest) = &self.pcr_manifest {
            pcr_manifest.validate()?;
        }
        debug!(
            "Host manifest for '{}' carries {} measurement xml(s)",
            self.host_info.host_name,
            self.measurement_xmls.len()
        );
        Ok(())
    }

    /// PCR manifest, treating an empty one as absent
    pub fn pcr_manifest(&self) -> Option<&PcrManifest> {
        self.pcr_manifest.as_ref().filter(|manifest| !manifest.is_empty())
    }
}
