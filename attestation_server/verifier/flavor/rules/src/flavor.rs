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

//! Flavor model: signed reference measurements a host is compared against.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use flavor_common_verifier::{Event, EventLogEntry, Pcr, PcrValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::VerifyError;
use crate::measurement_xml::MeasurementType;

/// Part of the host a flavor describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum FlavorPart {
    #[serde(rename = "PLATFORM")]
    Platform,
    #[serde(rename = "OS")]
    Os,
    #[serde(rename = "HOST_UNIQUE")]
    HostUnique,
    #[serde(rename = "SOFTWARE")]
    Software,
    #[serde(rename = "ASSET_TAG")]
    AssetTag,
}

impl fmt::Display for FlavorPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Platform => write!(f, "PLATFORM"),
            Self::Os => write!(f, "OS"),
            Self::HostUnique => write!(f, "HOST_UNIQUE"),
            Self::Software => write!(f, "SOFTWARE"),
            Self::AssetTag => write!(f, "ASSET_TAG"),
        }
    }
}

impl FromStr for FlavorPart {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "PLATFORM" => Ok(Self::Platform),
            "OS" => Ok(Self::Os),
            "HOST_UNIQUE" => Ok(Self::HostUnique),
            "SOFTWARE" => Ok(Self::Software),
            "ASSET_TAG" => Ok(Self::AssetTag),
            _ => Err(VerifyError::InvalidFlavorPart(format!("Unknown flavor part: '{}'", s))),
        }
    }
}

/// Platform vendor, selects the rule builder together with the TPM version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Vendor {
    #[serde(rename = "INTEL")]
    Intel,
    #[serde(rename = "VMWARE")]
    VMware,
    #[serde(rename = "MICROSOFT")]
    Microsoft,
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Intel => write!(f, "INTEL"),
            Self::VMware => write!(f, "VMWARE"),
            Self::Microsoft => write!(f, "MICROSOFT"),
        }
    }
}

impl FromStr for Vendor {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INTEL" => Ok(Self::Intel),
            "VMWARE" => Ok(Self::VMware),
            "MICROSOFT" => Ok(Self::Microsoft),
            _ => Err(VerifyError::UnsupportedVendor(format!("Unknown vendor: '{}'", s))),
        }
    }
}

impl Vendor {
    /// Infers the vendor from the host operating system name
    pub fn from_os_name(os_name: &str) -> Result<Self, VerifyError> {
        let os = os_name.to_lowercase();
        if os.contains("vmware") || os.contains("esx") {
            return Ok(Self::VMware);
        }
        if os.contains("windows") || os.contains("microsoft") {
            return Ok(Self::Microsoft);
        }
        const LINUX_DISTRIBUTIONS: [&str; 8] =
            ["redhat", "rhel", "ubuntu", "centos", "fedora", "suse", "debian", "linux"];
        if LINUX_DISTRIBUTIONS.iter().any(|name| os.contains(name)) {
            return Ok(Self::Intel);
        }
        Err(VerifyError::UnsupportedVendor(format!("Cannot infer vendor from OS name '{}'", os_name)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TpmVersion {
    V12,
    V20,
}

impl fmt::Display for TpmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::V12 => write!(f, "1.2"),
            Self::V20 => write!(f, "2.0"),
        }
    }
}

impl FromStr for TpmVersion {
    type Err = VerifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1.2" => Ok(Self::V12),
            "2.0" | "2" => Ok(Self::V20),
            _ => Err(VerifyError::InvalidFlavor(format!("Unsupported TPM version: '{}'", s))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlavorDescription {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_part: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tpm_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub digest_algorithm: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlavorMeta {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,
    #[serde(default)]
    pub description: FlavorDescription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogEqualsPolicy {
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub exclude_tags: BTreeSet<String>,
}

/// Checks a flavor declares for one PCR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcrPolicy {
    pub pcr: Pcr,
    pub measurement: String,
    #[serde(default)]
    pub pcr_matches: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventlog_equals: Option<EventLogEqualsPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eventlog_includes: Option<Vec<Event>>,
}

impl PcrPolicy {
    pub fn expected_value(&self) -> PcrValue {
        PcrValue::new(self.pcr, self.measurement.clone())
    }

    /// Expected events as a log for this PCR, whichever of equals/includes is set
    pub fn expected_event_log(&self) -> Option<EventLogEntry> {
        self.eventlog_equals
            .as_ref()
            .map(|equals| equals.events.clone())
            .or_else(|| self.eventlog_includes.clone())
            .map(|events| EventLogEntry::new(self.pcr, events))
    }

    /// Equals and includes are mutually exclusive
    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.eventlog_equals.is_some() && self.eventlog_includes.is_some() {
            return Err(VerifyError::InvalidFlavor(format!(
                "PCR policy for {} sets both eventlog_equals and eventlog_includes",
                self.pcr
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagCertificate {
    /// Base64 DER or PEM
    pub encoded: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetTag {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_certificate: Option<TagCertificate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct External {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag: Option<AssetTag>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoftwareMeasurement {
    #[serde(rename = "type")]
    pub measurement_type: MeasurementType,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

/// Expected software measurements keyed by path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Software {
    #[serde(default)]
    pub measurements: BTreeMap<String, SoftwareMeasurement>,
    pub cumulative_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Flavor {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<FlavorMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bios: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hardware: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pcrs: Vec<PcrPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<External>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software: Option<Software>,
}

impl Flavor {
    pub fn meta(&self) -> Result<&FlavorMeta, VerifyError> {
        self.meta
            .as_ref()
            .ok_or_else(|| VerifyError::InvalidFlavor("Flavor meta section is missing".to_string()))
    }

    pub fn id(&self) -> Option<Uuid> {
        self.meta.as_ref().map(|meta| meta.id)
    }

    /// Declared flavor part
    ///
    /// # Errors
    /// * `VerifyError::InvalidFlavor` - meta or flavor_part absent
    /// * `VerifyError::InvalidFlavorPart` - flavor_part not recognised
    pub fn part(&self) -> Result<FlavorPart, VerifyError> {
        let meta = self.meta()?;
        let part = meta.description.flavor_part.as_deref().ok_or_else(|| {
            VerifyError::InvalidFlavor(format!("Flavor {} does not declare a flavor part", meta.id))
        })?;
        FlavorPart::from_str(part)
    }

    /// Encoded tag certificate of an asset tag flavor
    pub fn tag_certificate(&self) -> Option<&str> {
        self.external
            .as_ref()
            .and_then(|external| external.asset_tag.as_ref())
            .and_then(|asset_tag| asset_tag.tag_certificate.as_ref())
            .map(|certificate| certificate.encoded.as_str())
    }

    /// Policy declared for `pcr`, if any
    pub fn pcr_policy(&self, pcr: &Pcr) -> Option<&PcrPolicy> {
        self.pcrs.iter().find(|policy| policy.pcr == *pcr)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedFlavor {
    pub flavor: Flavor,
    #[serde(default)]
    pub signature: String,
}

impl SignedFlavor {
    pub fn new(flavor: Flavor, signature: impl Into<String>) -> Self {
        Self { flavor, signature: signature.into() }
    }

    pub fn from_json(json: &Value) -> Result<Self, VerifyError> {
        serde_json::from_value(json.clone())
            .map_err(|e| VerifyError::InvalidFlavor(format!("Failed to parse signed flavor: {}", e)))
    }

    /// Bytes covered by the flavor signature
    pub fn signing_bytes(&self) -> Result<Vec<u8>, VerifyError> {
        Ok(serde_json::to_vec(&self.flavor)?)
    }
}
