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

//! Rule library.
//!
//! Each rule checks one aspect of a host manifest and reports the
//! discrepancies it finds as faults. Rules are pure: the same manifest always
//! yields the same result. An `Err` means the rule itself is misconfigured.

mod asset_tag;
mod certificate;
mod pcr_event_log;
mod pcr_matches_constant;
mod xml_measurement;

use std::fmt::Debug;

use flavor_common_verifier::{HostManifest, PcrManifest};

use crate::error::VerifyError;
use crate::fault::Fault;
use crate::flavor::FlavorPart;
use crate::result::RuleResult;

pub use asset_tag::AssetTagMatches;
pub use certificate::{AikCertificateTrusted, FlavorTrusted, TagCertificateTrusted};
pub use pcr_event_log::{PcrEventLogEquals, PcrEventLogIncludes, PcrEventLogIntegrity};
pub use pcr_matches_constant::PcrMatchesConstant;
pub use xml_measurement::{XmlMeasurementLogDigestEquals, XmlMeasurementLogEquals, XmlMeasurementLogIntegrity};

pub trait Rule: Send + Sync + Debug {
    /// Short rule name, e.g. `PcrMatchesConstant`
    fn name(&self) -> &'static str;

    /// Flavor parts this rule verifies
    fn markers(&self) -> &[FlavorPart];

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError>;
}

/// PCR manifest of the host, recording `PcrManifestMissing` when it has none
fn require_pcr_manifest<'m>(manifest: &'m HostManifest, result: &mut RuleResult) -> Option<&'m PcrManifest> {
    let pcr_manifest = manifest.pcr_manifest();
    if pcr_manifest.is_none() {
        result.add_fault(Fault::pcr_manifest_missing());
    }
    pcr_manifest
}
