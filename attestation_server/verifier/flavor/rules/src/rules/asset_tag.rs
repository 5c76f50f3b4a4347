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

use flavor_common_verifier::{HostManifest, Pcr, PcrBank, PcrValue};

use super::{require_pcr_manifest, Rule};
use crate::error::VerifyError;
use crate::fault::Fault;
use crate::flavor::FlavorPart;
use crate::result::{RuleInfo, RuleResult};

/// PCR the asset tag is provisioned into
pub const ASSET_TAG_PCR_INDEX: u32 = 22;

/// PCR 22 must hold the asset tag certificate digest extended into a reset PCR
#[derive(Debug, Clone)]
pub struct AssetTagMatches {
    expected: PcrValue,
    markers: Vec<FlavorPart>,
}

impl AssetTagMatches {
    /// # Arguments
    /// * `bank` - PCR bank the tag is extended into
    /// * `tag_certificate_der` - DER encoding of the tag certificate
    pub fn new(bank: PcrBank, tag_certificate_der: &[u8], markers: &[FlavorPart]) -> Result<Self, VerifyError> {
        let tag_digest = bank.digest(tag_certificate_der)?;
        let expected = bank.extend(&bank.initial_value(), &tag_digest)?;
        let pcr = Pcr::new(ASSET_TAG_PCR_INDEX, bank)?;
        Ok(Self { expected: PcrValue::new(pcr, hex::encode(expected)), markers: markers.to_vec() })
    }

    pub fn expected(&self) -> &PcrValue {
        &self.expected
    }
}

impl Rule for AssetTagMatches {
    fn name(&self) -> &'static str {
        "AssetTagMatches"
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
        match pcr_manifest.get_pcr_value(&pcr) {
            None => result.add_fault(Fault::pcr_value_missing(pcr.index, pcr.bank)),
            Some(actual) if !actual.matches(&self.expected.value) => {
                result.add_fault(Fault::pcr_value_mismatch(&self.expected, actual))
            },
            Some(_) => {},
        }
        Ok(result)
    }
}
