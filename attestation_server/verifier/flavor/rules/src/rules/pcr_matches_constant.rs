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

use flavor_common_verifier::{HostManifest, PcrValue};
use log::debug;

use super::{require_pcr_manifest, Rule};
use crate::error::VerifyError;
use crate::fault::Fault;
use crate::flavor::FlavorPart;
use crate::result::{RuleInfo, RuleResult};

/// Host PCR must hold exactly the expected value
#[derive(Debug, Clone)]
pub struct PcrMatchesConstant {
    expected: PcrValue,
    markers: Vec<FlavorPart>,
}

impl PcrMatchesConstant {
    pub fn new(expected: PcrValue, markers: &[FlavorPart]) -> Self {
        Self { expected, markers: markers.to_vec() }
    }
}

impl Rule for PcrMatchesConstant {
    fn name(&self) -> &'static str {
        "PcrMatchesConstant"
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
                debug!("{} mismatch: expected {}, actual {}", pcr, self.expected.value, actual.value);
                result.add_fault(Fault::pcr_value_mismatch(&self.expected, actual));
            },
            Some(_) => {},
        }
        Ok(result)
    }
}
