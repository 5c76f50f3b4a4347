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

use std::str::FromStr;

use flavor_common_verifier::{HashAlgorithm, PcrBank};

use crate::builder::rule_builder::{asset_tag_rules, RuleBuildContext, RuleBuilder};
use crate::error::VerifyError;
use crate::flavor::FlavorPart;
use crate::rules::{
    AikCertificateTrusted, Rule, XmlMeasurementLogDigestEquals, XmlMeasurementLogEquals, XmlMeasurementLogIntegrity,
};

/// Intel hosts with a TPM 2.0.
///
/// PCR checks for PLATFORM, OS and HOST_UNIQUE come entirely from the
/// flavor's PCR policies, which the factory turns into rules.
pub struct IntelTpm20RuleBuilder<'a> {
    context: RuleBuildContext<'a>,
}

impl<'a> IntelTpm20RuleBuilder<'a> {
    pub fn new(context: RuleBuildContext<'a>) -> Self {
        Self { context }
    }
}

impl RuleBuilder for IntelTpm20RuleBuilder<'_> {
    fn name(&self) -> &'static str {
        "IntelTpm20"
    }

    fn platform_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        Ok(vec![Box::new(AikCertificateTrusted::new(
            self.context.certificates.privacy_ca.clone(),
            self.context.verification_time,
            &[FlavorPart::Platform],
        ))])
    }

    fn os_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        Ok(Vec::new())
    }

    fn host_unique_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        Ok(Vec::new())
    }

    fn software_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        let flavor = &self.context.signed_flavor.flavor;
        let meta = flavor.meta()?;
        let software = flavor.software.as_ref().ok_or_else(|| {
            VerifyError::InvalidFlavor(format!("Software flavor {} has no software section", meta.id))
        })?;
        let digest_algorithm = match meta.description.digest_algorithm.as_deref() {
            Some(name) => HashAlgorithm::from_str(name)?,
            None => HashAlgorithm::Sha384,
        };

        let markers = [FlavorPart::Software];
        Ok(vec![
            Box::new(XmlMeasurementLogDigestEquals::new(meta.id, digest_algorithm, &markers)),
            Box::new(XmlMeasurementLogIntegrity::new(meta.id, software.cumulative_hash.clone(), &markers)),
            Box::new(XmlMeasurementLogEquals::new(meta.id, software, &markers)),
        ])
    }

    fn asset_tag_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        asset_tag_rules(&self.context, PcrBank::Sha256)
    }

    fn synthesizes_pcr_rules(&self) -> bool {
        true
    }
}
