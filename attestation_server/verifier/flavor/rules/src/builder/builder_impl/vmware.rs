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

use std::collections::BTreeSet;

use flavor_common_verifier::PcrBank;
use log::debug;

use crate::builder::rule_builder::{asset_tag_rules, RuleBuildContext, RuleBuilder};
use crate::error::VerifyError;
use crate::flavor::{FlavorPart, PcrPolicy};
use crate::rules::{PcrEventLogEquals, PcrEventLogIncludes, PcrMatchesConstant, Rule};

/// Event tags whose events differ from host to host on ESXi
pub const VMWARE_HOST_SPECIFIC_TAGS: [&str; 3] =
    ["commandLine.", "componentName.imgdb.tgz", "componentName.onetime.tgz"];

/// Fixed PCR layout of one VMware TPM generation
#[derive(Debug)]
struct PcrLayout {
    name: &'static str,
    bank: PcrBank,
    platform: &'static [u8],
    os: &'static [u8],
    /// Carries the ESXi module event log
    module_log: u8,
}

const TPM20_LAYOUT: PcrLayout =
    PcrLayout { name: "VMwareTpm20", bank: PcrBank::Sha256, platform: &[0, 17, 18], os: &[20, 21], module_log: 19 };

const TPM12_LAYOUT: PcrLayout =
    PcrLayout { name: "VMwareTpm12", bank: PcrBank::Sha1, platform: &[0, 17, 18], os: &[18, 20], module_log: 19 };

/// VMware ESXi hosts, PCR indices are fixed per TPM version and the expected
/// values come from the flavor
pub struct VmwareRuleBuilder<'a> {
    context: RuleBuildContext<'a>,
    layout: &'static PcrLayout,
}

impl<'a> VmwareRuleBuilder<'a> {
    pub fn tpm20(context: RuleBuildContext<'a>) -> Self {
        Self { context, layout: &TPM20_LAYOUT }
    }

    pub fn tpm12(context: RuleBuildContext<'a>) -> Self {
        Self { context, layout: &TPM12_LAYOUT }
    }

    /// Flavor policy for `index` in the layout's bank
    fn policy(&self, index: u8) -> Option<&'a PcrPolicy> {
        let policy = self
            .context
            .signed_flavor
            .flavor
            .pcrs
            .iter()
            .find(|policy| policy.pcr.index == index && policy.pcr.bank == self.layout.bank);
        if policy.is_none() {
            debug!("{}: flavor has no policy for PCR {}, skipped", self.layout.name, index);
        }
        policy
    }

    fn constant_rules(&self, indices: &[u8], part: FlavorPart) -> Vec<Box<dyn Rule>> {
        indices
            .iter()
            .filter_map(|index| self.policy(*index))
            .map(|policy| Box::new(PcrMatchesConstant::new(policy.expected_value(), &[part])) as Box<dyn Rule>)
            .collect()
    }
}

impl RuleBuilder for VmwareRuleBuilder<'_> {
    fn name(&self) -> &'static str {
        self.layout.name
    }

    fn platform_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        Ok(self.constant_rules(self.layout.platform, FlavorPart::Platform))
    }

    fn os_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        let mut rules = self.constant_rules(self.layout.os, FlavorPart::Os);

        if let Some(policy) = self.policy(self.layout.module_log) {
            policy.validate()?;
            if let Some(expected) = policy.expected_event_log() {
                let mut exclude_tags: BTreeSet<String> =
                    VMWARE_HOST_SPECIFIC_TAGS.iter().map(|tag| tag.to_string()).collect();
                if let Some(equals) = &policy.eventlog_equals {
                    exclude_tags.extend(equals.exclude_tags.iter().cloned());
                }
                rules.push(Box::new(PcrEventLogEquals::excluding(expected, exclude_tags, &[FlavorPart::Os])));
            }
        }
        Ok(rules)
    }

    fn host_unique_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        if let Some(policy) = self.policy(self.layout.module_log) {
            policy.validate()?;
            if let Some(expected) = policy.expected_event_log() {
                rules.push(Box::new(PcrEventLogIncludes::new(expected, &[FlavorPart::HostUnique])));
            }
        }
        Ok(rules)
    }

    fn software_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        Err(VerifyError::InvalidFlavorPart(format!("{} does not support SOFTWARE flavors", self.layout.name)))
    }

    fn asset_tag_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        asset_tag_rules(&self.context, self.layout.bank)
    }
}
