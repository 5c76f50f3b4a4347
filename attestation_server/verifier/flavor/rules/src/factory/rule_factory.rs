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
use std::str::FromStr;

use flavor_common_verifier::{EventLogEntry, Pcr};
use log::{debug, info};

use crate::builder::{BuilderRegistry, RuleBuildContext};
use crate::error::VerifyError;
use crate::flavor::{FlavorPart, PcrPolicy, TpmVersion, Vendor};
use crate::rules::{FlavorTrusted, PcrEventLogEquals, PcrEventLogIncludes, PcrEventLogIntegrity, PcrMatchesConstant, Rule};

/// Assembles the complete rule set for one flavor against one host
pub struct RuleFactory<'a> {
    registry: &'a BuilderRegistry,
    context: RuleBuildContext<'a>,
    skip_flavor_signature_verification: bool,
}

impl<'a> RuleFactory<'a> {
    pub fn new(registry: &'a BuilderRegistry, context: RuleBuildContext<'a>, skip_flavor_signature_verification: bool) -> Self {
        Self { registry, context, skip_flavor_signature_verification }
    }

    /// Vendor declared by the flavor, otherwise inferred from the host OS
    pub fn vendor(&self) -> Result<Vendor, VerifyError> {
        let meta = self.context.signed_flavor.flavor.meta()?;
        match meta.vendor.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
            Some(vendor) => Vendor::from_str(vendor),
            None => Vendor::from_os_name(&self.context.manifest.host_info.os_name),
        }
    }

    /// TPM version declared by the flavor, otherwise the one the host reports
    pub fn tpm_version(&self) -> Result<TpmVersion, VerifyError> {
        let meta = self.context.signed_flavor.flavor.meta()?;
        let declared = meta.description.tpm_version.as_deref().map(str::trim).filter(|v| !v.is_empty());
        match declared {
            Some(version) => TpmVersion::from_str(version),
            None => TpmVersion::from_str(&self.context.manifest.host_info.tpm_version),
        }
    }

    /// Builds every rule the flavor requires
    ///
    /// # Returns
    /// * `Result<Vec<Box<dyn Rule>>, VerifyError>` - static vendor rules, then
    ///   rules derived from PCR policies, then the signature rule
    ///
    /// # Errors
    /// * `VerifyError` - the flavor or its policies are unusable, no rule is
    ///   returned in that case
    pub fn get_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        let flavor = &self.context.signed_flavor.flavor;
        let part = flavor.part()?;
        let vendor = self.vendor()?;
        let tpm_version = self.tpm_version()?;

        let builder = self.registry.create(vendor, tpm_version, self.context)?;
        debug!("Building {} rules for flavor {:?} with {}", part, flavor.id(), builder.name());

        let mut rules = builder.rules_for(part)?;
        if builder.synthesizes_pcr_rules() {
            rules.extend(Self::pcr_policy_rules(&flavor.pcrs, part)?);
        }

        if self.skip_flavor_signature_verification {
            info!("Flavor signature verification is skipped for flavor {:?}", flavor.id());
        } else {
            rules.push(Box::new(FlavorTrusted::new(
                self.context.signed_flavor,
                self.context.certificates.flavor_signing_certificate.clone(),
                self.context.certificates.flavor_ca.clone(),
                &[part],
            )?));
        }
        Ok(rules)
    }

    /// Rules declared by the flavor's PCR policies, with a single integrity
    /// rule for every PCR that has an event-log rule
    pub fn pcr_policy_rules(policies: &[PcrPolicy], part: FlavorPart) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        let markers = [part];
        let mut rules: Vec<Box<dyn Rule>> = Vec::new();
        let mut integrity_pcrs: BTreeSet<Pcr> = BTreeSet::new();

        for policy in policies {
            policy.validate()?;

            if policy.pcr_matches {
                rules.push(Box::new(PcrMatchesConstant::new(policy.expected_value(), &markers)));
            }

            let mut has_event_log_rule = false;
            if let Some(equals) = &policy.eventlog_equals {
                let expected = EventLogEntry::new(policy.pcr, equals.events.clone());
                if equals.exclude_tags.is_empty() {
                    rules.push(Box::new(PcrEventLogEquals::new(expected, &markers)));
                } else {
                    rules.push(Box::new(PcrEventLogEquals::excluding(expected, equals.exclude_tags.clone(), &markers)));
                }
                has_event_log_rule = true;
            }
            if let Some(events) = &policy.eventlog_includes {
                let expected = EventLogEntry::new(policy.pcr, events.clone());
                rules.push(Box::new(PcrEventLogIncludes::new(expected, &markers)));
                has_event_log_rule = true;
            }

            if has_event_log_rule && integrity_pcrs.insert(policy.pcr) {
                rules.push(Box::new(PcrEventLogIntegrity::new(policy.pcr, &markers)));
            }
        }
        Ok(rules)
    }
}
