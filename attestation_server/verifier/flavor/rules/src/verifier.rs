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

//! Trust aggregation over a host and the flavors it must satisfy.

use std::collections::BTreeSet;

use chrono::Utc;
use flavor_common_verifier::HostManifest;
use log::{debug, info, warn};

use crate::builder::{BuilderRegistry, RuleBuildContext};
use crate::certificates::VerifierCertificates;
use crate::error::VerifyError;
use crate::factory::RuleFactory;
use crate::fault::{Fault, FaultKind};
use crate::flavor::{FlavorPart, SignedFlavor};
use crate::result::{RuleInfo, RuleResult, TrustReport};

/// Evaluates hosts against flavors; shareable across threads
#[derive(Debug, Clone, Default)]
pub struct TrustVerifier {
    certificates: VerifierCertificates,
    registry: BuilderRegistry,
    skip_flavor_signature_verification: bool,
}

impl TrustVerifier {
    pub fn new(certificates: VerifierCertificates) -> Self {
        Self { certificates, registry: BuilderRegistry::default(), skip_flavor_signature_verification: false }
    }

    pub fn with_registry(mut self, registry: BuilderRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn skip_flavor_signature_verification(mut self, skip: bool) -> Self {
        self.skip_flavor_signature_verification = skip;
        self
    }

    /// Applies the rules of a single flavor
    pub fn verify_flavor(&self, manifest: &HostManifest, flavor: &SignedFlavor) -> Result<TrustReport, VerifyError> {
        self.verify_flavor_at(manifest, flavor, Utc::now().timestamp())
    }

    pub fn verify_flavor_at(
        &self,
        manifest: &HostManifest,
        flavor: &SignedFlavor,
        verification_time: i64,
    ) -> Result<TrustReport, VerifyError> {
        let mut report = TrustReport::new();
        report.add_results(self.apply_flavor(manifest, flavor, verification_time)?);
        Ok(report)
    }

    /// Host is trusted only if every flavor is satisfied
    ///
    /// # Returns
    /// * `Result<TrustReport, VerifyError>` - every rule result, followed by one
    ///   `AllOfFlavorsMissing` result per flavor part with an untrusted result
    ///
    /// # Errors
    /// * `VerifyError::InvalidFlavor` - `flavors` is empty
    /// * `VerifyError` - a flavor cannot be turned into rules or a rule fails
    pub fn verify_all_of(&self, manifest: &HostManifest, flavors: &[SignedFlavor]) -> Result<TrustReport, VerifyError> {
        self.verify_all_of_at(manifest, flavors, Utc::now().timestamp())
    }

    pub fn verify_all_of_at(
        &self,
        manifest: &HostManifest,
        flavors: &[SignedFlavor],
        verification_time: i64,
    ) -> Result<TrustReport, VerifyError> {
        if flavors.is_empty() {
            return Err(VerifyError::InvalidFlavor("No flavors to verify against".to_string()));
        }

        let mut report = TrustReport::new();
        let mut missing_parts: BTreeSet<FlavorPart> = BTreeSet::new();
        for flavor in flavors {
            let part = flavor.flavor.part()?;
            let results = self.apply_flavor(manifest, flavor, verification_time)?;
            if results.iter().any(|result| !result.is_trusted()) {
                debug!("Flavor {:?} ({}) is not satisfied", flavor.flavor.id(), part);
                missing_parts.insert(part);
            }
            report.add_results(results);
        }

        for part in missing_parts {
            let mut result = RuleResult::new(RuleInfo::new("AllOfFlavors", &[part]));
            result.add_fault(Fault::new(
                FaultKind::AllOfFlavorsMissing,
                format!("All of flavor types missing: {}", part),
            ));
            report.add_result(result);
        }

        if report.is_trusted() {
            info!("Host '{}' is trusted against {} flavor(s)", manifest.host_info.host_name, flavors.len());
        } else {
            warn!(
                "Host '{}' is untrusted, {} fault(s) reported",
                manifest.host_info.host_name,
                report.faults().count()
            );
        }
        Ok(report)
    }

    fn apply_flavor(
        &self,
        manifest: &HostManifest,
        flavor: &SignedFlavor,
        verification_time: i64,
    ) -> Result<Vec<RuleResult>, VerifyError> {
        let context = RuleBuildContext { signed_flavor: flavor, manifest, certificates: &self.certificates, verification_time };
        let rules = RuleFactory::new(&self.registry, context, self.skip_flavor_signature_verification).get_rules()?;

        let flavor_id = flavor.flavor.id();
        rules
            .iter()
            .map(|rule| rule.apply(manifest).map(|result| result.with_flavor_id(flavor_id)))
            .collect()
    }
}
