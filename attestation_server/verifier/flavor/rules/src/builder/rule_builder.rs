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

use flavor_common_verifier::{HostManifest, PcrBank};

use crate::certificates::{decode_certificate, VerifierCertificates};
use crate::error::VerifyError;
use crate::flavor::{FlavorPart, SignedFlavor};
use crate::rules::{AssetTagMatches, Rule, TagCertificateTrusted};

/// Inputs shared by every builder while assembling the rules of one flavor
#[derive(Debug, Clone, Copy)]
pub struct RuleBuildContext<'a> {
    pub signed_flavor: &'a SignedFlavor,
    pub manifest: &'a HostManifest,
    pub certificates: &'a VerifierCertificates,
    /// Unix seconds certificates are checked against
    pub verification_time: i64,
}

/// Vendor specific source of the static rules for each flavor part
pub trait RuleBuilder {
    fn name(&self) -> &'static str;

    fn platform_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError>;

    fn os_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError>;

    fn host_unique_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError>;

    fn software_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError>;

    fn asset_tag_rules(&self) -> Result<Vec<Box<dyn Rule>>, VerifyError>;

    /// Whether the factory derives extra rules from the flavor's PCR policies
    fn synthesizes_pcr_rules(&self) -> bool {
        false
    }

    fn rules_for(&self, part: FlavorPart) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
        match part {
            FlavorPart::Platform => self.platform_rules(),
            FlavorPart::Os => self.os_rules(),
            FlavorPart::HostUnique => self.host_unique_rules(),
            FlavorPart::Software => self.software_rules(),
            FlavorPart::AssetTag => self.asset_tag_rules(),
        }
    }
}

/// Tag certificate trust plus the PCR 22 check in `bank`.
///
/// Without a tag certificate only the trust rule is built, it reports the
/// certificate as missing.
pub(crate) fn asset_tag_rules(
    context: &RuleBuildContext<'_>,
    bank: PcrBank,
) -> Result<Vec<Box<dyn Rule>>, VerifyError> {
    let markers = [FlavorPart::AssetTag];
    let tag_certificate = context
        .signed_flavor
        .flavor
        .tag_certificate()
        .map(|encoded| decode_certificate(encoded, "asset tag"))
        .transpose()?;

    let mut rules: Vec<Box<dyn Rule>> = Vec::new();
    if let Some(cert) = &tag_certificate {
        rules.push(Box::new(AssetTagMatches::new(bank, &cert.to_der()?, &markers)?));
    }
    rules.insert(
        0,
        Box::new(TagCertificateTrusted::new(
            tag_certificate,
            context.certificates.asset_tag_ca.clone(),
            context.verification_time,
            &markers,
        )),
    );
    Ok(rules)
}
