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

//! Trust rules over certificates and the flavor signature.

use base64::{engine::general_purpose, Engine as _};
use flavor_common_verifier::HostManifest;
use log::{debug, warn};
use openssl::x509::X509;

use super::Rule;
use crate::certificates::{check_validity, decode_certificate, verify_signature, CertificatePool, Validity};
use crate::error::VerifyError;
use crate::fault::{Fault, FaultKind};
use crate::flavor::{FlavorPart, SignedFlavor};
use crate::result::{RuleInfo, RuleResult};

/// Fault kinds reported for one kind of certificate
struct CertificateFaults {
    label: &'static str,
    not_trusted: FaultKind,
    expired: FaultKind,
    not_yet_valid: FaultKind,
}

const AIK_FAULTS: CertificateFaults = CertificateFaults {
    label: "AIK",
    not_trusted: FaultKind::AikCertificateNotTrusted,
    expired: FaultKind::AikCertificateExpired,
    not_yet_valid: FaultKind::AikCertificateNotYetValid,
};

const TAG_FAULTS: CertificateFaults = CertificateFaults {
    label: "Asset tag",
    not_trusted: FaultKind::TagCertificateNotTrusted,
    expired: FaultKind::TagCertificateExpired,
    not_yet_valid: FaultKind::TagCertificateNotYetValid,
};

/// Adds a fault for every applicable trust or validity problem of `cert`
fn check_certificate(
    cert: &X509,
    pool: &CertificatePool,
    verification_time: i64,
    faults: &CertificateFaults,
    result: &mut RuleResult,
) -> Result<(), VerifyError> {
    if !pool.is_trusted(cert)? {
        result.add_fault(Fault::new(
            faults.not_trusted,
            format!("{} certificate is not signed by a trusted authority", faults.label),
        ));
    }
    match check_validity(cert, verification_time)? {
        Validity::Valid => {},
        Validity::Expired => result.add_fault(Fault::new(
            faults.expired,
            format!("{} certificate expired on {}", faults.label, cert.not_after()),
        )),
        Validity::NotYetValid => result.add_fault(Fault::new(
            faults.not_yet_valid,
            format!("{} certificate is not valid before {}", faults.label, cert.not_before()),
        )),
    }
    Ok(())
}

/// Host AIK certificate must chain to the Privacy CA and be valid
#[derive(Debug, Clone)]
pub struct AikCertificateTrusted {
    privacy_ca: CertificatePool,
    verification_time: i64,
    markers: Vec<FlavorPart>,
}

impl AikCertificateTrusted {
    pub fn new(privacy_ca: CertificatePool, verification_time: i64, markers: &[FlavorPart]) -> Self {
        Self { privacy_ca, verification_time, markers: markers.to_vec() }
    }
}

impl Rule for AikCertificateTrusted {
    fn name(&self) -> &'static str {
        "AikCertificateTrusted"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let mut result = RuleResult::new(RuleInfo::new(self.name(), &self.markers));

        let encoded = manifest.aik_certificate.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let Some(encoded) = encoded else {
            result.add_fault(Fault::new(FaultKind::AikCertificateMissing, "Host report does not include an AIK certificate"));
            return Ok(result);
        };
        let cert = decode_certificate(encoded, "AIK")?;
        check_certificate(&cert, &self.privacy_ca, self.verification_time, &AIK_FAULTS, &mut result)?;
        Ok(result)
    }
}

/// Flavor asset tag certificate must chain to the asset tag CA and be valid
#[derive(Debug, Clone)]
pub struct TagCertificateTrusted {
    tag_certificate: Option<X509>,
    asset_tag_ca: CertificatePool,
    verification_time: i64,
    markers: Vec<FlavorPart>,
}

impl TagCertificateTrusted {
    pub fn new(
        tag_certificate: Option<X509>,
        asset_tag_ca: CertificatePool,
        verification_time: i64,
        markers: &[FlavorPart],
    ) -> Self {
        Self { tag_certificate, asset_tag_ca, verification_time, markers: markers.to_vec() }
    }
}

impl Rule for TagCertificateTrusted {
    fn name(&self) -> &'static str {
        "TagCertificateTrusted"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, _manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let mut result = RuleResult::new(RuleInfo::new(self.name(), &self.markers));

        let Some(cert) = &self.tag_certificate else {
            result.add_fault(Fault::new(FaultKind::TagCertificateMissing, "Asset tag flavor has no tag certificate"));
            return Ok(result);
        };
        check_certificate(cert, &self.asset_tag_ca, self.verification_time, &TAG_FAULTS, &mut result)?;
        Ok(result)
    }
}

/// Flavor signature must verify with a signing certificate issued by the flavor CA
#[derive(Debug, Clone)]
pub struct FlavorTrusted {
    signing_bytes: Vec<u8>,
    signature: String,
    signing_certificate: Option<X509>,
    flavor_ca: CertificatePool,
    markers: Vec<FlavorPart>,
}

impl FlavorTrusted {
    pub fn new(
        signed_flavor: &SignedFlavor,
        signing_certificate: Option<X509>,
        flavor_ca: CertificatePool,
        markers: &[FlavorPart],
    ) -> Result<Self, VerifyError> {
        Ok(Self {
            signing_bytes: signed_flavor.signing_bytes()?,
            signature: signed_flavor.signature.trim().to_string(),
            signing_certificate,
            flavor_ca,
            markers: markers.to_vec(),
        })
    }
}

impl Rule for FlavorTrusted {
    fn name(&self) -> &'static str {
        "FlavorTrusted"
    }

    fn markers(&self) -> &[FlavorPart] {
        &self.markers
    }

    fn apply(&self, _manifest: &HostManifest) -> Result<RuleResult, VerifyError> {
        let mut result = RuleResult::new(RuleInfo::new(self.name(), &self.markers));

        if self.signature.is_empty() {
            result.add_fault(Fault::new(FaultKind::FlavorSignatureMissing, "Flavor is not signed"));
            return Ok(result);
        }
        let Some(signing_certificate) = &self.signing_certificate else {
            result.add_fault(Fault::new(
                FaultKind::FlavorSignatureMissing,
                "No flavor signing certificate is configured",
            ));
            return Ok(result);
        };

        if !self.flavor_ca.is_trusted(signing_certificate)? {
            result.add_fault(Fault::new(
                FaultKind::FlavorSignatureNotTrusted,
                "Flavor signing certificate is not issued by a trusted flavor CA",
            ));
            return Ok(result);
        }

        let verified = match general_purpose::STANDARD.decode(&self.signature) {
            Ok(signature) => verify_signature(signing_certificate, &self.signing_bytes, &signature)?,
            Err(e) => {
                warn!("Flavor signature is not valid base64: {}", e);
                false
            },
        };
        if !verified {
            debug!("Flavor signature verification failed");
            result.add_fault(Fault::new(
                FaultKind::FlavorSignatureVerificationFailed,
                "Flavor signature does not match its content",
            ));
        }
        Ok(result)
    }
}
