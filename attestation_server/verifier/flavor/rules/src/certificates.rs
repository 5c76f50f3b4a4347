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

//! Certificate pools and the openssl helpers the trust rules rely on.

use std::cmp::Ordering;
use std::fs;
use std::path::Path;

use base64::{engine::general_purpose, Engine as _};
use log::{debug, warn};
use openssl::asn1::Asn1Time;
use openssl::hash::MessageDigest;
use openssl::sign::Verifier;
use openssl::stack::Stack;
use openssl::x509::store::X509StoreBuilder;
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509StoreContext, X509};

use crate::error::VerifyError;

/// Validity of a certificate at a point in time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Validity {
    Valid,
    Expired,
    NotYetValid,
}

/// Decodes a certificate given as PEM or as base64 encoded DER
///
/// # Errors
/// * `VerifyError::CertificateError` - neither encoding yields a certificate
pub fn decode_certificate(encoded: &str, cert_type: &str) -> Result<X509, VerifyError> {
    let encoded = encoded.trim();
    if encoded.starts_with("-----BEGIN") {
        return X509::from_pem(encoded.as_bytes())
            .map_err(|e| VerifyError::CertificateError(format!("Failed to parse {} certificate: {}", cert_type, e)));
    }
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let der = general_purpose::STANDARD
        .decode(compact)
        .map_err(|e| VerifyError::CertificateError(format!("Failed to decode base64 {} certificate: {}", cert_type, e)))?;
    X509::from_der(&der)
        .map_err(|e| VerifyError::CertificateError(format!("Failed to parse {} certificate: {}", cert_type, e)))
}

/// Compares the certificate's validity window with `timestamp` (unix seconds)
pub fn check_validity(cert: &X509Ref, timestamp: i64) -> Result<Validity, VerifyError> {
    let at = Asn1Time::from_unix(timestamp)?;
    if at.compare(cert.not_before())? == Ordering::Less {
        return Ok(Validity::NotYetValid);
    }
    if at.compare(cert.not_after())? == Ordering::Greater {
        return Ok(Validity::Expired);
    }
    Ok(Validity::Valid)
}

/// Verifies `signature` over `data` with the certificate's public key, SHA-384
pub fn verify_signature(cert: &X509Ref, data: &[u8], signature: &[u8]) -> Result<bool, VerifyError> {
    let public_key = cert.public_key()?;
    let mut verifier = Verifier::new(MessageDigest::sha384(), &public_key)?;
    verifier.update(data)?;
    // A malformed signature is a failed verification rather than an error
    Ok(verifier.verify(signature).unwrap_or(false))
}

/// Set of trust anchors for one kind of certificate
#[derive(Debug, Clone, Default)]
pub struct CertificatePool {
    certificates: Vec<X509>,
}

impl CertificatePool {
    pub fn new(certificates: Vec<X509>) -> Self {
        Self { certificates }
    }

    pub fn from_pem(pem: &[u8]) -> Result<Self, VerifyError> {
        let certificates = X509::stack_from_pem(pem)
            .map_err(|e| VerifyError::CertificateError(format!("Failed to parse PEM bundle: {}", e)))?;
        Ok(Self { certificates })
    }

    pub fn from_pem_file(path: &Path) -> Result<Self, VerifyError> {
        let pem = fs::read(path).map_err(|e| {
            VerifyError::CertificateError(format!("Failed to read certificate file {}: {}", path.display(), e))
        })?;
        let pool = Self::from_pem(&pem)?;
        debug!("Loaded {} certificate(s) from {}", pool.len(), path.display());
        Ok(pool)
    }

    pub fn is_empty(&self) -> bool {
        self.certificates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.certificates.len()
    }

    pub fn certificates(&self) -> &[X509] {
        &self.certificates
    }

    /// Checks that `cert` chains to one of the pool's certificates
    ///
    /// Validity periods are ignored here, the rules report them separately.
    pub fn is_trusted(&self, cert: &X509Ref) -> Result<bool, VerifyError> {
        if self.certificates.is_empty() {
            warn!("Certificate pool is empty, nothing can be trusted");
            return Ok(false);
        }
        let mut builder = X509StoreBuilder::new()?;
        for ca in &self.certificates {
            builder.add_cert(ca.clone())?;
        }
        builder.set_flags(X509VerifyFlags::NO_CHECK_TIME | X509VerifyFlags::PARTIAL_CHAIN)?;
        let store = builder.build();

        let chain = Stack::new()?;
        let mut context = X509StoreContext::new()?;
        let trusted = context.init(&store, cert, &chain, |ctx| ctx.verify_cert())?;
        Ok(trusted)
    }
}

/// Trust anchors handed to the rules
#[derive(Debug, Clone, Default)]
pub struct VerifierCertificates {
    pub privacy_ca: CertificatePool,
    pub flavor_ca: CertificatePool,
    pub flavor_signing_certificate: Option<X509>,
    pub asset_tag_ca: CertificatePool,
}

impl VerifierCertificates {
    /// Loads every configured PEM file, absent entries leave the pool empty
    pub fn from_pem_files(
        privacy_ca: Option<&Path>,
        flavor_ca: Option<&Path>,
        flavor_signing_cert: Option<&Path>,
        asset_tag_ca: Option<&Path>,
    ) -> Result<Self, VerifyError> {
        let load = |path: Option<&Path>| path.map(CertificatePool::from_pem_file).transpose();
        let flavor_signing_certificate = match load(flavor_signing_cert)? {
            Some(pool) => Some(pool.certificates.into_iter().next().ok_or_else(|| {
                VerifyError::CertificateError("Flavor signing certificate file holds no certificate".to_string())
            })?),
            None => None,
        };
        Ok(Self {
            privacy_ca: load(privacy_ca)?.unwrap_or_default(),
            flavor_ca: load(flavor_ca)?.unwrap_or_default(),
            flavor_signing_certificate,
            asset_tag_ca: load(asset_tag_ca)?.unwrap_or_default(),
        })
    }
}
