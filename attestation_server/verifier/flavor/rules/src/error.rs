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

use flavor_common_verifier::MeasurementError;
use thiserror::Error;

/// Errors that stop rule construction or a single rule evaluation.
///
/// Mismatches between a host and its flavors are never reported here, they
/// are faults inside a successful [`crate::RuleResult`].
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Flavor is malformed or lacks required metadata
    #[error("Invalid flavor: {0}")]
    InvalidFlavor(String),

    #[error("Invalid flavor part: {0}")]
    InvalidFlavorPart(String),

    /// No rule builder exists for the vendor / TPM version pair
    #[error("Unsupported vendor: {0}")]
    UnsupportedVendor(String),

    #[error("Certificate error: {0}")]
    CertificateError(String),

    #[error("Measurement xml error: {0}")]
    XmlError(String),

    #[error("{0}")]
    MeasurementError(#[from] MeasurementError),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<openssl::error::ErrorStack> for VerifyError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        VerifyError::InternalError(format!("OpenSSL failure: {}", err))
    }
}

impl From<serde_json::Error> for VerifyError {
    fn from(err: serde_json::Error) -> Self {
        VerifyError::InternalError(format!("JSON processing error: {}", err))
    }
}
