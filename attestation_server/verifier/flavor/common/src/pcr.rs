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

//! PCR identity and values.
//!
//! A PCR is addressed by its bank (the hash algorithm the TPM extends it
//! with) and its index. The bank also fixes the digest size used when an
//! event log is replayed.

use std::fmt;
use std::str::FromStr;

use openssl::hash::{Hasher, MessageDigest};
use serde::{Deserialize, Serialize};

use crate::error::MeasurementError;

/// Highest PCR index of a TPM PCR bank
pub const PCR_INDEX_MAX: u8 = 23;

/// Supported PCR bank / digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    #[serde(rename = "SHA1", alias = "sha1")]
    Sha1,
    #[serde(rename = "SHA256", alias = "sha256")]
    Sha256,
    #[serde(rename = "SHA384", alias = "sha384")]
    Sha384,
    #[serde(rename = "SHA512", alias = "sha512")]
    Sha512,
}

/// PCR banks are named after the digest algorithm they extend with
pub type PcrBank = HashAlgorithm;

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha1 => write!(f, "SHA1"),
            Self::Sha256 => write!(f, "SHA256"),
            Self::Sha384 => write!(f, "SHA384"),
            Self::Sha512 => write!(f, "SHA512"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = MeasurementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "").as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            "sha384" => Ok(Self::Sha384),
            "sha512" => Ok(Self::Sha512),
            _ => Err(MeasurementError::ValidationError(format!("Unsupported hash algorithm: {}", s))),
        }
    }
}

impl HashAlgorithm {
    /// Digest size in bytes
    pub const fn digest_size(&self) -> usize {
        match self {
            Self::Sha1 => 20,
            Self::Sha256 => 32,
            Self::Sha384 => 48,
            Self::Sha512 => 64,
        }
    }

    /// Expected length of a digest in hexadecimal characters
    pub const fn hex_length(&self) -> usize {
        self.digest_size() * 2
    }

    pub fn to_message_digest(&self) -> MessageDigest {
        match self {
            Self::Sha1 => MessageDigest::sha1(),
            Self::Sha256 => MessageDigest::sha256(),
            Self::Sha384 => MessageDigest::sha384(),
            Self::Sha512 => MessageDigest::sha512(),
        }
    }

    /// Validate that a string is a well-formed hex digest for this algorithm
    pub fn validate_hex_hash(&self, hash: &str) -> bool {
        hash.len() == self.hex_length() && hash.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Value of a freshly reset PCR in this bank
    pub fn initial_value(&self) -> Vec<u8> {
        vec![0u8; self.digest_size()]
    }

    /// Hash arbitrary data with this algorithm
    pub fn digest(&self, data: &[u8]) -> Result<Vec<u8>, MeasurementError> {
        let digest = openssl::hash::hash(self.to_message_digest(), data)?;
        Ok(digest.to_vec())
    }

    /// One TPM `PCR_Extend`: `H(current || measurement)`
    pub fn extend(&self, current: &[u8], measurement: &[u8]) -> Result<Vec<u8>, MeasurementError> {
        let mut hasher = Hasher::new(self.to_message_digest())?;
        hasher.update(current)?;
        hasher.update(measurement)?;
        Ok(hasher.finish()?.to_vec())
    }

    /// Replays a sequence of hex encoded measurements starting from a reset PCR
    ///
    /// # Arguments
    /// * `measurements` - hex digests in the order they were extended
    ///
    /// # Returns
    /// * `Result<String, MeasurementError>` - the final cumulative value, hex encoded
    ///
    /// # Errors
    /// * `MeasurementError::InputError` - if a measurement is not valid hex
    pub fn replay<'a, I>(&self, measurements: I) -> Result<String, MeasurementError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut cumulative = self.initial_value();
        for (position, measurement) in measurements.into_iter().enumerate() {
            let bytes = hex::decode(measurement).map_err(|e| {
                MeasurementError::InputError(format!(
                    "Failed to decode measurement at position {}: {}",
                    position, e
                ))
            })?;
            cumulative = self.extend(&cumulative, &bytes)?;
        }
        Ok(hex::encode(cumulative))
    }
}

/// PCR identity: bank plus index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "PcrRepr")]
pub struct Pcr {
    pub index: u8,
    pub bank: PcrBank,
}

#[derive(Deserialize)]
struct PcrRepr {
    index: u32,
    bank: PcrBank,
}

impl TryFrom<PcrRepr> for Pcr {
    type Error = MeasurementError;

    fn try_from(repr: PcrRepr) -> Result<Self, Self::Error> {
        Pcr::new(repr.index, repr.bank)
    }
}

impl Pcr {
    /// Creates a PCR identity, rejecting indices outside 0-23
    pub fn new(index: u32, bank: PcrBank) -> Result<Self, MeasurementError> {
        if index > PCR_INDEX_MAX as u32 {
            return Err(MeasurementError::ValidationError(format!(
                "PCR index {} is out of valid range (0-{})",
                index, PCR_INDEX_MAX
            )));
        }
        Ok(Self { index: index as u8, bank })
    }
}

impl fmt::Display for Pcr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PCR {} ({})", self.index, self.bank)
    }
}

/// Digest reported by the host for one PCR
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PcrValueRepr", into = "PcrValueRepr")]
pub struct PcrValue {
    pub pcr: Pcr,
    pub value: String,
}

#[derive(Serialize, Deserialize)]
struct PcrValueRepr {
    index: u32,
    value: String,
    pcr_bank: PcrBank,
}

impl TryFrom<PcrValueRepr> for PcrValue {
    type Error = MeasurementError;

    fn try_from(repr: PcrValueRepr) -> Result<Self, Self::Error> {
        Ok(Self { pcr: Pcr::new(repr.index, repr.pcr_bank)?, value: repr.value })
    }
}

impl From<PcrValue> for PcrValueRepr {
    fn from(value: PcrValue) -> Self {
        Self { index: value.pcr.index as u32, value: value.value, pcr_bank: value.pcr.bank }
    }
}

impl PcrValue {
    pub fn new(pcr: Pcr, value: impl Into<String>) -> Self {
        Self { pcr, value: value.into() }
    }

    /// Hex comparison that ignores letter case
    pub fn matches(&self, other: &str) -> bool {
        self.value.eq_ignore_ascii_case(other.trim())
    }

    /// Checks the value is well-formed hex of the bank's digest length
    pub fn validate(&self) -> Result<(), MeasurementError> {
        if !self.pcr.bank.validate_hex_hash(&self.value) {
            return Err(MeasurementError::ValidationError(format!(
                "Invalid digest for {}: expected {} hex characters, got '{}'",
                self.pcr,
                self.pcr.bank.hex_length(),
                self.value
            )));
        }
        Ok(())
    }
}
