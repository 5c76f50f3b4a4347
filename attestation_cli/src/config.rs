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

use std::fs;
use std::path::{Path, PathBuf};

use flavor_rule_verifier::certificates::VerifierCertificates;
use flavor_rule_verifier::TrustVerifier;
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub verifier: VerifierConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VerifierConfig {
    #[serde(default)]
    pub skip_flavor_signature_verification: bool,
    #[serde(default)]
    pub certificates: CertificatePaths,
}

/// PEM files holding the trust anchors; an absent entry leaves its pool empty
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CertificatePaths {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy_ca: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_ca: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flavor_signing_cert: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asset_tag_ca: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// log4rs YAML consumed by `common_log`
    pub config_file: PathBuf,
}

impl Config {
    /// Loads and validates a YAML config file
    pub fn from_yaml(path: &Path) -> Result<Self, CliError> {
        let content = fs::read_to_string(path).map_err(|e| CliError::IoError {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, CliError> {
        let config: Config = serde_yaml::from_str(content)?;
        config.validate().map_err(CliError::ConfigError)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), String> {
        let certificates = &self.verifier.certificates;
        let entries = [
            ("privacy_ca", &certificates.privacy_ca),
            ("flavor_ca", &certificates.flavor_ca),
            ("flavor_signing_cert", &certificates.flavor_signing_cert),
            ("asset_tag_ca", &certificates.asset_tag_ca),
        ];
        for (name, path) in entries {
            if let Some(path) = path {
                if path.as_os_str().is_empty() {
                    return Err(format!("Certificate path '{}' must not be empty", name));
                }
            }
        }

        if let Some(logging) = &self.logging {
            if logging.config_file.as_os_str().is_empty() {
                return Err("Logging config_file must not be empty".to_string());
            }
        }

        if self.verifier.skip_flavor_signature_verification && certificates.flavor_signing_cert.is_some() {
            log::warn!("Flavor signature verification is skipped, flavor_signing_cert is ignored");
        }
        Ok(())
    }

    pub fn load_certificates(&self) -> Result<VerifierCertificates, CliError> {
        let paths = &self.verifier.certificates;
        Ok(VerifierCertificates::from_pem_files(
            paths.privacy_ca.as_deref(),
            paths.flavor_ca.as_deref(),
            paths.flavor_signing_cert.as_deref(),
            paths.asset_tag_ca.as_deref(),
        )?)
    }

    /// Verifier over the configured trust anchors, `skip_signature` forces the
    /// flavor signature check off regardless of the config
    pub fn build_verifier(&self, skip_signature: bool) -> Result<TrustVerifier, CliError> {
        let skip = skip_signature || self.verifier.skip_flavor_signature_verification;
        Ok(TrustVerifier::new(self.load_certificates()?).skip_flavor_signature_verification(skip))
    }
}
