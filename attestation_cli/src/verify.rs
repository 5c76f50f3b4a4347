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
use std::sync::Arc;

use flavor_common_verifier::HostManifest;
use flavor_rule_verifier::{SignedFlavor, TrustReport, TrustVerifier};
use log::{error, info};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// Trust report of one host manifest
#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub manifest: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub host_name: String,
    pub trusted: bool,
    pub report: TrustReport,
}

fn read_file(path: &Path) -> Result<Vec<u8>, CliError> {
    fs::read(path).map_err(|e| CliError::IoError { path: path.display().to_string(), message: e.to_string() })
}

pub fn read_manifest(path: &Path) -> Result<HostManifest, CliError> {
    Ok(HostManifest::from_slice(&read_file(path)?)?)
}

/// Reads a JSON array of signed flavors, a lone flavor object is accepted too
pub fn read_flavors(path: &Path) -> Result<Vec<SignedFlavor>, CliError> {
    let value: Value = serde_json::from_slice(&read_file(path)?)?;
    let flavors = match value {
        Value::Array(items) => items.iter().map(SignedFlavor::from_json).collect::<Result<Vec<_>, _>>()?,
        other => vec![SignedFlavor::from_json(&other)?],
    };
    if flavors.is_empty() {
        return Err(CliError::ParseError(format!("No flavor found in {}", path.display())));
    }
    Ok(flavors)
}

pub fn verify_host(verifier: &TrustVerifier, manifest: &Path, flavors: &[SignedFlavor]) -> Result<HostReport, CliError> {
    let host = read_manifest(manifest)?;
    let report = verifier.verify_all_of(&host, flavors)?;
    info!(
        "Host '{}' from {} is {}",
        host.host_info.host_name,
        manifest.display(),
        if report.is_trusted() { "trusted" } else { "untrusted" }
    );
    Ok(HostReport {
        manifest: manifest.display().to_string(),
        host_name: host.host_info.host_name,
        trusted: report.is_trusted(),
        report,
    })
}

/// Verifies every manifest on the blocking pool, reports keep the input order
pub async fn verify_hosts(
    verifier: Arc<TrustVerifier>,
    manifests: Vec<PathBuf>,
    flavors: Arc<Vec<SignedFlavor>>,
) -> Result<Vec<HostReport>, CliError> {
    let mut tasks = Vec::with_capacity(manifests.len());
    for manifest in manifests {
        let verifier = Arc::clone(&verifier);
        let flavors = Arc::clone(&flavors);
        tasks.push(tokio::task::spawn_blocking(move || verify_host(&verifier, &manifest, &flavors)));
    }
    let results: Vec<Result<HostReport, CliError>> = futures::future::join_all(tasks)
        .await
        .into_iter()
        .map(|res| {
            res.unwrap_or_else(|join_error| {
                error!("Verification task failed: {}", join_error);
                Err(CliError::WorkerError(join_error.to_string()))
            })
        })
        .collect();
    results.into_iter().collect()
}
