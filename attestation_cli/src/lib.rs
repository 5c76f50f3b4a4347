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

//! Command-line driver for the flavor trust verifier.

pub mod commands;
pub mod config;
pub mod error;
pub mod verify;

use std::sync::Arc;

use serde_json::Value;

use crate::commands::{Cli, Commands};
use crate::config::Config;
use crate::error::CliError;
use crate::verify::{read_flavors, verify_host, verify_hosts};

/// Initializes `common_log` from the configured log4rs file, once per process
pub fn init_logging(config: &Config) -> Result<(), CliError> {
    match &config.logging {
        Some(logging) if !common_log::is_initialized() => {
            common_log::init_with_yaml(logging.config_file.clone())?;
            log::info!("Logging initialized from {}", logging.config_file.display());
            Ok(())
        },
        _ => Ok(()),
    }
}

/// Runs the parsed command and returns the JSON to print plus the overall
/// trust verdict
pub async fn execute(cli: Cli) -> Result<(Value, bool), CliError> {
    let config = Config::from_yaml(&cli.config)?;
    init_logging(&config)?;

    match cli.command {
        Commands::Verify { manifest, flavors, skip_signature } => {
            let verifier = config.build_verifier(skip_signature)?;
            let flavors = read_flavors(&flavors)?;
            let report = verify_host(&verifier, &manifest, &flavors)?;
            let trusted = report.trusted;
            Ok((serde_json::to_value(report)?, trusted))
        },
        Commands::VerifyHosts { manifests, flavors } => {
            let verifier = Arc::new(config.build_verifier(false)?);
            let flavors = Arc::new(read_flavors(&flavors)?);
            let reports = verify_hosts(verifier, manifests, flavors).await?;
            let trusted = reports.iter().all(|report| report.trusted);
            Ok((serde_json::to_value(reports)?, trusted))
        },
    }
}
