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

use common_log::LogError;
use flavor_common_verifier::MeasurementError;
use flavor_rule_verifier::VerifyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("Failed to read {path}: {message}")]
    IoError { path: String, message: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error(transparent)]
    VerifyError(#[from] VerifyError),

    #[error(transparent)]
    MeasurementError(#[from] MeasurementError),

    #[error(transparent)]
    LogError(#[from] LogError),

    /// A verification worker panicked or was cancelled
    #[error("Worker error: {0}")]
    WorkerError(String),
}

impl From<serde_json::Error> for CliError {
    fn from(err: serde_json::Error) -> Self {
        CliError::ParseError(err.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(err: serde_yaml::Error) -> Self {
        CliError::ConfigError(err.to_string())
    }
}
