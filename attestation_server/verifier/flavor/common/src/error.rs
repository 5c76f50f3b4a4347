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

use thiserror::Error;

/// Errors raised while parsing or computing over measurement data
#[derive(Debug, Error)]
pub enum MeasurementError {
    #[error("Input error: {0}")]
    InputError(String),
    #[error("Internal error: {0}")]
    InternalError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<openssl::error::ErrorStack> for MeasurementError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        MeasurementError::InternalError(format!("OpenSSL failure: {}", err))
    }
}

impl From<hex::FromHexError> for MeasurementError {
    fn from(err: hex::FromHexError) -> Self {
        MeasurementError::InputError(format!("Invalid hex value: {}", err))
    }
}
