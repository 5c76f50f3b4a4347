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

//! Measurement model shared by the flavor verifiers.
//!
//! Holds the PCR identity and value types, the TCG event-log shape together
//! with its replay and set-difference algorithms, and the host manifest that
//! the rules are evaluated against.

mod error;
pub mod pcr;
pub mod event_log;
pub mod manifest;

pub use error::MeasurementError;
pub use pcr::{HashAlgorithm, Pcr, PcrBank, PcrValue, PCR_INDEX_MAX};
pub use event_log::{Event, EventFieldMismatch, EventLogDiff, EventLogEntry};
pub use manifest::{HostInfo, HostManifest, PcrManifest};
