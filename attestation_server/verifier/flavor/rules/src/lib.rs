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

//! Flavor based host trust verification.
//!
//! A [`TrustVerifier`] turns each signed flavor into rules through the
//! vendor rule builders, applies them to a [`HostManifest`] and folds the
//! results into a [`TrustReport`].

mod error;
pub mod builder;
pub mod certificates;
pub mod factory;
pub mod fault;
pub mod flavor;
pub mod measurement_xml;
pub mod result;
pub mod rules;
pub mod verifier;

pub use error::VerifyError;
pub use fault::{Fault, FaultKind, FAULT_NAME_PREFIX};
pub use flavor::{Flavor, FlavorMeta, FlavorPart, PcrPolicy, SignedFlavor, TpmVersion, Vendor};
pub use result::{RuleInfo, RuleResult, TrustReport};
pub use verifier::TrustVerifier;

pub use flavor_common_verifier::HostManifest;
