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

use std::collections::HashMap;

use log::debug;

use super::builder_impl::intel::IntelTpm20RuleBuilder;
use super::builder_impl::vmware::VmwareRuleBuilder;
use super::rule_builder::{RuleBuildContext, RuleBuilder};
use crate::error::VerifyError;
use crate::flavor::{TpmVersion, Vendor};

pub type BuilderConstructor = for<'a> fn(RuleBuildContext<'a>) -> Box<dyn RuleBuilder + 'a>;

/// Maps a (vendor, TPM version) pair to its rule builder
#[derive(Clone)]
pub struct BuilderRegistry {
    constructors: HashMap<(Vendor, TpmVersion), BuilderConstructor>,
}

impl BuilderRegistry {
    /// Registry without any builder
    pub fn empty() -> Self {
        Self { constructors: HashMap::new() }
    }

    /// Adds or replaces the builder for `vendor` and `tpm_version`
    pub fn register(&mut self, vendor: Vendor, tpm_version: TpmVersion, constructor: BuilderConstructor) {
        if self.constructors.insert((vendor, tpm_version), constructor).is_some() {
            debug!("Replaced rule builder for {} TPM {}", vendor, tpm_version);
        }
    }

    pub fn contains(&self, vendor: Vendor, tpm_version: TpmVersion) -> bool {
        self.constructors.contains_key(&(vendor, tpm_version))
    }

    /// # Errors
    /// * `VerifyError::UnsupportedVendor` - nothing registered for the pair
    pub fn create<'a>(
        &self,
        vendor: Vendor,
        tpm_version: TpmVersion,
        context: RuleBuildContext<'a>,
    ) -> Result<Box<dyn RuleBuilder + 'a>, VerifyError> {
        let constructor = self.constructors.get(&(vendor, tpm_version)).ok_or_else(|| {
            VerifyError::UnsupportedVendor(format!("No rule builder for vendor {} with TPM {}", vendor, tpm_version))
        })?;
        Ok(constructor(context))
    }
}

impl Default for BuilderRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Vendor::Intel, TpmVersion::V20, intel_tpm20);
        registry.register(Vendor::VMware, TpmVersion::V20, vmware_tpm20);
        registry.register(Vendor::VMware, TpmVersion::V12, vmware_tpm12);
        registry
    }
}

fn intel_tpm20<'a>(context: RuleBuildContext<'a>) -> Box<dyn RuleBuilder + 'a> {
    Box::new(IntelTpm20RuleBuilder::new(context))
}

fn vmware_tpm20<'a>(context: RuleBuildContext<'a>) -> Box<dyn RuleBuilder + 'a> {
    Box::new(VmwareRuleBuilder::tpm20(context))
}

fn vmware_tpm12<'a>(context: RuleBuildContext<'a>) -> Box<dyn RuleBuilder + 'a> {
    Box::new(VmwareRuleBuilder::tpm12(context))
}

impl std::fmt::Debug for BuilderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut keys: Vec<String> = self.constructors.keys().map(|(v, t)| format!("{}/{}", v, t)).collect();
        keys.sort();
        f.debug_struct("BuilderRegistry").field("builders", &keys).finish()
    }
}
