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

use flavor_common_verifier::EventFieldMismatch;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::fault::Fault;
use crate::flavor::FlavorPart;

pub const RULE_NAME_PREFIX: &str = "com.intel.mtwilson.core.verifier.policy.rule.";

/// Describes the rule that produced a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleInfo {
    pub name: String,
    pub markers: Vec<FlavorPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
}

impl RuleInfo {
    pub fn new(short_name: &str, markers: &[FlavorPart]) -> Self {
        Self { name: format!("{}{}", RULE_NAME_PREFIX, short_name), markers: markers.to_vec(), expected: None }
    }

    pub fn with_expected(mut self, expected: Value) -> Self {
        self.expected = Some(expected);
        self
    }
}

/// Outcome of applying one rule to one host
///
/// `trusted` always equals "no faults"; faults only enter through
/// [`RuleResult::add_fault`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleResultRepr")]
pub struct RuleResult {
    rule: RuleInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    flavor_id: Option<Uuid>,
    trusted: bool,
    faults: Vec<Fault>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    field_mismatches: Vec<EventFieldMismatch>,
}

#[derive(Deserialize)]
struct RuleResultRepr {
    rule: RuleInfo,
    #[serde(default)]
    flavor_id: Option<Uuid>,
    #[serde(default)]
    faults: Vec<Fault>,
    #[serde(default)]
    field_mismatches: Vec<EventFieldMismatch>,
}

impl From<RuleResultRepr> for RuleResult {
    fn from(repr: RuleResultRepr) -> Self {
        Self {
            trusted: repr.faults.is_empty(),
            rule: repr.rule,
            flavor_id: repr.flavor_id,
            faults: repr.faults,
            field_mismatches: repr.field_mismatches,
        }
    }
}

impl RuleResult {
    pub fn new(rule: RuleInfo) -> Self {
        Self { rule, flavor_id: None, trusted: true, faults: Vec::new(), field_mismatches: Vec::new() }
    }

    pub fn add_fault(&mut self, fault: Fault) {
        self.faults.push(fault);
        self.trusted = false;
    }

    pub fn with_flavor_id(mut self, flavor_id: Option<Uuid>) -> Self {
        self.flavor_id = flavor_id;
        self
    }

    /// Attaches advisory field mismatches, they never affect trust
    pub fn with_field_mismatches(mut self, field_mismatches: Vec<EventFieldMismatch>) -> Self {
        self.field_mismatches = field_mismatches;
        self
    }

    pub fn rule(&self) -> &RuleInfo {
        &self.rule
    }

    pub fn flavor_id(&self) -> Option<Uuid> {
        self.flavor_id
    }

    pub fn faults(&self) -> &[Fault] {
        &self.faults
    }

    pub fn field_mismatches(&self) -> &[EventFieldMismatch] {
        &self.field_mismatches
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }
}

/// Combined verdict over every rule applied to a host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustReport {
    pub trusted: bool,
    pub results: Vec<RuleResult>,
}

impl TrustReport {
    /// An empty report is untrusted
    pub fn new() -> Self {
        Self { trusted: false, results: Vec::new() }
    }

    pub fn add_result(&mut self, result: RuleResult) {
        self.trusted = (self.trusted || self.results.is_empty()) && result.is_trusted();
        self.results.push(result);
    }

    pub fn add_results(&mut self, results: impl IntoIterator<Item = RuleResult>) {
        for result in results {
            self.add_result(result);
        }
    }

    pub fn is_trusted(&self) -> bool {
        self.trusted
    }

    pub fn faults(&self) -> impl Iterator<Item = &Fault> {
        self.results.iter().flat_map(|result| result.faults.iter())
    }
}
