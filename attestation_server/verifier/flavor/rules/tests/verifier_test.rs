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

mod fixtures;

use std::sync::Arc;
use std::thread;

use flavor_common_verifier::HostManifest;
use flavor_rule_verifier::certificates::{CertificatePool, VerifierCertificates};
use flavor_rule_verifier::{
    Fault, FaultKind, FlavorPart, RuleInfo, RuleResult, SignedFlavor, TrustReport, TrustVerifier, VerifyError,
};

fn os_log() -> flavor_common_verifier::EventLogEntry {
    fixtures::log(17, vec![fixtures::event("0x1", 1, &[]), fixtures::event("0x1", 2, &[])])
}

fn module_log() -> flavor_common_verifier::EventLogEntry {
    fixtures::log(19, vec![fixtures::event("0x1", 5, &[])])
}

fn host() -> HostManifest {
    let os = os_log();
    let modules = module_log();
    let mut manifest = fixtures::manifest_with_consistent_log(os);
    let mut with_modules = fixtures::manifest_with_consistent_log(modules);
    if let (Some(target), Some(source)) = (manifest.pcr_manifest.as_mut(), with_modules.pcr_manifest.take()) {
        target.sha2_pcrs.extend(source.sha2_pcrs);
        for (bank, entries) in source.pcr_event_log_map {
            target.pcr_event_log_map.entry(bank).or_default().extend(entries);
        }
    }
    manifest
}

fn os_flavor() -> SignedFlavor {
    fixtures::flavor("OS", Some("INTEL"), vec![fixtures::equals_policy(&os_log(), &[])])
}

fn host_unique_flavor() -> SignedFlavor {
    let mut policy = fixtures::equals_policy(&module_log(), &[]);
    policy.eventlog_includes = policy.eventlog_equals.take().map(|equals| equals.events);
    fixtures::flavor("HOST_UNIQUE", Some("INTEL"), vec![policy])
}

/// OS flavor expecting an event the host never measured
fn unsatisfied_os_flavor() -> SignedFlavor {
    let mut expected = os_log();
    expected.events.push(fixtures::event("0x1", 9, &[]));
    fixtures::flavor("OS", Some("INTEL"), vec![fixtures::equals_policy(&expected, &[])])
}

fn verifier() -> TrustVerifier {
    TrustVerifier::new(VerifierCertificates::default()).skip_flavor_signature_verification(true)
}

fn all_of_missing(report: &TrustReport) -> Vec<String> {
    report
        .faults()
        .filter(|fault| fault.kind == FaultKind::AllOfFlavorsMissing)
        .map(|fault| fault.description.clone())
        .collect()
}

mod verify_all_of_tests {
    use super::*;

    #[test]
    fn should_trust_host_matching_every_flavor() {
        // Arrange
        let flavors = vec![os_flavor(), host_unique_flavor()];

        // Act
        let report = verifier().verify_all_of(&host(), &flavors).unwrap();

        // Assert
        assert!(report.trusted, "unexpected faults: {:?}", report.faults().collect::<Vec<_>>());
        assert_eq!(report.results.len(), 4);
        assert!(all_of_missing(&report).is_empty());
    }

    #[test]
    fn should_name_missing_os_part() {
        // Arrange
        let flavors = vec![unsatisfied_os_flavor(), host_unique_flavor()];

        // Act
        let report = verifier().verify_all_of(&host(), &flavors).unwrap();

        // Assert
        assert!(!report.trusted);
        assert_eq!(all_of_missing(&report), vec!["All of flavor types missing: OS".to_string()]);
        let last = report.results.last().unwrap();
        assert_eq!(last.rule().name, "com.intel.mtwilson.core.verifier.policy.rule.AllOfFlavors");
        assert_eq!(last.rule().markers, vec![FlavorPart::Os]);
    }

    #[test]
    fn should_report_each_missing_part_once() {
        let flavors = vec![unsatisfied_os_flavor(), unsatisfied_os_flavor()];

        let report = verifier().verify_all_of(&host(), &flavors).unwrap();

        assert_eq!(all_of_missing(&report).len(), 1);
    }

    #[test]
    fn should_mark_part_missing_when_one_of_its_flavors_fails() {
        // Arrange
        let flavors = vec![os_flavor(), unsatisfied_os_flavor()];

        // Act
        let report = verifier().verify_all_of(&host(), &flavors).unwrap();

        // Assert
        assert!(!report.trusted);
        assert_eq!(all_of_missing(&report), vec!["All of flavor types missing: OS".to_string()]);
    }

    #[test]
    fn should_tag_results_with_flavor_id() {
        let flavor = os_flavor();

        let report = verifier().verify_all_of(&host(), std::slice::from_ref(&flavor)).unwrap();

        assert!(report.results.iter().all(|result| result.flavor_id() == flavor.flavor.id()));
    }

    #[test]
    fn should_fail_without_flavors() {
        let result = verifier().verify_all_of(&host(), &[]);

        assert!(matches!(result, Err(VerifyError::InvalidFlavor(_))));
    }

    #[test]
    fn should_abort_on_invalid_flavor() {
        let mut broken = os_flavor();
        broken.flavor.pcrs[0].eventlog_includes = Some(os_log().events);

        let result = verifier().verify_all_of(&host(), &[os_flavor(), broken]);

        assert!(result.is_err());
    }

    #[test]
    fn should_report_pcr_manifest_missing_for_empty_host() {
        let report = verifier().verify_all_of(&HostManifest::default(), &[os_flavor()]).unwrap();

        assert!(!report.trusted);
        assert!(report.faults().any(|fault| fault.kind == FaultKind::PcrManifestMissing));
        assert_eq!(all_of_missing(&report), vec!["All of flavor types missing: OS".to_string()]);
    }

    #[test]
    fn should_serialize_stable_fault_names() {
        let report = verifier().verify_all_of(&host(), &[unsatisfied_os_flavor()]).unwrap();

        let json = serde_json::to_string(&report).unwrap();
        let parsed: TrustReport = serde_json::from_str(&json).unwrap();

        assert!(json.contains("\"com.intel.mtwilson.core.verifier.policy.fault.AllOfFlavorsMissing\""));
        assert!(json.contains("\"com.intel.mtwilson.core.verifier.policy.fault.PcrEventLogMissingExpectedEntries\""));
        assert_eq!(parsed, report);
    }
}

mod verify_flavor_tests {
    use super::*;

    #[test]
    fn should_not_add_all_of_results_for_single_flavor() {
        let report = verifier().verify_flavor(&host(), &unsatisfied_os_flavor()).unwrap();

        assert!(!report.trusted);
        assert!(all_of_missing(&report).is_empty());
    }

    #[test]
    fn should_verify_signed_flavor_end_to_end() {
        // Arrange
        let flavor_ca = fixtures::generate_ca("Flavor CA");
        let (signing_certificate, signing_key) = fixtures::issue_valid_certificate(&flavor_ca, "flavor signer");
        let certificates = VerifierCertificates {
            flavor_ca: CertificatePool::new(vec![flavor_ca.certificate.clone()]),
            flavor_signing_certificate: Some(signing_certificate),
            ..Default::default()
        };
        let mut flavor = os_flavor();
        fixtures::sign_flavor(&mut flavor, &signing_key);

        // Act
        let report = TrustVerifier::new(certificates).verify_flavor(&host(), &flavor).unwrap();

        // Assert
        assert!(report.trusted, "unexpected faults: {:?}", report.faults().collect::<Vec<_>>());
        assert_eq!(report.results.last().unwrap().rule().name, "com.intel.mtwilson.core.verifier.policy.rule.FlavorTrusted");
    }

    #[test]
    fn should_report_unsigned_flavor_when_signatures_are_checked() {
        let report = TrustVerifier::default().verify_flavor(&host(), &os_flavor()).unwrap();

        assert!(!report.trusted);
        assert!(report.faults().any(|fault| fault.kind == FaultKind::FlavorSignatureMissing));
    }
}

#[test]
fn test_verifier_is_shared_across_threads() {
    // Arrange
    let verifier = Arc::new(verifier());
    let manifest = Arc::new(host());

    // Act
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let verifier = Arc::clone(&verifier);
            let manifest = Arc::clone(&manifest);
            thread::spawn(move || verifier.verify_all_of(&manifest, &[os_flavor()]).map(|report| report.trusted))
        })
        .collect();

    // Assert
    for handle in handles {
        assert!(handle.join().unwrap().unwrap());
    }
}

#[test]
fn test_empty_report_is_untrusted() {
    let report = TrustReport::new();
    assert!(!report.is_trusted());
}

#[test]
fn test_report_stays_untrusted_after_trusted_results() {
    // Arrange
    let mut failed = RuleResult::new(RuleInfo::new("PcrMatchesConstant", &[FlavorPart::Os]));
    failed.add_fault(Fault::new(FaultKind::PcrValueMissing, "PCR 17 missing"));
    let mut report = TrustReport::new();

    // Act
    report.add_result(RuleResult::new(RuleInfo::new("PcrEventLogIntegrity", &[FlavorPart::Os])));
    let trusted_after_first = report.is_trusted();
    report.add_result(failed);
    report.add_result(RuleResult::new(RuleInfo::new("PcrEventLogEquals", &[FlavorPart::Os])));

    // Assert
    assert!(trusted_after_first);
    assert!(!report.is_trusted());
    assert_eq!(report.results.len(), 3);
}

#[test]
fn test_rule_result_trust_follows_faults_when_parsed() {
    // Arrange
    let mut result = RuleResult::new(RuleInfo::new("PcrMatchesConstant", &[FlavorPart::Platform]));
    result.add_fault(Fault::new(FaultKind::PcrValueMissing, "PCR 0 missing"));
    let mut json = serde_json::to_value(&result).unwrap();
    json["trusted"] = serde_json::Value::Bool(true);

    // Act
    let parsed: RuleResult = serde_json::from_value(json).unwrap();

    // Assert
    assert!(!parsed.is_trusted());
    assert_eq!(parsed.faults().len(), 1);
    assert_eq!(parsed, result);
}
