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

use clap::Parser;
use flavor_common_verifier::{Event, EventLogEntry, HostInfo, HostManifest, Pcr, PcrBank, PcrManifest, PcrValue};
use flavor_rule_verifier::certificates::VerifierCertificates;
use flavor_rule_verifier::flavor::{EventLogEqualsPolicy, Flavor, FlavorDescription, FlavorMeta, PcrPolicy};
use flavor_rule_verifier::{SignedFlavor, TrustVerifier};
use tempfile::TempDir;
use trust_cli::commands::Cli;
use trust_cli::error::CliError;
use trust_cli::verify::{read_flavors, verify_hosts};
use uuid::Uuid;

fn os_log() -> EventLogEntry {
    let pcr = Pcr::new(17, PcrBank::Sha256).expect("valid PCR");
    EventLogEntry::new(
        pcr,
        vec![
            Event::new("0x1", "EV_IPL", &[], &"11".repeat(32)),
            Event::new("0x1", "EV_IPL", &["initrd"], &"22".repeat(32)),
        ],
    )
}

fn host(name: &str, with_log: bool) -> HostManifest {
    let entry = os_log();
    let mut pcr_manifest = PcrManifest::default();
    pcr_manifest.sha2_pcrs.push(PcrValue::new(entry.pcr, entry.replay().expect("replayable log")));
    if with_log {
        pcr_manifest.pcr_event_log_map.entry(PcrBank::Sha256).or_default().push(entry);
    }
    HostManifest {
        host_info: HostInfo {
            host_name: name.to_string(),
            os_name: "RedHatEnterprise".to_string(),
            tpm_version: "2.0".to_string(),
            ..Default::default()
        },
        pcr_manifest: Some(pcr_manifest),
        ..Default::default()
    }
}

fn os_flavor() -> SignedFlavor {
    let entry = os_log();
    let policy = PcrPolicy {
        pcr: entry.pcr,
        measurement: entry.replay().expect("replayable log"),
        pcr_matches: false,
        eventlog_equals: Some(EventLogEqualsPolicy { events: entry.events.clone(), exclude_tags: Default::default() }),
        eventlog_includes: None,
    };
    let flavor = Flavor {
        meta: Some(FlavorMeta {
            id: Uuid::new_v4(),
            vendor: Some("INTEL".to_string()),
            description: FlavorDescription {
                flavor_part: Some("OS".to_string()),
                tpm_version: Some("2.0".to_string()),
                ..Default::default()
            },
        }),
        bios: None,
        hardware: None,
        pcrs: vec![policy],
        external: None,
        software: None,
    };
    SignedFlavor::new(flavor, "")
}

fn write_json<T: serde::Serialize>(dir: &Path, name: &str, value: &T) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec(value).expect("serializable")).expect("Failed to write file");
    path
}

fn verifier() -> Arc<TrustVerifier> {
    Arc::new(TrustVerifier::new(VerifierCertificates::default()).skip_flavor_signature_verification(true))
}

#[test]
fn test_read_flavors_accepts_single_object_and_array() {
    // Arrange
    let dir = TempDir::new().expect("Failed to create temp dir");
    let single = write_json(dir.path(), "single.json", &os_flavor());
    let many = write_json(dir.path(), "many.json", &vec![os_flavor(), os_flavor()]);

    // Act
    let single = read_flavors(&single).expect("single flavor");
    let many = read_flavors(&many).expect("flavor array");

    // Assert
    assert_eq!(single.len(), 1);
    assert_eq!(many.len(), 2);
}

#[test]
fn test_read_flavors_rejects_empty_array() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let empty = write_json(dir.path(), "empty.json", &Vec::<SignedFlavor>::new());

    assert!(matches!(read_flavors(&empty), Err(CliError::ParseError(_))));
}

#[tokio::test]
async fn test_verify_hosts_reports_each_host_in_order() {
    // Arrange
    let dir = TempDir::new().expect("Failed to create temp dir");
    let good = write_json(dir.path(), "good.json", &host("good", true));
    let bad = write_json(dir.path(), "bad.json", &host("bad", false));
    let also_good = write_json(dir.path(), "also_good.json", &host("also-good", true));
    let flavors = Arc::new(vec![os_flavor()]);

    // Act
    let reports = verify_hosts(verifier(), vec![good, bad, also_good], flavors).await.expect("verification runs");

    // Assert
    let names: Vec<&str> = reports.iter().map(|r| r.host_name.as_str()).collect();
    assert_eq!(names, vec!["good", "bad", "also-good"]);
    assert!(reports[0].trusted);
    assert!(!reports[1].trusted);
    assert!(reports[2].trusted);
}

#[tokio::test]
async fn test_verify_hosts_fails_on_unreadable_manifest() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let good = write_json(dir.path(), "good.json", &host("good", true));
    let missing = dir.path().join("missing.json");

    let result = verify_hosts(verifier(), vec![good, missing], Arc::new(vec![os_flavor()])).await;

    assert!(matches!(result, Err(CliError::IoError { .. })));
}

#[tokio::test]
async fn test_execute_verify_command() {
    // Arrange
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = dir.path().join("trust_cli.yaml");
    fs::write(&config, "verifier:\n  skip_flavor_signature_verification: false\n").expect("Failed to write config");
    let manifest = write_json(dir.path(), "host.json", &host("host-1", true));
    let flavors = write_json(dir.path(), "flavors.json", &vec![os_flavor()]);
    let cli = Cli::try_parse_from([
        "trust_cli",
        "--config",
        config.to_str().expect("utf-8 path"),
        "verify",
        "--manifest",
        manifest.to_str().expect("utf-8 path"),
        "--flavors",
        flavors.to_str().expect("utf-8 path"),
        "--skip-signature",
    ])
    .expect("valid arguments");

    // Act
    let (output, trusted) = trust_cli::execute(cli).await.expect("command runs");

    // Assert
    assert!(trusted);
    assert_eq!(output["host_name"], "host-1");
    assert_eq!(output["report"]["trusted"], true);
}

#[tokio::test]
async fn test_execute_verify_hosts_untrusted_without_signature_skip() {
    // Arrange
    let dir = TempDir::new().expect("Failed to create temp dir");
    let config = dir.path().join("trust_cli.yaml");
    fs::write(&config, "verifier: {}\n").expect("Failed to write config");
    let manifest = write_json(dir.path(), "host.json", &host("host-1", true));
    let flavors = write_json(dir.path(), "flavors.json", &vec![os_flavor()]);
    let cli = Cli::try_parse_from([
        "trust_cli",
        "-c",
        config.to_str().expect("utf-8 path"),
        "verify-hosts",
        "--manifests",
        manifest.to_str().expect("utf-8 path"),
        "--flavors",
        flavors.to_str().expect("utf-8 path"),
    ])
    .expect("valid arguments");

    // Act
    let (output, trusted) = trust_cli::execute(cli).await.expect("command runs");

    // Assert
    assert!(!trusted);
    assert_eq!(output.as_array().map(Vec::len), Some(1));
    assert_eq!(output[0]["trusted"], false);
}

#[test]
fn test_verify_hosts_requires_manifests() {
    let result = Cli::try_parse_from(["trust_cli", "verify-hosts", "--flavors", "flavors.json"]);

    assert!(result.is_err());
}
