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

#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use flavor_common_verifier::{Event, EventLogEntry, HostInfo, HostManifest, Pcr, PcrBank, PcrManifest, PcrValue};
use flavor_rule_verifier::flavor::{
    EventLogEqualsPolicy, Flavor, FlavorDescription, FlavorMeta, PcrPolicy, SignedFlavor,
};
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::pkey::{PKey, Private};
use openssl::rsa::Rsa;
use openssl::sign::Signer;
use openssl::x509::extension::{BasicConstraints, KeyUsage};
use openssl::x509::{X509Builder, X509NameBuilder, X509};
use uuid::Uuid;

pub const DAY: i64 = 24 * 60 * 60;

pub fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

pub fn pcr(index: u32, bank: PcrBank) -> Pcr {
    Pcr::new(index, bank).expect("valid PCR")
}

/// Digest of the bank's size filled with `byte`
pub fn digest(byte: u8, bank: PcrBank) -> String {
    hex::encode(vec![byte; bank.digest_size()])
}

pub fn pcr_value(index: u32, bank: PcrBank, byte: u8) -> PcrValue {
    PcrValue::new(pcr(index, bank), digest(byte, bank))
}

pub fn event(type_id: &str, byte: u8, tags: &[&str]) -> Event {
    Event::new(type_id, "EV_IPL", tags, &digest(byte, PcrBank::Sha256))
}

pub fn log(index: u32, events: Vec<Event>) -> EventLogEntry {
    EventLogEntry::new(pcr(index, PcrBank::Sha256), events)
}

pub fn host_info() -> HostInfo {
    HostInfo {
        host_name: "host-1".to_string(),
        os_name: "RedHatEnterprise".to_string(),
        tpm_version: "2.0".to_string(),
        ..Default::default()
    }
}

/// Manifest reporting `values` and `logs`
pub fn manifest(values: Vec<PcrValue>, logs: Vec<EventLogEntry>) -> HostManifest {
    let mut pcr_manifest = PcrManifest::default();
    for value in values {
        if value.pcr.bank == PcrBank::Sha1 {
            pcr_manifest.sha1_pcrs.push(value);
        } else {
            pcr_manifest.sha2_pcrs.push(value);
        }
    }
    for entry in logs {
        pcr_manifest.pcr_event_log_map.entry(entry.pcr.bank).or_default().push(entry);
    }
    HostManifest { host_info: host_info(), pcr_manifest: Some(pcr_manifest), ..Default::default() }
}

/// Manifest whose PCR value for the log's PCR is the log replayed
pub fn manifest_with_consistent_log(entry: EventLogEntry) -> HostManifest {
    let value = PcrValue::new(entry.pcr, entry.replay().expect("replayable log"));
    manifest(vec![value], vec![entry])
}

pub fn policy(value: &PcrValue) -> PcrPolicy {
    PcrPolicy {
        pcr: value.pcr,
        measurement: value.value.clone(),
        pcr_matches: true,
        eventlog_equals: None,
        eventlog_includes: None,
    }
}

pub fn equals_policy(entry: &EventLogEntry, exclude_tags: &[&str]) -> PcrPolicy {
    PcrPolicy {
        pcr: entry.pcr,
        measurement: entry.replay().expect("replayable log"),
        pcr_matches: false,
        eventlog_equals: Some(EventLogEqualsPolicy {
            events: entry.events.clone(),
            exclude_tags: exclude_tags.iter().map(|tag| tag.to_string()).collect(),
        }),
        eventlog_includes: None,
    }
}

pub fn flavor(part: &str, vendor: Option<&str>, pcrs: Vec<PcrPolicy>) -> SignedFlavor {
    SignedFlavor::new(
        Flavor {
            meta: Some(FlavorMeta {
                id: Uuid::new_v4(),
                vendor: vendor.map(str::to_string),
                description: FlavorDescription {
                    flavor_part: Some(part.to_string()),
                    label: Some(format!("test_{}", part.to_lowercase())),
                    tpm_version: Some("2.0".to_string()),
                    ..Default::default()
                },
            }),
            bios: None,
            hardware: None,
            pcrs,
            external: None,
            software: None,
        },
        "",
    )
}

pub fn sign_flavor(flavor: &mut SignedFlavor, key: &PKey<Private>) {
    let data = flavor.signing_bytes().expect("serializable flavor");
    let mut signer = Signer::new(MessageDigest::sha384(), key).expect("signer");
    signer.update(&data).expect("update");
    flavor.signature = BASE64.encode(signer.sign_to_vec().expect("sign"));
}

pub struct TestCa {
    pub certificate: X509,
    pub key: PKey<Private>,
}

pub fn generate_key() -> PKey<Private> {
    PKey::from_rsa(Rsa::generate(2048).expect("rsa key")).expect("pkey")
}

fn build_certificate(
    common_name: &str,
    key: &PKey<Private>,
    issuer: Option<&TestCa>,
    not_before: i64,
    not_after: i64,
    is_ca: bool,
) -> X509 {
    let mut name = X509NameBuilder::new().expect("name builder");
    name.append_entry_by_text("CN", common_name).expect("CN");
    let name = name.build();

    let mut builder = X509Builder::new().expect("x509 builder");
    builder.set_version(2).expect("version");
    let serial = BigNum::from_u32(rand_serial()).expect("serial").to_asn1_integer().expect("asn1 serial");
    builder.set_serial_number(&serial).expect("serial");
    builder.set_subject_name(&name).expect("subject");
    builder.set_not_before(&Asn1Time::from_unix(not_before).expect("not before")).expect("not before");
    builder.set_not_after(&Asn1Time::from_unix(not_after).expect("not after")).expect("not after");
    builder.set_pubkey(key).expect("pubkey");
    if is_ca {
        builder.append_extension(BasicConstraints::new().critical().ca().build().expect("bc")).expect("bc");
        builder
            .append_extension(KeyUsage::new().critical().key_cert_sign().crl_sign().build().expect("ku"))
            .expect("ku");
    }
    match issuer {
        Some(ca) => {
            builder.set_issuer_name(ca.certificate.subject_name()).expect("issuer");
            builder.sign(&ca.key, MessageDigest::sha256()).expect("sign");
        },
        None => {
            builder.set_issuer_name(&name).expect("issuer");
            builder.sign(key, MessageDigest::sha256()).expect("sign");
        },
    }
    builder.build()
}

fn rand_serial() -> u32 {
    (Uuid::new_v4().as_u128() & 0x7fff_ffff) as u32
}

pub fn generate_ca(common_name: &str) -> TestCa {
    let key = generate_key();
    let certificate = build_certificate(common_name, &key, None, now() - DAY, now() + 365 * DAY, true);
    TestCa { certificate, key }
}

/// Leaf certificate issued by `ca`, validity relative to now in seconds
pub fn issue_certificate(ca: &TestCa, common_name: &str, not_before: i64, not_after: i64) -> (X509, PKey<Private>) {
    let key = generate_key();
    let certificate = build_certificate(common_name, &key, Some(ca), now() + not_before, now() + not_after, false);
    (certificate, key)
}

pub fn issue_valid_certificate(ca: &TestCa, common_name: &str) -> (X509, PKey<Private>) {
    issue_certificate(ca, common_name, -DAY, 30 * DAY)
}

pub fn to_base64_der(certificate: &X509) -> String {
    BASE64.encode(certificate.to_der().expect("der"))
}
