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

//! Software measurement logs reported by the host as XML documents.
//!
//! ```xml
//! <Measurement Label="app" Uuid="..." DigestAlg="SHA384">
//!   <Dir Path="/opt/app" Include=".*" Exclude="">ab..</Dir>
//!   <File Path="/opt/app/bin">cd..</File>
//!   <Symlink Path="/opt/app/current">ef..</Symlink>
//!   <CumulativeHash>01..</CumulativeHash>
//! </Measurement>
//! ```

use std::str::FromStr;

use flavor_common_verifier::HashAlgorithm;
use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::VerifyError;

const DEFAULT_DIGEST_ALGORITHM: HashAlgorithm = HashAlgorithm::Sha384;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MeasurementType {
    #[serde(rename = "directoryMeasurementType")]
    Directory,
    #[serde(rename = "fileMeasurementType")]
    File,
    #[serde(rename = "symlinkMeasurementType")]
    Symlink,
}

impl MeasurementType {
    fn from_element(name: &[u8]) -> Option<Self> {
        match name {
            b"Dir" => Some(Self::Directory),
            b"File" => Some(Self::File),
            b"Symlink" => Some(Self::Symlink),
            _ => None,
        }
    }
}

/// One measured path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlMeasurement {
    #[serde(rename = "type")]
    pub measurement_type: MeasurementType,
    pub path: String,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeasurementXml {
    pub label: String,
    pub uuid: Uuid,
    pub digest_alg: Option<String>,
    pub measurements: Vec<XmlMeasurement>,
    pub cumulative_hash: Option<String>,
}

/// Element currently being read and the text that belongs to it
enum Pending {
    Measurement(XmlMeasurement),
    CumulativeHash,
}

impl MeasurementXml {
    /// Parses one measurement document
    ///
    /// # Errors
    /// * `VerifyError::XmlError` - malformed XML, missing `Uuid`/`Path`
    ///   attributes or an unparsable `Uuid`
    pub fn parse(xml: &str) -> Result<Self, VerifyError> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut document: Option<MeasurementXml> = None;
        let mut pending: Option<Pending> = None;

        loop {
            let event = reader
                .read_event()
                .map_err(|e| VerifyError::XmlError(format!("Error at position {}: {}", reader.error_position(), e)))?;
            match event {
                Event::Start(element) => {
                    pending = Self::open_element(&element, &mut document)?;
                },
                Event::Empty(element) => {
                    if let Some(Pending::Measurement(measurement)) = Self::open_element(&element, &mut document)? {
                        Self::document_mut(&mut document)?.measurements.push(measurement);
                    }
                },
                Event::Text(text) => {
                    let text = text.unescape().map_err(|e| VerifyError::XmlError(e.to_string()))?;
                    match pending.as_mut() {
                        Some(Pending::Measurement(measurement)) => measurement.value = text.trim().to_string(),
                        Some(Pending::CumulativeHash) => {
                            Self::document_mut(&mut document)?.cumulative_hash = Some(text.trim().to_string())
                        },
                        None => {},
                    }
                },
                Event::End(_) => match pending.take() {
                    Some(Pending::Measurement(measurement)) => {
                        Self::document_mut(&mut document)?.measurements.push(measurement)
                    },
                    Some(Pending::CumulativeHash) | None => {},
                },
                Event::Eof => break,
                _ => {},
            }
        }

        let document =
            document.ok_or_else(|| VerifyError::XmlError("Document has no Measurement element".to_string()))?;
        debug!(
            "Parsed measurement xml '{}' ({}) with {} measurement(s)",
            document.label,
            document.uuid,
            document.measurements.len()
        );
        Ok(document)
    }

    fn document_mut(document: &mut Option<MeasurementXml>) -> Result<&mut MeasurementXml, VerifyError> {
        document
            .as_mut()
            .ok_or_else(|| VerifyError::XmlError("Measurement entry outside of a Measurement element".to_string()))
    }

    fn open_element(
        element: &BytesStart<'_>,
        document: &mut Option<MeasurementXml>,
    ) -> Result<Option<Pending>, VerifyError> {
        let local_name = element.local_name();
        match local_name.as_ref() {
            b"Measurement" => {
                let uuid = attribute(element, "Uuid")?
                    .ok_or_else(|| VerifyError::XmlError("Measurement element has no Uuid".to_string()))?;
                let uuid = Uuid::parse_str(&uuid)
                    .map_err(|e| VerifyError::XmlError(format!("Invalid measurement Uuid '{}': {}", uuid, e)))?;
                *document = Some(MeasurementXml {
                    label: attribute(element, "Label")?.unwrap_or_default(),
                    uuid,
                    digest_alg: attribute(element, "DigestAlg")?,
                    measurements: Vec::new(),
                    cumulative_hash: None,
                });
                Ok(None)
            },
            b"CumulativeHash" => Ok(Some(Pending::CumulativeHash)),
            name => match MeasurementType::from_element(name) {
                Some(measurement_type) => {
                    let path = attribute(element, "Path")?
                        .ok_or_else(|| VerifyError::XmlError("Measurement entry has no Path".to_string()))?;
                    Ok(Some(Pending::Measurement(XmlMeasurement {
                        measurement_type,
                        path,
                        value: String::new(),
                        include: attribute(element, "Include")?,
                        exclude: attribute(element, "Exclude")?,
                    })))
                },
                None => Ok(None),
            },
        }
    }

    /// Digest algorithm declared by the document, SHA384 when absent
    pub fn digest_algorithm(&self) -> Result<HashAlgorithm, VerifyError> {
        match self.digest_alg.as_deref() {
            Some(name) => Ok(HashAlgorithm::from_str(name)?),
            None => Ok(DEFAULT_DIGEST_ALGORITHM),
        }
    }

    /// Extends every measurement value in document order
    pub fn replay(&self) -> Result<String, VerifyError> {
        let algorithm = self.digest_algorithm()?;
        Ok(algorithm.replay(self.measurements.iter().map(|m| m.value.as_str()))?)
    }

    /// The document among `xmls` describing the flavor `flavor_id`
    ///
    /// Every document is parsed, one unparsable document fails the lookup.
    pub fn find_for_flavor(xmls: &[String], flavor_id: &Uuid) -> Result<Option<MeasurementXml>, VerifyError> {
        let mut found = None;
        for xml in xmls {
            let document = Self::parse(xml)?;
            if found.is_none() && document.uuid == *flavor_id {
                found = Some(document);
            }
        }
        Ok(found)
    }
}

fn attribute(element: &BytesStart<'_>, name: &str) -> Result<Option<String>, VerifyError> {
    for attr in element.attributes() {
        let attr = attr.map_err(|e| VerifyError::XmlError(format!("Malformed attribute: {}", e)))?;
        if attr.key.local_name().as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|e| VerifyError::XmlError(format!("Malformed attribute {}: {}", name, e)))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
