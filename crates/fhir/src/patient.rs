//! FHIR-aligned patient resource and JSON translation helpers.
//!
//! This module provides both domain-level types and wire models for patient resources,
//! which carry patient demographics and identification information.
//!
//! Responsibilities:
//! - Define public domain-level types for use by the store and the API layer
//! - Define a strict wire model for serialisation/deserialisation
//! - Provide translation helpers between domain types and the wire model
//!
//! Notes:
//! - Domain types are typed (dates, enums); the wire model is plain strings
//! - Business rules (for example "a patient must have a name") live in the core crate

use crate::{FhirError, FhirResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Date format used by `Patient.birthDate`.
const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

// ============================================================================
// Public domain-level types
// ============================================================================

/// Purpose of a human name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameUse {
    /// Official name.
    Official,
    /// Usual/preferred name.
    Usual,
    /// Temporary name.
    Temp,
    /// Nickname or informal name.
    Nickname,
    /// Anonymous name.
    Anonymous,
    /// Old name (no longer in use).
    Old,
    /// Maiden name.
    Maiden,
}

impl NameUse {
    /// Convert to FHIR wire format string.
    fn to_wire(self) -> &'static str {
        match self {
            NameUse::Official => "official",
            NameUse::Usual => "usual",
            NameUse::Temp => "temp",
            NameUse::Nickname => "nickname",
            NameUse::Anonymous => "anonymous",
            NameUse::Old => "old",
            NameUse::Maiden => "maiden",
        }
    }

    /// Parse from FHIR wire format string.
    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "official" => Some(NameUse::Official),
            "usual" => Some(NameUse::Usual),
            "temp" => Some(NameUse::Temp),
            "nickname" => Some(NameUse::Nickname),
            "anonymous" => Some(NameUse::Anonymous),
            "old" => Some(NameUse::Old),
            "maiden" => Some(NameUse::Maiden),
            _ => None,
        }
    }
}

/// Administrative gender of a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    fn to_wire(self) -> &'static str {
        match self {
            AdministrativeGender::Male => "male",
            AdministrativeGender::Female => "female",
            AdministrativeGender::Other => "other",
            AdministrativeGender::Unknown => "unknown",
        }
    }

    fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(AdministrativeGender::Male),
            "female" => Some(AdministrativeGender::Female),
            "other" => Some(AdministrativeGender::Other),
            "unknown" => Some(AdministrativeGender::Unknown),
            _ => None,
        }
    }
}

/// A human name (`Patient.name`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HumanName {
    /// Purpose of the name (official, usual, nickname, etc.).
    pub use_type: Option<NameUse>,

    /// Full text representation of the name.
    pub text: Option<String>,

    /// Family name (surname).
    pub family: Option<String>,

    /// Given names (first name, middle names).
    pub given: Vec<String>,
}

impl HumanName {
    /// Creates an official name with the given family and given names.
    pub fn new<I, S>(family: impl Into<String>, given: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            use_type: Some(NameUse::Official),
            text: None,
            family: Some(family.into()),
            given: given.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns `true` when no element of the name is set: no `use`, family, given or text.
    ///
    /// Whitespace-only strings count as absent.
    pub fn is_empty(&self) -> bool {
        fn blank(value: &Option<String>) -> bool {
            value.as_deref().map_or(true, |v| v.trim().is_empty())
        }

        self.use_type.is_none()
            && blank(&self.family)
            && blank(&self.text)
            && self.given.iter().all(|g| g.trim().is_empty())
    }
}

/// An external-system identifier (`Patient.identifier`).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Identifier {
    /// Namespace URI of the identifier value.
    pub system: Option<String>,

    /// The identifier value within the system.
    pub value: Option<String>,
}

impl Identifier {
    pub fn new(system: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            system: Some(system.into()),
            value: Some(value.into()),
        }
    }
}

/// A literal reference to another resource, e.g. `Organization/1`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reference {
    pub reference: String,
}

impl Reference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

/// Resource metadata maintained by the server.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Meta {
    /// Version label of this resource version.
    pub version_id: Option<String>,

    /// When this version was stored.
    pub last_updated: Option<DateTime<Utc>>,
}

/// Domain-level patient resource.
///
/// Unlike a flat demographics carrier, this keeps every name entry, since search
/// matches against any of them.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Patient {
    /// Logical id assigned by the server.
    pub id: Option<String>,

    /// Server-maintained metadata.
    pub meta: Option<Meta>,

    /// External-system identifiers.
    pub identifier: Vec<Identifier>,

    /// Name entries, in order of preference.
    pub name: Vec<HumanName>,

    /// Administrative gender.
    pub gender: Option<AdministrativeGender>,

    /// Date of birth.
    pub birth_date: Option<NaiveDate>,

    /// Organisation that is the custodian of the patient record.
    pub managing_organization: Option<Reference>,
}

// ============================================================================
// Public Patient operations
// ============================================================================

impl Patient {
    /// FHIR resource type name.
    pub const RESOURCE_TYPE: &'static str = "Patient";

    /// Parse a patient resource from FHIR JSON text.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `name[0].family`)
    /// to the failing field when the JSON does not match the wire schema.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not represent a valid patient resource,
    /// - any field has an unexpected type,
    /// - any unknown keys are present (due to `#[serde(deny_unknown_fields)]`),
    /// - `resourceType` is not "Patient",
    /// - a coded value (`gender`, `name.use`) or a date is not recognised.
    pub fn parse(json_text: &str) -> FhirResult<Patient> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let wire = match serde_path_to_error::deserialize::<_, PatientWire>(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Patient schema mismatch at {path}: {source}"
                )));
            }
        };

        if wire.resource_type != Self::RESOURCE_TYPE {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Patient', got '{}'",
                wire.resource_type
            )));
        }

        wire_to_domain(wire)
    }

    /// Render this patient as FHIR JSON text.
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if serialisation fails.
    pub fn render(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(&domain_to_wire(self))
            .map_err(|e| FhirError::Translation(format!("Failed to serialise patient: {e}")))
    }

    /// Render this patient as a JSON value, for embedding in a `Bundle`.
    pub fn to_json_value(&self) -> FhirResult<serde_json::Value> {
        Ok(serde_json::to_value(domain_to_wire(self))?)
    }

    /// The first name entry, if any.
    pub fn name_first_rep(&self) -> Option<&HumanName> {
        self.name.first()
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

/// Wire representation of a patient resource in FHIR JSON.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct PatientWire {
    #[serde(rename = "resourceType")]
    pub resource_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<IdentifierWire>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub name: Vec<HumanNameWire>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    #[serde(rename = "birthDate", default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(
        rename = "managingOrganization",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub managing_organization: Option<ReferenceWire>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct HumanNameWire {
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_type: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub given: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct IdentifierWire {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct ReferenceWire {
    pub reference: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
struct MetaWire {
    #[serde(rename = "versionId", default, skip_serializing_if = "Option::is_none")]
    pub version_id: Option<String>,

    #[serde(rename = "lastUpdated", default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn wire_to_domain(wire: PatientWire) -> FhirResult<Patient> {
    let name = wire
        .name
        .into_iter()
        .enumerate()
        .map(|(i, n)| {
            let use_type = n
                .use_type
                .as_deref()
                .map(|u| {
                    NameUse::from_wire(u).ok_or_else(|| {
                        FhirError::Translation(format!("Unknown name use at name[{i}].use: '{u}'"))
                    })
                })
                .transpose()?;
            Ok(HumanName {
                use_type,
                text: n.text,
                family: n.family,
                given: n.given,
            })
        })
        .collect::<FhirResult<Vec<_>>>()?;

    let gender = wire
        .gender
        .as_deref()
        .map(|g| {
            AdministrativeGender::from_wire(g)
                .ok_or_else(|| FhirError::Translation(format!("Unknown gender: '{g}'")))
        })
        .transpose()?;

    let birth_date = wire
        .birth_date
        .as_deref()
        .map(|d| {
            NaiveDate::parse_from_str(d, BIRTH_DATE_FORMAT)
                .map_err(|e| FhirError::Translation(format!("Invalid birthDate '{d}': {e}")))
        })
        .transpose()?;

    let meta = wire
        .meta
        .map(|m| {
            let last_updated = m
                .last_updated
                .as_deref()
                .map(|s| {
                    DateTime::parse_from_rfc3339(s)
                        .map(|dt| dt.with_timezone(&Utc))
                        .map_err(|e| {
                            FhirError::Translation(format!("Invalid meta.lastUpdated '{s}': {e}"))
                        })
                })
                .transpose()?;
            Ok::<_, FhirError>(Meta {
                version_id: m.version_id,
                last_updated,
            })
        })
        .transpose()?;

    Ok(Patient {
        id: wire.id,
        meta,
        identifier: wire
            .identifier
            .into_iter()
            .map(|i| Identifier {
                system: i.system,
                value: i.value,
            })
            .collect(),
        name,
        gender,
        birth_date,
        managing_organization: wire
            .managing_organization
            .map(|r| Reference::new(r.reference)),
    })
}

fn domain_to_wire(patient: &Patient) -> PatientWire {
    PatientWire {
        resource_type: Patient::RESOURCE_TYPE.to_string(),
        id: patient.id.clone(),
        meta: patient.meta.as_ref().map(|m| MetaWire {
            version_id: m.version_id.clone(),
            last_updated: m.last_updated.map(|dt| dt.to_rfc3339()),
        }),
        identifier: patient
            .identifier
            .iter()
            .map(|i| IdentifierWire {
                system: i.system.clone(),
                value: i.value.clone(),
            })
            .collect(),
        name: patient
            .name
            .iter()
            .map(|n| HumanNameWire {
                use_type: n.use_type.map(|u| u.to_wire().to_string()),
                text: n.text.clone(),
                family: n.family.clone(),
                given: n.given.clone(),
            })
            .collect(),
        gender: patient.gender.map(|g| g.to_wire().to_string()),
        birth_date: patient
            .birth_date
            .map(|d| d.format(BIRTH_DATE_FORMAT).to_string()),
        managing_organization: patient
            .managing_organization
            .as_ref()
            .map(|r| ReferenceWire {
                reference: r.reference.clone(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
  "resourceType": "Patient",
  "id": "51",
  "meta": { "versionId": "0", "lastUpdated": "2026-01-23T13:58:04.099304Z" },
  "identifier": [
    { "system": "http://gyms.are.us.com/gyms.are.us.memberid", "value": "GYMS.R.US...51" }
  ],
  "name": [
    { "use": "official", "family": "Williams", "given": ["Sarah", "Jane"] },
    { "use": "nickname", "given": ["Sally"] }
  ],
  "gender": "female",
  "birthDate": "1992-03-20",
  "managingOrganization": { "reference": "Organization/1" }
}"#;

    #[test]
    fn parses_full_patient() {
        let patient = Patient::parse(SAMPLE).expect("parse json");

        assert_eq!(patient.id.as_deref(), Some("51"));
        assert_eq!(patient.name.len(), 2);
        assert_eq!(patient.name[0].use_type, Some(NameUse::Official));
        assert_eq!(patient.name[0].family.as_deref(), Some("Williams"));
        assert_eq!(patient.name[1].given, vec!["Sally"]);
        assert_eq!(patient.gender, Some(AdministrativeGender::Female));
        assert_eq!(
            patient.birth_date,
            Some(NaiveDate::from_ymd_opt(1992, 3, 20).unwrap())
        );
        assert_eq!(
            patient.managing_organization,
            Some(Reference::new("Organization/1"))
        );
        let meta = patient.meta.expect("meta present");
        assert_eq!(meta.version_id.as_deref(), Some("0"));
        assert_eq!(
            meta.last_updated.unwrap().to_rfc3339(),
            "2026-01-23T13:58:04.099304+00:00"
        );
    }

    #[test]
    fn render_then_parse_preserves_patient() {
        let patient = Patient::parse(SAMPLE).expect("parse json");
        let output = patient.render().expect("render patient");
        let reparsed = Patient::parse(&output).expect("reparse json");
        assert_eq!(patient, reparsed);
    }

    #[test]
    fn strict_validation_rejects_unknown_keys() {
        let input = r#"{"resourceType": "Patient", "name": [{"family": "Smith", "nickname": "x"}]}"#;

        let err = Patient::parse(input).expect_err("should reject unknown key");
        match err {
            FhirError::Translation(msg) => {
                assert!(msg.contains("name[0]"), "{msg}");
                assert!(msg.contains("nickname"), "{msg}");
            }
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn strict_validation_rejects_wrong_types() {
        let input = r#"{"resourceType": "Patient", "name": [{"family": "Smith", "given": "Ann"}]}"#;

        let err = Patient::parse(input).expect_err("should reject wrong type");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("given"), "{msg}"),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_invalid_resource_type() {
        let err = Patient::parse(r#"{"resourceType": "Observation"}"#)
            .expect_err("should reject invalid resourceType");
        match err {
            FhirError::InvalidInput(msg) => assert!(msg.contains("Observation")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_gender_and_bad_birth_date() {
        let err = Patient::parse(r#"{"resourceType": "Patient", "gender": "robot"}"#)
            .expect_err("unknown gender");
        assert!(matches!(err, FhirError::Translation(msg) if msg.contains("robot")));

        let err = Patient::parse(r#"{"resourceType": "Patient", "birthDate": "2000-13-01"}"#)
            .expect_err("bad birth date");
        assert!(matches!(err, FhirError::Translation(msg) if msg.contains("birthDate")));
    }

    #[test]
    fn renders_minimal_patient_without_optional_fields() {
        let json = Patient::default().render().expect("render");
        assert!(json.contains("\"resourceType\": \"Patient\""));
        assert!(!json.contains("name"));
        assert!(!json.contains("birthDate"));
        assert!(!json.contains("meta"));
    }

    #[test]
    fn human_name_emptiness() {
        assert!(HumanName::default().is_empty());
        assert!(HumanName {
            family: Some("  ".into()),
            given: vec!["".into()],
            ..HumanName::default()
        }
        .is_empty());
        assert!(!HumanName::new("Smith", Vec::<String>::new()).is_empty());
        assert!(!HumanName {
            given: vec!["Ann".into()],
            ..HumanName::default()
        }
        .is_empty());
        assert!(!HumanName {
            use_type: Some(NameUse::Official),
            ..HumanName::default()
        }
        .is_empty());
    }

    #[test]
    fn name_with_only_use_parses_as_non_empty() {
        let patient =
            Patient::parse(r#"{"resourceType": "Patient", "name": [{"use": "official"}]}"#)
                .expect("valid patient");
        assert!(!patient.name[0].is_empty());
    }
}
