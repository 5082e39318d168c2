//! FHIR wire/boundary support for the patient resource server.
//!
//! This crate provides **wire models** and **format/translation helpers** for the FHIR JSON that
//! crosses the REST boundary:
//! - the `Patient` resource shape used by the record store
//! - `OperationOutcome` and search-set `Bundle` responses
//! - parsing of resource ids (`Patient/51/_history/0`) and prefixed date search values
//!   (`ge2000-07-28`)
//!
//! This crate focuses on:
//! - FHIR semantic alignment for the subset of fields the server uses
//! - serialisation/deserialisation
//! - translation between domain types and wire structs
//!
//! Business rules (validation, versioning, search semantics) belong in the core crate.

pub mod bundle;
pub mod id;
pub mod outcome;
pub mod patient;
pub mod search_param;

pub use bundle::{Bundle, BundleEntry};
pub use id::IdType;
pub use outcome::{IssueSeverity, IssueType, OperationOutcome, OperationOutcomeIssue};
pub use patient::{
    AdministrativeGender, HumanName, Identifier, Meta, NameUse, Patient, Reference,
};
pub use search_param::{DateParam, ParamPrefix};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("invalid date parameter: {0}")]
    InvalidDateParam(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
