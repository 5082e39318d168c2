//! # FHIR Starter Core
//!
//! Core business logic for the patient resource server.
//!
//! This crate contains pure in-memory data operations:
//! - a versioned record store with monotonic identities and append-only histories
//! - a query filter pipeline over the current version of every record
//! - patient validation, startup configuration and demo seed data
//!
//! **No API concerns**: HTTP servers, routing and wire parsing belong in `api-rest` and `fhir`.

pub mod config;
pub mod constants;
pub mod error;
pub mod patient;
pub mod search;
pub mod seed;
pub mod store;
pub mod validation;

pub use config::CoreConfig;
pub use constants::{DEFAULT_BASE_PATH, DEFAULT_REST_ADDR};
pub use error::{PatientError, PatientResult};
pub use patient::PatientService;
pub use search::{DateComparator, SearchParameters, SearchPredicate};
pub use store::{LogicalId, RecordStore, RecordVersion};
