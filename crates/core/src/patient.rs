//! Patient service.
//!
//! This is the facade the protocol layer calls. It applies validation, turns wire-level ids into
//! [`LogicalId`]s (with the error kind each operation requires), delegates to the
//! [`RecordStore`], and stamps `id`/`meta` onto resources on the way out.
//!
//! **No API concerns**: HTTP routing and status mapping belong in `api-rest`.

use crate::config::CoreConfig;
use crate::error::{PatientError, PatientResult};
use crate::search::{self, SearchParameters};
use crate::seed;
use crate::store::{LogicalId, RecordStore, RecordVersion};
use crate::validation::validate_patient;
use fhir::{IdType, Meta, Patient};
use std::sync::Arc;

/// Patient operations over a shared versioned store.
#[derive(Clone, Debug)]
pub struct PatientService {
    store: Arc<RecordStore<Patient>>,
}

impl PatientService {
    /// Creates a service over an existing store.
    pub fn new(store: Arc<RecordStore<Patient>>) -> Self {
        Self { store }
    }

    /// Builds a fresh store from `cfg`, seeding demo patients when configured.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if seeding fails.
    pub fn from_config(cfg: &CoreConfig) -> PatientResult<Self> {
        let service = Self::new(Arc::new(RecordStore::new(cfg.first_logical_id())));

        if cfg.seed_demo_data() {
            let seeded = seed::seed_demo_patients(&service, cfg.seed_count())?;
            tracing::info!(
                "seeded {} demo patients; store holds {} records",
                seeded.len(),
                service.store.len()
            );
        }

        Ok(service)
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<RecordStore<Patient>> {
        &self.store
    }

    /// Validates and stores a new patient.
    ///
    /// Validation runs before an id is allocated, so a rejected patient never consumes one.
    ///
    /// # Returns
    ///
    /// The id of the new resource, qualified with its first version (`Patient/<id>/_history/0`).
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::UnprocessableEntity`] if the patient has no usable name, or
    /// [`PatientError::InvalidInput`] if the store has no identities left to allocate.
    pub fn create(&self, patient: Patient) -> PatientResult<IdType> {
        if let Err(e) = validate_patient(&patient) {
            tracing::warn!("rejected patient create: {}", e);
            return Err(e);
        }

        let logical_id = self.store.create(patient)?;
        tracing::info!("created Patient/{}", logical_id);

        Ok(resource_id(logical_id, "0"))
    }

    /// Reads the current version of a patient, or the version named by `id`.
    ///
    /// # Errors
    ///
    /// Returns [`PatientError::NotFound`] if `id` names another resource type, the id part is not
    /// numeric, the id is unknown, or the requested version does not exist.
    pub fn read(&self, id: &IdType) -> PatientResult<Patient> {
        let result = check_resource_type(id)
            .and_then(|()| {
                id.id_part_as_long()
                    .map_err(|_| PatientError::NotFound(id.to_string()))
            })
            .and_then(|logical_id| {
                self.store
                    .read(LogicalId::new(logical_id), id.version_id_part())
            });

        match result {
            Ok(version) => {
                tracing::debug!(
                    "read Patient/{}/_history/{}",
                    version.logical_id(),
                    version.version_label()
                );
                Ok(to_resource(version))
            }
            Err(e) => {
                tracing::warn!("patient read failed for {}: {}", id, e);
                Err(e)
            }
        }
    }

    /// Validates `patient` and appends it as the new current version of `id`.
    ///
    /// Any version part of `id` is ignored.
    ///
    /// # Returns
    ///
    /// The stored resource, stamped with its new version.
    ///
    /// # Errors
    ///
    /// Returns `PatientError` if:
    /// - the patient has no usable name ([`PatientError::UnprocessableEntity`]),
    /// - the id part is not numeric ([`PatientError::InvalidRequest`]),
    /// - the id was never created ([`PatientError::NotFound`]).
    pub fn update(&self, id: &IdType, patient: Patient) -> PatientResult<Patient> {
        validate_patient(&patient)?;

        let logical_id = id.id_part_as_long().map_err(|_| {
            PatientError::InvalidRequest(format!("Invalid ID {id} - Must be numeric"))
        })?;

        match self.store.update(LogicalId::new(logical_id), patient) {
            Ok(version) => {
                tracing::info!(
                    "updated Patient/{}/_history/{}",
                    version.logical_id(),
                    version.version_label()
                );
                Ok(to_resource(version))
            }
            Err(e) => {
                tracing::warn!(
                    "patient update failed for {}: {}",
                    id.to_unqualified_versionless(),
                    e
                );
                Err(e)
            }
        }
    }

    /// Current versions of all patients matching every predicate in `params`.
    pub fn search(&self, params: &SearchParameters) -> Vec<Patient> {
        let matches = search::search(&self.store, params);
        tracing::debug!(
            "patient search with {} predicates matched {}",
            params.predicates().len(),
            matches.len()
        );
        matches.into_iter().map(to_resource).collect()
    }
}

/// Untyped ids are taken to be patients.
fn check_resource_type(id: &IdType) -> PatientResult<()> {
    match id.resource_type() {
        Some(resource_type) if resource_type != Patient::RESOURCE_TYPE => {
            Err(PatientError::NotFound(id.to_string()))
        }
        _ => Ok(()),
    }
}

fn resource_id(logical_id: LogicalId, version_label: &str) -> IdType {
    IdType::new(logical_id.to_string(), Some(version_label.to_string()))
        .with_resource_type(Patient::RESOURCE_TYPE)
}

/// Copies the version's identity and timestamp into the resource's `id` and `meta`.
fn to_resource(version: RecordVersion<Patient>) -> Patient {
    let logical_id = version.logical_id();
    let version_id = version.version_label().to_string();
    let last_updated = version.last_updated();

    let mut patient = version.into_record();
    patient.id = Some(logical_id.to_string());
    patient.meta = Some(Meta {
        version_id: Some(version_id),
        last_updated: Some(last_updated),
    });
    patient
}
