//! Business validation applied before a patient is stored.
//!
//! The only rule enforced is that the first name entry exists and carries some content. Failures
//! are reported as [`PatientError::UnprocessableEntity`] with an `OperationOutcome`, so callers
//! can render a diagnostic rather than a generic failure.

use crate::{PatientError, PatientResult};
use fhir::{IssueSeverity, IssueType, OperationOutcome, Patient};

/// Detail text attached to the outcome when a patient has no usable name.
pub const MISSING_NAME_DETAIL: &str =
    "No family name provided, Patient resources must have at least one family name.";

/// Validates that `patient` may be created or stored as a new version.
///
/// # Errors
///
/// Returns [`PatientError::UnprocessableEntity`] if the first name entry is absent or empty.
pub fn validate_patient(patient: &Patient) -> PatientResult<()> {
    let has_usable_name = patient
        .name_first_rep()
        .is_some_and(|name| !name.is_empty());

    if !has_usable_name {
        return Err(PatientError::UnprocessableEntity {
            message: "Patient has no name".into(),
            outcome: OperationOutcome::single(
                IssueSeverity::Fatal,
                IssueType::Required,
                MISSING_NAME_DETAIL,
            ),
        });
    }

    Ok(())
}
