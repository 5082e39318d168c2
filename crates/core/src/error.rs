use fhir::OperationOutcome;

/// Errors raised by the record store, the search pipeline and the patient service.
///
/// `NotFound`, `InvalidRequest` and `UnprocessableEntity` are caller contract violations and are
/// surfaced unchanged; nothing in core retries or downgrades them.
#[derive(Debug, thiserror::Error)]
pub enum PatientError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("unprocessable entity: {message}")]
    UnprocessableEntity {
        message: String,
        outcome: OperationOutcome,
    },

    #[error("FHIR error: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type PatientResult<T> = std::result::Result<T, PatientError>;
