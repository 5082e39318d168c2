//! Mapping of core error kinds onto HTTP responses.
//!
//! Every error body is a FHIR `OperationOutcome`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use fhir::{FhirError, IssueSeverity, IssueType, OperationOutcome};
use fhirstarter_core::PatientError;

use crate::FHIR_JSON;

/// Error returned from REST handlers.
#[derive(Debug)]
pub struct ApiError(pub PatientError);

impl From<PatientError> for ApiError {
    fn from(e: PatientError) -> Self {
        Self(e)
    }
}

impl From<FhirError> for ApiError {
    fn from(e: FhirError) -> Self {
        Self(PatientError::Fhir(e))
    }
}

impl ApiError {
    /// HTTP status and outcome body for this error.
    pub fn status_and_outcome(&self) -> (StatusCode, OperationOutcome) {
        match &self.0 {
            PatientError::NotFound(id) => (
                StatusCode::NOT_FOUND,
                OperationOutcome::single(
                    IssueSeverity::Error,
                    IssueType::NotFound,
                    format!("Resource {id} is not known"),
                )
                .with_diagnostics(id.clone()),
            ),
            PatientError::InvalidRequest(msg) => (
                StatusCode::BAD_REQUEST,
                OperationOutcome::single(IssueSeverity::Error, IssueType::Invalid, msg.clone()),
            ),
            PatientError::Fhir(e) => (
                StatusCode::BAD_REQUEST,
                OperationOutcome::single(IssueSeverity::Error, IssueType::Invalid, e.to_string()),
            ),
            PatientError::UnprocessableEntity { outcome, .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, outcome.clone())
            }
            PatientError::InvalidInput(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                OperationOutcome::single(IssueSeverity::Error, IssueType::Exception, msg.clone()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, outcome) = self.status_and_outcome();

        if status.is_server_error() {
            tracing::error!("request failed: {:?}", self.0);
        } else {
            tracing::warn!("request rejected ({}): {}", status.as_u16(), self.0);
        }

        match outcome.render() {
            Ok(body) => (status, [(header::CONTENT_TYPE, FHIR_JSON)], body).into_response(),
            Err(e) => {
                tracing::error!("failed to render OperationOutcome: {:?}", e);
                (status, self.0.to_string()).into_response()
            }
        }
    }
}
