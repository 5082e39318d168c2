//! # API REST
//!
//! REST binding of the patient resource server.
//!
//! Handles:
//! - HTTP endpoints with axum (create, read, version read, update, search)
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (FHIR JSON bodies, status mapping, CORS)
//!
//! Uses `fhirstarter-core` for all record operations and `fhir` for wire parsing.

#![warn(rust_2018_idioms)]

pub mod error;

use axum::{
    extract::{rejection::QueryRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{IntoParams, OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use fhir::{Bundle, BundleEntry, DateParam, IdType, Patient};
use fhirstarter_core::{PatientError, PatientService, SearchParameters};

pub use error::ApiError;

/// Content type of FHIR JSON bodies.
pub const FHIR_JSON: &str = "application/fhir+json";

/// Application state shared across REST API handlers.
#[derive(Clone)]
pub struct AppState {
    patient_service: PatientService,
    base_path: Arc<str>,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Query parameters accepted by patient search.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PatientSearchQuery {
    /// Exact family name, case-insensitive.
    pub family: Option<String>,
    /// Exact given name, case-insensitive.
    pub given: Option<String>,
    /// Birth date with optional prefix, e.g. `ge2000-07-28`.
    pub birthdate: Option<String>,
}

/// FHIR operation paths are declared relative to the base path and rebased by [`api_doc`].
#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        search_patients,
        create_patient,
        read_patient,
        vread_patient,
        update_patient,
    ),
    components(schemas(HealthRes))
)]
struct ApiDoc;

/// Builds the application router.
///
/// FHIR resources are mounted under `base_path` (for example `/fhir`); `/health` and the
/// Swagger UI live at the root.
pub fn router(patient_service: PatientService, base_path: &str) -> Router {
    let base_path = normalise_base_path(base_path);
    let state = AppState {
        patient_service,
        base_path: Arc::from(base_path.as_str()),
    };

    let fhir_routes = Router::new()
        .route("/Patient", get(search_patients).post(create_patient))
        .route("/Patient/:id", get(read_patient).put(update_patient))
        .route("/Patient/:id/_history/:vid", get(vread_patient));

    let app = Router::new().route("/health", get(health));
    let app = if base_path.is_empty() {
        app.merge(fhir_routes)
    } else {
        app.nest(&base_path, fhir_routes)
    };

    app.merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_doc(&base_path)))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds `addr` and serves the REST API until the server stops.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the HTTP server fails while running.
pub async fn serve(
    addr: &str,
    patient_service: PatientService,
    base_path: &str,
) -> anyhow::Result<()> {
    let app = router(patient_service, base_path);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("-- REST API listening on {}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}

/// OpenAPI document with the FHIR resource paths mounted under `base_path`.
fn api_doc(base_path: &str) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    doc.paths.paths = std::mem::take(&mut doc.paths.paths)
        .into_iter()
        .map(|(path, item)| {
            if path.starts_with("/Patient") {
                (format!("{base_path}{path}"), item)
            } else {
                (path, item)
            }
        })
        .collect();
    doc
}

/// `"fhir/"` and `"/fhir"` both become `"/fhir"`; `"/"` and `""` become `""` (served at root).
fn normalise_base_path(base_path: &str) -> String {
    let trimmed = base_path.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{trimmed}")
    }
}

fn fhir_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, FHIR_JSON)], body).into_response()
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "FHIR starter REST API is alive".into(),
    })
}

#[utoipa::path(
    get,
    path = "/Patient",
    params(PatientSearchQuery),
    responses(
        (status = 200, description = "Search-set Bundle of matching patients"),
        (status = 400, description = "Malformed or unsupported search parameter")
    )
)]
/// Search patients by family name, given name and birth date.
///
/// All supplied parameters must match. With no parameters every patient is returned.
///
/// # Errors
///
/// Returns `400 Bad Request` if the query string cannot be read (for example a repeated
/// parameter), or if `birthdate` is malformed or uses an unsupported prefix (`sa`, `eb`, `ap`).
#[axum::debug_handler]
async fn search_patients(
    State(state): State<AppState>,
    query: Result<Query<PatientSearchQuery>, QueryRejection>,
) -> Result<Response, ApiError> {
    let Query(query) =
        query.map_err(|rejection| PatientError::InvalidRequest(rejection.body_text()))?;

    let mut params = SearchParameters::new();
    if let Some(family) = query.family {
        params = params.family(family);
    }
    if let Some(given) = query.given {
        params = params.given(given);
    }
    if let Some(birthdate) = query.birthdate {
        params = params.birth_date_param(&DateParam::parse(&birthdate)?)?;
    }

    let entry = state
        .patient_service
        .search(&params)
        .into_iter()
        .map(|patient| BundleEntry {
            full_url: patient
                .id
                .as_ref()
                .map(|id| format!("{}/Patient/{}", state.base_path, id)),
            resource: patient,
        })
        .collect();

    Ok(fhir_response(
        StatusCode::OK,
        Bundle::searchset(entry).render()?,
    ))
}

#[utoipa::path(
    post,
    path = "/Patient",
    request_body(content = String, description = "FHIR Patient resource"),
    responses(
        (status = 201, description = "Patient created; Location names the new version"),
        (status = 400, description = "Malformed Patient resource"),
        (status = 422, description = "Patient failed business validation")
    )
)]
/// Create a new patient.
///
/// # Errors
///
/// Returns `400 Bad Request` for malformed JSON and `422 Unprocessable Entity` when the patient
/// has no usable name.
#[axum::debug_handler]
async fn create_patient(
    State(state): State<AppState>,
    body: String,
) -> Result<Response, ApiError> {
    let patient = Patient::parse(&body)?;
    let id = state.patient_service.create(patient)?;
    let stored = state.patient_service.read(&id)?;

    let location = format!("{}/{}", state.base_path, id);
    let mut response = fhir_response(StatusCode::CREATED, stored.render()?);
    if let Ok(value) = location.parse() {
        response.headers_mut().insert(header::LOCATION, value);
    }
    Ok(response)
}

#[utoipa::path(
    get,
    path = "/Patient/{id}",
    params(("id" = String, Path, description = "Logical id of the patient")),
    responses(
        (status = 200, description = "Current version of the patient"),
        (status = 404, description = "Unknown patient")
    )
)]
/// Read the current version of a patient.
#[axum::debug_handler]
async fn read_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let patient = state.patient_service.read(&IdType::new(id, None))?;
    Ok(fhir_response(StatusCode::OK, patient.render()?))
}

#[utoipa::path(
    get,
    path = "/Patient/{id}/_history/{vid}",
    params(
        ("id" = String, Path, description = "Logical id of the patient"),
        ("vid" = String, Path, description = "Version label")
    ),
    responses(
        (status = 200, description = "The requested version"),
        (status = 404, description = "Unknown patient or version")
    )
)]
/// Read a specific version of a patient.
#[axum::debug_handler]
async fn vread_patient(
    State(state): State<AppState>,
    Path((id, vid)): Path<(String, String)>,
) -> Result<Response, ApiError> {
    let patient = state.patient_service.read(&IdType::new(id, Some(vid)))?;
    Ok(fhir_response(StatusCode::OK, patient.render()?))
}

#[utoipa::path(
    put,
    path = "/Patient/{id}",
    params(("id" = String, Path, description = "Logical id of the patient")),
    request_body(content = String, description = "FHIR Patient resource"),
    responses(
        (status = 200, description = "New current version"),
        (status = 400, description = "Malformed resource or non-numeric id"),
        (status = 404, description = "Unknown patient"),
        (status = 422, description = "Patient failed business validation")
    )
)]
/// Store a new version of an existing patient.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: String,
) -> Result<Response, ApiError> {
    let patient = Patient::parse(&body)?;
    let updated = state
        .patient_service
        .update(&IdType::new(id, None), patient)?;
    Ok(fhir_response(StatusCode::OK, updated.render()?))
}
