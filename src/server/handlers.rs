//! Request handlers for the public and administrative endpoints.

use crate::protocol::models::{
    CreateLicense, LicenseRecord, UpdateLicense, VerifyRequest, VerifyResponse,
};
use crate::server::error::ApiError;
use crate::server::AppState;
use crate::store::query::{ListQuery, Page};
use crate::LicenseGateError;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::path::PathBuf;
use tracing::warn;

/// Loader script served to storefront pages.
pub const LOADER_SCRIPT: &str = "license-check.js";
/// Script that only loads after a successful verification.
pub const GATED_SCRIPT: &str = "core.js";

/// Run blocking store work off the async executor.
async fn blocking<T, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, LicenseGateError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| LicenseGateError::StoreUnavailable(format!("store task failed: {}", e)))?
        .map_err(ApiError::from)
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| LicenseGateError::Validation(rejection.body_text()).into())
}

fn path_id(id: Result<Path<u64>, PathRejection>) -> Result<u64, ApiError> {
    id.map(|Path(id)| id)
        .map_err(|rejection| LicenseGateError::Validation(rejection.body_text()).into())
}

/// `POST /public/licenses/check-license`
pub async fn check_license(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let request = json_body(payload)?;
    request.validate()?;

    let service = state.service.clone();
    let valid = blocking(move || service.verify(&request.domain, &request.token)).await?;
    Ok(Json(VerifyResponse { valid }))
}

/// `GET /licenses`
pub async fn list_licenses(
    State(state): State<AppState>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Page<LicenseRecord>>, ApiError> {
    let Query(query) =
        query.map_err(|rejection| LicenseGateError::Validation(rejection.body_text()))?;
    let params = query.into_params()?;

    let store = state.store.clone();
    let page = blocking(move || store.list(&params)).await?;
    Ok(Json(page))
}

/// `GET /licenses/{id}`
pub async fn get_license(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<LicenseRecord>, ApiError> {
    let id = path_id(id)?;
    let store = state.store.clone();
    Ok(Json(blocking(move || store.get(id)).await?))
}

/// `POST /licenses`
pub async fn create_license(
    State(state): State<AppState>,
    payload: Result<Json<CreateLicense>, JsonRejection>,
) -> Result<(StatusCode, Json<LicenseRecord>), ApiError> {
    let input = json_body(payload)?;
    input.validate()?;

    let store = state.store.clone();
    let record = blocking(move || store.create(input)).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// `PUT /licenses/{id}`
pub async fn update_license(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateLicense>, JsonRejection>,
) -> Result<Json<LicenseRecord>, ApiError> {
    let id = path_id(id)?;
    let input = json_body(payload)?;
    input.validate()?;

    let store = state.store.clone();
    Ok(Json(blocking(move || store.update(id, input)).await?))
}

/// `DELETE /licenses/{id}`
pub async fn delete_license(
    State(state): State<AppState>,
    id: Result<Path<u64>, PathRejection>,
) -> Result<StatusCode, ApiError> {
    let id = path_id(id)?;
    let store = state.store.clone();
    blocking(move || store.delete(id)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /license-check.js`
pub async fn loader_script(State(state): State<AppState>) -> Response {
    serve_script(state.public_dir.as_ref().map(|d| d.join(LOADER_SCRIPT))).await
}

/// `GET /core.js`
pub async fn gated_script(State(state): State<AppState>) -> Response {
    serve_script(state.public_dir.as_ref().map(|d| d.join(GATED_SCRIPT))).await
}

async fn serve_script(path: Option<PathBuf>) -> Response {
    let Some(path) = path else {
        return (StatusCode::NOT_FOUND, "File not found").into_response();
    };

    match tokio::fs::read(&path).await {
        Ok(bytes) => (
            [(header::CONTENT_TYPE, "application/javascript; charset=utf-8")],
            bytes,
        )
            .into_response(),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "script not served");
            (StatusCode::NOT_FOUND, "File not found").into_response()
        }
    }
}
