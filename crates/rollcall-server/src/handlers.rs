//! REST handlers for the attendance surface.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use serde::Deserialize;
use serde_json::json;

use rollcall_auth::{AuthError, Principal, bearer_from_headers};
use rollcall_core::validate_id;

use crate::api::{InvalidateResponse, MarkAttendanceRequest, MarkResponse};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn root() -> impl IntoResponse {
    let body = json!({
        "service": "Rollcall Server",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ok" })))
}

pub async fn readyz() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "status": "ready" })))
}

pub async fn metrics(State(state): State<AppState>) -> impl IntoResponse {
    match state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()).into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}

/// Mutating requests must present a verified bearer token.
async fn require_bearer(state: &AppState, headers: &HeaderMap) -> Result<Principal, ApiError> {
    let token = bearer_from_headers(headers)
        .ok_or_else(|| AuthError::unauthorized("Token not provided"))?;
    Ok(state.verifier.verify(&token).await?)
}

#[derive(Debug, Deserialize)]
pub struct DataQuery {
    key: String,
}

/// `GET /attendance/data?key=` — cached record by exact key.
pub async fn get_data(
    State(state): State<AppState>,
    Query(query): Query<DataQuery>,
) -> Result<impl IntoResponse, ApiError> {
    if query.key.is_empty() {
        return Err(ApiError::Validation("Cache key is required".into()));
    }
    let record = state.cache.cached_record(&query.key).await?;
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentQuery {
    class_id: String,
    student_id: String,
}

/// `GET /attendance/student?classId=&studentId=` — today's record.
pub async fn get_student(
    State(state): State<AppState>,
    Query(query): Query<StudentQuery>,
) -> Result<impl IntoResponse, ApiError> {
    validate_id(&query.class_id)?;
    validate_id(&query.student_id)?;

    let record = state
        .cache
        .student_record(&query.class_id, &query.student_id)
        .await?;
    Ok(Json(record))
}

/// `POST /attendance/mark` — write through the cache, enqueue for
/// offline sync, broadcast to the class room.
pub async fn mark_attendance(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<MarkAttendanceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let principal = require_bearer(&state, &headers).await?;
    req.validate()?;

    tracing::info!(
        user = %principal.display_name(),
        class_id = %req.class_id,
        student_id = %req.student_id,
        "marking attendance"
    );

    let cache_key = state.mark(&req).await?;
    Ok(Json(MarkResponse {
        message: "Attendance marked".into(),
        cache_key,
    }))
}

/// `DELETE /attendance/invalidate/{classId}/{studentId}` — drop today's
/// entry for one student.
pub async fn invalidate_student(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path((class_id, student_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    require_bearer(&state, &headers).await?;
    validate_id(&class_id)?;
    validate_id(&student_id)?;

    state.cache.invalidate_student(&class_id, &student_id).await?;
    Ok(Json(InvalidateResponse {
        message: "Attendance cache invalidated".into(),
        removed: None,
    }))
}

/// `DELETE /attendance/invalidate/class/{classId}` — drop every indexed
/// entry for the class.
pub async fn invalidate_class(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(class_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    require_bearer(&state, &headers).await?;
    validate_id(&class_id)?;

    let removed = state.cache.invalidate_class(&class_id).await?;
    Ok(Json(InvalidateResponse {
        message: "Class attendance cache invalidated".into(),
        removed: Some(removed),
    }))
}
