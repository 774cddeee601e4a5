//! Case endpoints
//!
//! Writes hit the disk (and usually fsync), so they run on the blocking pool.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use super::{ApiError, ApiResponse, AppState};
use crate::error::StoreResult;
use crate::model::Model;
use crate::types::Case;

/// Response for a newly created case
#[derive(Debug, Serialize)]
pub struct CreatedCase {
    pub id: u64,
}

/// GET /api/cases - All cases keyed by ID
pub async fn list_cases(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let cases = state.model.get_all::<Case>()?;
    let total = cases.len();
    Ok(Json(ApiResponse::with_total(cases, total)))
}

/// GET /api/cases/:id - One case
pub async fn get_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
) -> Result<impl IntoResponse, ApiError> {
    let case = state.model.get::<Case>(id)?;
    Ok(Json(ApiResponse::new(case)))
}

/// POST /api/cases - Create a case
pub async fn create_case(
    State(state): State<Arc<AppState>>,
    Json(case): Json<Case>,
) -> Result<impl IntoResponse, ApiError> {
    let id = run_blocking(&state, move |model| model.insert(case)).await?;
    Ok((StatusCode::CREATED, Json(CreatedCase { id })))
}

/// PUT /api/cases/:id - Replace a case
pub async fn update_case(
    State(state): State<Arc<AppState>>,
    Path(id): Path<u64>,
    Json(case): Json<Case>,
) -> Result<impl IntoResponse, ApiError> {
    run_blocking(&state, move |model| model.update(id, case)).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn run_blocking<T, F>(state: &AppState, op: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Model) -> StoreResult<T> + Send + 'static,
{
    let model = Arc::clone(&state.model);
    tokio::task::spawn_blocking(move || op(&model))
        .await
        .map_err(|e| ApiError::internal(format!("write task failed: {}", e)))?
        .map_err(ApiError::from)
}
