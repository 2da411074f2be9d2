use axum::{extract::State, Extension, Json};
use glowdrop_core::ImportError;
use serde::Serialize;

use crate::middleware::RequestId;

use super::{validation_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ImportSummary {
    count: usize,
    catalog_generation: u64,
}

/// POST /api/v1/admin/areas/import: body is one
/// `id,city,displayName,kind,code|code|...` record per line.
pub(super) async fn import_areas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let count = state
        .catalog
        .import_areas(&body)
        .map_err(|e| map_import_error(req_id.0.clone(), &e))?;
    Ok(summary(&state, count, req_id))
}

/// POST /api/v1/admin/vendors/import: body is newline-delimited vendor JSON.
pub(super) async fn import_vendors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: String,
) -> Result<Json<ApiResponse<ImportSummary>>, ApiError> {
    let count = state
        .catalog
        .import_vendors(&body)
        .map_err(|e| map_import_error(req_id.0.clone(), &e))?;
    Ok(summary(&state, count, req_id))
}

fn summary(state: &AppState, count: usize, req_id: RequestId) -> Json<ApiResponse<ImportSummary>> {
    Json(ApiResponse {
        data: ImportSummary {
            count,
            catalog_generation: state.catalog.snapshot().generation(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

fn map_import_error(request_id: String, error: &ImportError) -> ApiError {
    validation_error(request_id, error.to_string())
}
