use axum::{
    extract::{Path, State},
    Extension, Json,
};
use glowdrop_core::{Area, PostalZoneEntry};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{not_found, validation_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct PostalCodeItem {
    #[serde(flatten)]
    entry: PostalZoneEntry,
    area: Option<Area>,
}

/// GET /api/v1/areas: every configured area in configuration order.
pub(super) async fn list_areas(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<Area>>> {
    let catalog = state.catalog.snapshot();

    Json(ApiResponse {
        data: catalog.index().all_areas().to_vec(),
        meta: ResponseMeta::new(req_id.0),
    })
}

/// GET /api/v1/postal-codes/{code}
pub(super) async fn lookup_postal_code(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<PostalCodeItem>>, ApiError> {
    if !glowdrop_core::is_valid_postal_code(&code) {
        return Err(validation_error(
            req_id.0,
            format!("'{code}' is not a five-digit postal code"),
        ));
    }

    let catalog = state.catalog.snapshot();
    let Some(entry) = catalog.index().entry(&code) else {
        return Err(not_found(
            req_id.0,
            format!("postal code {code} is not in the service index"),
        ));
    };

    Ok(Json(ApiResponse {
        data: PostalCodeItem {
            entry: entry.clone(),
            area: catalog.index().area_of(&code).cloned(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
