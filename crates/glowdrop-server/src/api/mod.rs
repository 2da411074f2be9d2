mod areas;
mod imports;
mod quotes;
mod vendors;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use glowdrop_core::{CatalogStore, FeeSchedule};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{guard_admin, tag_request, AdminTokens, RequestId, REQUEST_ID_HEADER};

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<CatalogStore>,
    pub fees: Arc<FeeSchedule>,
    /// Search radii accepted by discovery, in miles.
    pub allowed_radii: Arc<Vec<u32>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    postal_codes: usize,
    areas: usize,
    vendors: usize,
    catalog_generation: u64,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn validation_error(request_id: String, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "validation_error", message)
}

pub(super) fn not_found(request_id: String, message: impl Into<String>) -> ApiError {
    ApiError::new(request_id, "not_found", message)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
}

fn public_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/areas", get(areas::list_areas))
        .route(
            "/api/v1/postal-codes/{code}",
            get(areas::lookup_postal_code),
        )
        .route("/api/v1/vendors/discover", get(vendors::discover_vendors))
        .route(
            "/api/v1/vendors/{vendor_id}/display-price",
            get(vendors::display_price),
        )
        .route("/api/v1/quotes", post(quotes::create_quote))
}

/// Catalog imports replace live reference data, so they sit behind the admin
/// token guard.
fn admin_router(admin: AdminTokens) -> Router<AppState> {
    Router::new()
        .route("/api/v1/admin/areas/import", post(imports::import_areas))
        .route(
            "/api/v1/admin/vendors/import",
            post(imports::import_vendors),
        )
        .layer(axum::middleware::from_fn_with_state(admin, guard_admin))
}

pub fn build_app(state: AppState, admin: AdminTokens) -> Router {
    Router::new()
        .merge(public_router())
        .merge(admin_router(admin))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(tag_request)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let catalog = state.catalog.snapshot();
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            postal_codes: catalog.index().postal_code_count(),
            areas: catalog.index().all_areas().len(),
            vendors: catalog.vendors().len(),
            catalog_generation: catalog.generation(),
        },
        meta: ResponseMeta::new(req_id.0),
    })
}
