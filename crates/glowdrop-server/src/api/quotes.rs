use axum::{extract::State, Extension, Json};
use glowdrop_core::{quote, CartLine, FeeQuote};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{not_found, validation_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateQuoteRequest {
    pub vendor_id: String,
    /// Customer postal code used to measure delivery distance. Without it the
    /// runner fee carries no per-mile component.
    pub postal_code: Option<String>,
    #[serde(default)]
    pub cart_lines: Vec<CartLine>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuoteItem {
    vendor_id: String,
    distance_miles: Option<f64>,
    #[serde(flatten)]
    fees: FeeQuote,
}

/// POST /api/v1/quotes: authorization hold for a cart at one vendor.
pub(super) async fn create_quote(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateQuoteRequest>,
) -> Result<Json<ApiResponse<QuoteItem>>, ApiError> {
    let rid = &req_id.0;

    let postal_code = body
        .postal_code
        .as_deref()
        .map(str::trim)
        .filter(|code| !code.is_empty());
    if let Some(code) = postal_code {
        if !glowdrop_core::is_valid_postal_code(code) {
            return Err(validation_error(
                rid.clone(),
                format!("postal_code '{code}' is not a five-digit postal code"),
            ));
        }
    }

    let catalog = state.catalog.snapshot();
    let vendor = catalog.vendor(&body.vendor_id).ok_or_else(|| {
        not_found(rid.clone(), format!("vendor {} not found", body.vendor_id))
    })?;

    let target = catalog.quote_target(vendor, postal_code, state.catalog.settings());
    let fees = quote(&body.cart_lines, &target, &state.fees)
        .map_err(|e| validation_error(rid.clone(), e.to_string()))?;

    tracing::debug!(
        vendor_id = %body.vendor_id,
        lines = body.cart_lines.len(),
        hold = %fees.authorization_hold_total,
        "quote computed"
    );

    Ok(Json(ApiResponse {
        data: QuoteItem {
            vendor_id: body.vendor_id,
            distance_miles: target.distance_miles,
            fees: fees.rounded(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
