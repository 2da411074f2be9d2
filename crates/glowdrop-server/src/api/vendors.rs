use std::str::FromStr;

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use glowdrop_core::{display_price_range, DiscoveryOutcome, DiscoveryQuery, PriceRange};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{not_found, validation_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct DiscoverQuery {
    pub postal_code: String,
    /// Kept as text so a malformed value gets a validation error instead of
    /// the extractor's plain-text rejection.
    pub radius_miles: Option<String>,
    pub include_chains: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct DisplayPriceQuery {
    pub min: String,
    pub max: String,
}

#[derive(Debug, Serialize)]
pub(super) struct DisplayPriceItem {
    vendor_id: String,
    #[serde(flatten)]
    range: PriceRange,
}

/// GET /api/v1/vendors/discover: ranked vendors around a customer postal code.
pub(super) async fn discover_vendors(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DiscoverQuery>,
) -> Result<Json<ApiResponse<DiscoveryOutcome>>, ApiError> {
    let postal_code = query.postal_code.trim();
    if !glowdrop_core::is_valid_postal_code(postal_code) {
        return Err(validation_error(
            req_id.0,
            format!("postal_code '{postal_code}' is not a five-digit postal code"),
        ));
    }
    let radius = parse_radius(query.radius_miles.as_deref(), &state.allowed_radii)
        .map_err(|message| validation_error(req_id.0.clone(), message))?;

    let discovery = DiscoveryQuery::new(postal_code, f64::from(radius))
        .with_chains(query.include_chains.unwrap_or(false));
    let outcome = state.catalog.discover(&discovery);

    Ok(Json(ApiResponse {
        data: DiscoveryOutcome::clone(&outcome),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/vendors/{vendor_id}/display-price?min=..&max=..
pub(super) async fn display_price(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(vendor_id): Path<String>,
    Query(query): Query<DisplayPriceQuery>,
) -> Result<Json<ApiResponse<DisplayPriceItem>>, ApiError> {
    let rid = &req_id.0;
    let range = PriceRange {
        min: parse_amount(rid, "min", &query.min)?,
        max: parse_amount(rid, "max", &query.max)?,
    };

    let catalog = state.catalog.snapshot();
    let vendor = catalog
        .vendor(&vendor_id)
        .ok_or_else(|| not_found(rid.clone(), format!("vendor {vendor_id} not found")))?;

    let adjusted = display_price_range(
        range,
        vendor.pricing_tier,
        vendor.velocity_minutes,
        &state.fees,
    )
    .map_err(|e| validation_error(rid.clone(), e.to_string()))?;

    Ok(Json(ApiResponse {
        data: DisplayPriceItem {
            vendor_id,
            range: adjusted.rounded(),
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// Radius in whole miles. Integral decimals such as `5.0` are accepted.
fn parse_radius(raw: Option<&str>, allowed: &[u32]) -> Result<u32, String> {
    let allowed_list = allowed
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    let raw = raw
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| format!("radius_miles is required; choose one of {allowed_list}"))?;
    let radius = Decimal::from_str(raw)
        .ok()
        .filter(|value| value.fract().is_zero())
        .and_then(|value| value.to_u32())
        .ok_or_else(|| {
            format!("radius_miles '{raw}' must be a whole number of miles: {allowed_list}")
        })?;
    if allowed.contains(&radius) {
        Ok(radius)
    } else {
        let message = format!("radius_miles {radius} must be one of {allowed_list}");
        Err(message)
    }
}

fn parse_amount(request_id: &str, field: &str, raw: &str) -> Result<Decimal, ApiError> {
    Decimal::from_str(raw.trim()).map_err(|_| {
        validation_error(
            request_id.to_owned(),
            format!("{field} must be a decimal amount, got '{raw}'"),
        )
    })
}
