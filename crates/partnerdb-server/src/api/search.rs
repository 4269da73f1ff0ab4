//! Point lookup: which partner serves a coordinate.

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use partnerdb_core::{locate, parse_query, LocateError, LocateMode, Partner};
use partnerdb_db::PartnerRow;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{
    map_db_error, partners::PartnerItem, ApiError, ApiResponse, AppState, ErrorCode, ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SearchParams {
    pub long: Option<String>,
    pub lat: Option<String>,
    pub mode: Option<String>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct SearchResultItem {
    pub partner: PartnerItem,
    /// Four decimal places, kept as a string so clients see the exact rendering.
    pub distance_km: String,
    pub mode: LocateMode,
    pub scanned: usize,
    pub skipped: usize,
}

fn map_locate_error(req_id: &str, e: &LocateError) -> ApiError {
    let code = if e.is_missing() {
        ErrorCode::BadRequest
    } else {
        ErrorCode::ValidationError
    };
    ApiError::new(req_id, code, e.to_string())
}

fn resolve_mode(req_id: &str, raw: Option<&str>, default: LocateMode) -> Result<LocateMode, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(default),
        Some(raw) => raw
            .parse::<LocateMode>()
            .map_err(|e| map_locate_error(req_id, &e)),
    }
}

/// GET /api/v1/partners/search?long=&lat=&mode=
pub(in crate::api) async fn search_partner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<SearchResultItem>>, ApiError> {
    let rid = &req_id.0;
    let query = parse_query(params.long.as_deref(), params.lat.as_deref())
        .map_err(|e| map_locate_error(rid, &e))?;
    let mode = resolve_mode(rid, params.mode.as_deref(), state.default_mode)?;

    let rows = partnerdb_db::list_partners(&state.pool)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if rows.is_empty() {
        return Err(ApiError::new(rid, ErrorCode::NotFound, "no partners registered"));
    }

    let partners: Vec<Partner> = rows.iter().map(PartnerRow::to_partner).collect();
    let result = locate(query, &partners, mode);
    tracing::debug!(
        mode = %mode,
        scanned = result.scanned,
        skipped = result.skipped,
        "partner search complete"
    );

    let Some(best) = result.best else {
        return Err(ApiError::new(
            rid,
            ErrorCode::NotFound,
            "no partner found for this location",
        ));
    };

    let distance_km = best.distance_km_fixed();
    let Some(row) = rows.into_iter().find(|row| row.id == best.partner.id) else {
        return Err(ApiError::new(
            rid,
            ErrorCode::InternalError,
            "matched partner missing from snapshot",
        ));
    };

    Ok(Json(ApiResponse {
        data: SearchResultItem {
            partner: PartnerItem::from(row),
            distance_km,
            mode,
            scanned: result.scanned,
            skipped: result.skipped,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
