//! Partner CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use partnerdb_core::PartnerRecord;
use partnerdb_db::{DbError, PartnerRow};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ErrorCode, ResponseMeta};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct PartnerItem {
    pub id: String,
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    pub address: Option<serde_json::Value>,
    pub coverage_area: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PartnerRow> for PartnerItem {
    fn from(row: PartnerRow) -> Self {
        Self {
            id: row.id,
            trading_name: row.trading_name,
            owner_name: row.owner_name,
            document: row.document,
            address: row.address,
            coverage_area: row.coverage_area,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct CreatePartnerRequest {
    pub id: String,
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
    #[serde(default)]
    pub coverage_area: Option<serde_json::Value>,
}

/// Full replacement; the id comes from the path.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(in crate::api) struct UpdatePartnerRequest {
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
    #[serde(default)]
    pub coverage_area: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct DeletedResponse {
    pub deleted: bool,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn into_record(id: String, body: UpdatePartnerRequest) -> PartnerRecord {
    PartnerRecord {
        id,
        trading_name: body.trading_name.trim().to_owned(),
        owner_name: body.owner_name.trim().to_owned(),
        document: body.document.trim().to_owned(),
        address: body.address,
        coverage_area: body.coverage_area,
    }
}

fn validate_record(req_id: &str, record: &PartnerRecord) -> Result<(), ApiError> {
    record
        .validate()
        .map_err(|e| ApiError::new(req_id, ErrorCode::ValidationError, e.to_string()))
}

fn map_write_error(req_id: &str, e: &DbError) -> ApiError {
    if matches!(e, DbError::NotFound) {
        return ApiError::new(req_id, ErrorCode::NotFound, "partner not found");
    }
    match e.unique_violation().as_deref() {
        Some("partners_pkey") => {
            ApiError::new(
                req_id,
                ErrorCode::Conflict,
                "a partner with that id already exists",
            )
        }
        Some(_) => ApiError::new(
            req_id,
            ErrorCode::Conflict,
            "a partner with that document already exists",
        ),
        None => map_db_error(req_id.to_owned(), e),
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/partners
pub(in crate::api) async fn create_partner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreatePartnerRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PartnerItem>>), ApiError> {
    let rid = &req_id.0;
    let record = into_record(
        body.id.trim().to_owned(),
        UpdatePartnerRequest {
            trading_name: body.trading_name,
            owner_name: body.owner_name,
            document: body.document,
            address: body.address,
            coverage_area: body.coverage_area,
        },
    );
    validate_record(rid, &record)?;

    let row = partnerdb_db::create_partner(&state.pool, &record)
        .await
        .map_err(|e| map_write_error(rid, &e))?;
    tracing::info!(partner_id = %row.id, "partner created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PartnerItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/partners
pub(in crate::api) async fn list_partners(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<PartnerItem>>>, ApiError> {
    let rows = partnerdb_db::list_partners(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(PartnerItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// GET /api/v1/partners/{id}
pub(in crate::api) async fn get_partner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<PartnerItem>>, ApiError> {
    let row = partnerdb_db::get_partner(&state.pool, &id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::new(&req_id.0, ErrorCode::NotFound, "partner not found"))?;

    Ok(Json(ApiResponse {
        data: PartnerItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// PUT /api/v1/partners/{id}
pub(in crate::api) async fn update_partner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<UpdatePartnerRequest>,
) -> Result<Json<ApiResponse<PartnerItem>>, ApiError> {
    let rid = &req_id.0;
    let record = into_record(id, body);
    validate_record(rid, &record)?;

    let row = partnerdb_db::update_partner(&state.pool, &record.id, &record)
        .await
        .map_err(|e| map_write_error(rid, &e))?;
    tracing::info!(partner_id = %row.id, "partner updated");

    Ok(Json(ApiResponse {
        data: PartnerItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// DELETE /api/v1/partners/{id}
pub(in crate::api) async fn delete_partner(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    let rid = &req_id.0;
    partnerdb_db::delete_partner(&state.pool, &id)
        .await
        .map_err(|e| map_write_error(rid, &e))?;
    tracing::info!(partner_id = %id, "partner deleted");

    Ok(Json(ApiResponse {
        data: DeletedResponse { deleted: true },
        meta: ResponseMeta::new(req_id.0),
    }))
}
