//! Database operations for the `partners` table.
//!
//! Geometry columns are stored as opaque JSONB. Typing happens on the way out
//! through [`PartnerRow::to_partner`].

use chrono::{DateTime, Utc};
use partnerdb_core::{Partner, PartnerRecord};
use sqlx::PgPool;

use crate::DbError;

const PARTNER_COLUMNS: &str = "id, trading_name, owner_name, document, address, coverage_area, \
                               created_at, updated_at";

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `partners` table.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PartnerRow {
    pub id: String,
    pub trading_name: String,
    pub owner_name: String,
    pub document: String,
    pub address: Option<serde_json::Value>,
    pub coverage_area: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PartnerRow {
    #[must_use]
    pub fn to_record(&self) -> PartnerRecord {
        PartnerRecord {
            id: self.id.clone(),
            trading_name: self.trading_name.clone(),
            owner_name: self.owner_name.clone(),
            document: self.document.clone(),
            address: self.address.clone(),
            coverage_area: self.coverage_area.clone(),
        }
    }

    /// Decode stored geometry into a typed [`Partner`]. Malformed geometry is
    /// carried on the result, not returned as an error.
    #[must_use]
    pub fn to_partner(&self) -> Partner {
        self.to_record().decode()
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Returns every partner, ordered by id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_partners(pool: &PgPool) -> Result<Vec<PartnerRow>, DbError> {
    let rows = sqlx::query_as::<_, PartnerRow>(&format!(
        "SELECT {PARTNER_COLUMNS} FROM partners ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Returns a single partner by id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_partner(pool: &PgPool, id: &str) -> Result<Option<PartnerRow>, DbError> {
    let row = sqlx::query_as::<_, PartnerRow>(&format!(
        "SELECT {PARTNER_COLUMNS} FROM partners WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Inserts a new partner and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including unique violations
/// on `id` or `document`.
pub async fn create_partner(pool: &PgPool, partner: &PartnerRecord) -> Result<PartnerRow, DbError> {
    let row = sqlx::query_as::<_, PartnerRow>(&format!(
        "INSERT INTO partners (id, trading_name, owner_name, document, address, coverage_area) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {PARTNER_COLUMNS}"
    ))
    .bind(&partner.id)
    .bind(&partner.trading_name)
    .bind(&partner.owner_name)
    .bind(&partner.document)
    .bind(&partner.address)
    .bind(&partner.coverage_area)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces every mutable field of the partner with `id`.
///
/// `partner.id` is ignored; the row is addressed by `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no partner has `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_partner(
    pool: &PgPool,
    id: &str,
    partner: &PartnerRecord,
) -> Result<PartnerRow, DbError> {
    sqlx::query_as::<_, PartnerRow>(&format!(
        "UPDATE partners \
         SET trading_name  = $2, \
             owner_name    = $3, \
             document      = $4, \
             address       = $5, \
             coverage_area = $6, \
             updated_at    = NOW() \
         WHERE id = $1 \
         RETURNING {PARTNER_COLUMNS}"
    ))
    .bind(id)
    .bind(&partner.trading_name)
    .bind(&partner.owner_name)
    .bind(&partner.document)
    .bind(&partner.address)
    .bind(&partner.coverage_area)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// Deletes the partner with `id`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] when no partner has `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_partner(pool: &PgPool, id: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM partners WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
