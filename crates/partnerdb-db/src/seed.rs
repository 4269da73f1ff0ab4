use partnerdb_core::PartnerRecord;
use sqlx::PgPool;

use crate::DbError;

/// Upsert partners from a seed file into the database.
///
/// Returns the number of partners processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_partners(pool: &PgPool, partners: &[PartnerRecord]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for partner in partners {
        sqlx::query(
            "INSERT INTO partners (id, trading_name, owner_name, document, address, coverage_area) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (id) DO UPDATE SET \
                 trading_name = EXCLUDED.trading_name, \
                 owner_name = EXCLUDED.owner_name, \
                 document = EXCLUDED.document, \
                 address = EXCLUDED.address, \
                 coverage_area = EXCLUDED.coverage_area, \
                 updated_at = NOW()",
        )
        .bind(&partner.id)
        .bind(&partner.trading_name)
        .bind(&partner.owner_name)
        .bind(&partner.document)
        .bind(&partner.address)
        .bind(&partner.coverage_area)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
