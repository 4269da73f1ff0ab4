//! `locate` command: run a lookup against the current store snapshot.

use partnerdb_core::{locate, Coordinate, LocateMode, MatchResult, Partner};
use partnerdb_db::PartnerRow;
use serde_json::json;

/// Load every partner, run the lookup, and print the outcome.
///
/// # Errors
///
/// Returns an error if the coordinate is out of range or the store cannot be
/// read.
pub(crate) async fn run_locate(
    pool: &sqlx::PgPool,
    long: f64,
    lat: f64,
    mode: LocateMode,
) -> anyhow::Result<()> {
    let query = Coordinate::new(long, lat)?;
    let rows = partnerdb_db::list_partners(pool).await?;
    if rows.is_empty() {
        println!("no partners registered");
        return Ok(());
    }

    let partners: Vec<Partner> = rows.iter().map(PartnerRow::to_partner).collect();
    let result = locate(query, &partners, mode);
    tracing::debug!(scanned = result.scanned, skipped = result.skipped, "locate complete");

    match render_result(&result) {
        Some(value) => println!("{}", serde_json::to_string_pretty(&value)?),
        None => println!(
            "no match ({mode}; scanned {}, skipped {})",
            result.scanned, result.skipped
        ),
    }
    Ok(())
}

pub(crate) fn render_result(result: &MatchResult<'_>) -> Option<serde_json::Value> {
    let best = result.best?;
    Some(json!({
        "id": best.partner.id,
        "trading_name": best.partner.trading_name,
        "distance_km": best.distance_km_fixed(),
        "mode": result.mode,
        "scanned": result.scanned,
        "skipped": result.skipped,
    }))
}
