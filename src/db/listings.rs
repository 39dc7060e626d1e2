// src/db/listings.rs
//
// Insert-or-update of evaluated listings, keyed by external id. The table
// written here is the same one the peer matcher reads, so persisted rows
// feed later comparisons.

use chrono::Utc;
use log::warn;
use rusqlite::{params, Connection};

use crate::db::safe_ident;
use crate::domain::Listing;
use crate::errors::StoreError;

/// Fields re-derived from listing text before persisting, so stored rows
/// are queryable by the same lookups that power comparisons.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DerivedListing {
    pub asking_price: Option<f64>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub county_id: Option<i64>,
    pub region_id: Option<i64>,
}

/// Char-clamped text, empty mapped to None so the store holds NULL
/// instead of empty strings.
fn clamped(text: &str, max_chars: usize) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(max_chars).collect())
}

/// Upsert one listing. On conflict every derived field is overwritten but
/// the external id and first-seen timestamp are left alone. If the full
/// column set fails (older schema without attribute columns), retries
/// once with a reduced set before giving up.
pub fn upsert_listing(
    conn: &mut Connection,
    table: &str,
    listing: &Listing,
    derived: &DerivedListing,
) -> Result<(), StoreError> {
    if !safe_ident(table) {
        return Err(StoreError::UnsafeIdentifier(table.to_string()));
    }

    match try_upsert(conn, table, listing, derived, true) {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!("full-column upsert of {} failed ({first}); retrying with core columns", listing.id);
            try_upsert(conn, table, listing, derived, false)
        }
    }
}

fn try_upsert(
    conn: &mut Connection,
    table: &str,
    listing: &Listing,
    derived: &DerivedListing,
    full_columns: bool,
) -> Result<(), StoreError> {
    let now = Utc::now().naive_utc();

    let title = clamped(&listing.title, 500);
    let description = clamped(&listing.description, 10_000);
    let city = derived.city.as_deref().and_then(|c| clamped(c, 200));
    let state = derived.state.as_deref().and_then(|s| clamped(s, 10));
    let zip = derived.zip.as_deref().and_then(|z| clamped(z, 10));
    let url = clamped(&listing.post_url, 2_000);

    let tx = conn
        .transaction()
        .map_err(|e| StoreError::Query(format!("begin upsert failed: {e}")))?;

    if full_columns {
        let sql = format!(
            r#"
            INSERT INTO {table} (
                external_id, title, description, asking_price,
                city, state, zip, url,
                beds, baths, county_id, region_id,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                asking_price = excluded.asking_price,
                city = excluded.city,
                state = excluded.state,
                zip = excluded.zip,
                url = excluded.url,
                beds = excluded.beds,
                baths = excluded.baths,
                county_id = excluded.county_id,
                region_id = excluded.region_id,
                updated_at = excluded.updated_at
            "#
        );
        tx.execute(
            &sql,
            params![
                listing.id,
                title,
                description,
                derived.asking_price,
                city,
                state,
                zip,
                url,
                derived.beds,
                derived.baths,
                derived.county_id,
                derived.region_id,
                now,
                now,
            ],
        )
        .map_err(|e| StoreError::Query(format!("upsert {} failed: {e}", listing.id)))?;
    } else {
        let sql = format!(
            r#"
            INSERT INTO {table} (
                external_id, title, description, asking_price,
                city, state, zip, url,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(external_id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                asking_price = excluded.asking_price,
                city = excluded.city,
                state = excluded.state,
                zip = excluded.zip,
                url = excluded.url,
                updated_at = excluded.updated_at
            "#
        );
        tx.execute(
            &sql,
            params![
                listing.id,
                title,
                description,
                derived.asking_price,
                city,
                state,
                zip,
                url,
                now,
                now,
            ],
        )
        .map_err(|e| StoreError::Query(format!("reduced upsert {} failed: {e}", listing.id)))?;
    }

    tx.commit()
        .map_err(|e| StoreError::Query(format!("commit upsert failed: {e}")))
}

/// Append one observed price to the history table. Independent of the
/// main upsert; callers treat failure here as non-fatal.
pub fn append_price_history(
    conn: &Connection,
    table: &str,
    external_id: &str,
    price: f64,
) -> Result<(), StoreError> {
    if !safe_ident(table) {
        return Err(StoreError::UnsafeIdentifier(table.to_string()));
    }
    let now = Utc::now().naive_utc();
    let sql = format!(
        "INSERT INTO {table} (external_id, price, observed_at) VALUES (?1, ?2, ?3)"
    );
    conn.execute(&sql, params![external_id, price, now])
        .map_err(|e| StoreError::Query(format!("history append for {external_id} failed: {e}")))?;
    Ok(())
}
