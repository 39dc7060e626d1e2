// src/db/lookups.rs
//
// Small reference lookups behind location resolution and rent averaging.
// Table names arrive from configuration and pass the allow-list check
// before touching query text; every value is a bound parameter.

use rusqlite::{params, Connection, OptionalExtension};

use crate::db::safe_ident;
use crate::domain::SalesScope;
use crate::errors::StoreError;

fn checked(table: &str) -> Result<&str, StoreError> {
    if safe_ident(table) {
        Ok(table)
    } else {
        Err(StoreError::UnsafeIdentifier(table.to_string()))
    }
}

/// County for a zip from the dedicated mapping table.
pub fn county_for_zip(
    conn: &Connection,
    zip_county_table: &str,
    zip: &str,
) -> Result<Option<i64>, StoreError> {
    let table = checked(zip_county_table)?;
    let sql = format!("SELECT county_id FROM {table} WHERE zip = ? LIMIT 1");
    let found: Option<Option<i64>> = conn
        .query_row(&sql, params![zip], |row| row.get(0))
        .optional()
        .map_err(|e| StoreError::Query(format!("county lookup for zip {zip} failed: {e}")))?;
    Ok(found.flatten())
}

/// Fallback: any property row carrying this zip with a county set.
pub fn county_from_properties(
    conn: &Connection,
    properties_table: &str,
    zip: &str,
) -> Result<Option<i64>, StoreError> {
    let table = checked(properties_table)?;
    let sql =
        format!("SELECT county_id FROM {table} WHERE zip = ? AND county_id IS NOT NULL LIMIT 1");
    conn.query_row(&sql, params![zip], |row| row.get(0))
        .optional()
        .map_err(|e| StoreError::Query(format!("property county fallback for zip {zip} failed: {e}")))
}

/// Region for a county from the counties table.
pub fn region_for_county(
    conn: &Connection,
    counties_table: &str,
    county_id: i64,
) -> Result<Option<i64>, StoreError> {
    let table = checked(counties_table)?;
    let sql = format!("SELECT region_id FROM {table} WHERE id = ? LIMIT 1");
    let found: Option<Option<i64>> = conn
        .query_row(&sql, params![county_id], |row| row.get(0))
        .optional()
        .map_err(|e| {
            StoreError::Query(format!("region lookup for county {county_id} failed: {e}"))
        })?;
    Ok(found.flatten())
}

/// Fallback: any property row in this county with a region set.
pub fn region_from_properties(
    conn: &Connection,
    properties_table: &str,
    county_id: i64,
) -> Result<Option<i64>, StoreError> {
    let table = checked(properties_table)?;
    let sql = format!(
        "SELECT region_id FROM {table} WHERE county_id = ? AND region_id IS NOT NULL LIMIT 1"
    );
    conn.query_row(&sql, params![county_id], |row| row.get(0))
        .optional()
        .map_err(|e| {
            StoreError::Query(format!(
                "property region fallback for county {county_id} failed: {e}"
            ))
        })
}

/// Last-resort zip lookup by exact city/state match, case-insensitive.
pub fn zip_for_city_state(
    conn: &Connection,
    properties_table: &str,
    city: &str,
    state: &str,
) -> Result<Option<String>, StoreError> {
    let table = checked(properties_table)?;
    let sql = format!(
        "SELECT zip FROM {table} \
         WHERE LOWER(city) = LOWER(?) AND LOWER(state) = LOWER(?) AND zip IS NOT NULL LIMIT 1"
    );
    conn.query_row(&sql, params![city, state], |row| row.get(0))
        .optional()
        .map_err(|e| {
            StoreError::Query(format!("zip lookup for {city}, {state} failed: {e}"))
        })
}

/// Average rent at the narrowest tier that has any rows, zip first.
pub fn average_lot_rent(
    conn: &Connection,
    rent_table: &str,
    rent_column: &str,
    zip: Option<&str>,
    county_id: Option<i64>,
    region_id: Option<i64>,
) -> Result<Option<(SalesScope, f64)>, StoreError> {
    let table = checked(rent_table)?;
    let column = checked(rent_column)?;

    let mut tiers: Vec<(SalesScope, String, rusqlite::types::Value)> = Vec::new();
    if let Some(zip) = zip {
        tiers.push((SalesScope::Zip, "zip = ?".to_string(), zip.to_string().into()));
    }
    if let Some(county_id) = county_id {
        tiers.push((SalesScope::County, "county_id = ?".to_string(), county_id.into()));
    }
    if let Some(region_id) = region_id {
        tiers.push((SalesScope::Region, "region_id = ?".to_string(), region_id.into()));
    }

    for (scope, condition, param) in tiers {
        let sql = format!(
            "SELECT AVG({column}) FROM {table} WHERE {condition} AND {column} IS NOT NULL"
        );
        let avg: Option<f64> = conn
            .query_row(&sql, params![param], |row| row.get(0))
            .optional()
            .map_err(|e| StoreError::Query(format!("rent average ({scope}) failed: {e}")))?
            .flatten();
        if let Some(avg) = avg {
            return Ok(Some((scope, avg)));
        }
    }
    Ok(None)
}
