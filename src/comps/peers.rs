// src/comps/peers.rs
//
// Similar-listing lookup against the stored listings table: title
// substring match on the first 30 chars, optionally price-bounded to
// 1.5x the listing's own price.

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::config::PeerConfig;
use crate::db::row::StoreRow;
use crate::db::safe_ident;
use crate::domain::Listing;
use crate::errors::StoreError;
use crate::extract;

/// Matched rows plus the column name their prices live in, so the
/// composer can average them without re-reading configuration.
#[derive(Debug, Clone, Default)]
pub struct PeerComps {
    pub rows: Vec<StoreRow>,
    pub price_column: Option<String>,
}

pub struct PeerMatcher {
    cfg: PeerConfig,
}

impl PeerMatcher {
    pub fn new(cfg: PeerConfig) -> Self {
        Self { cfg }
    }

    pub fn find_similar_listings(
        &self,
        conn: &Connection,
        listing: &Listing,
    ) -> Result<PeerComps, StoreError> {
        if !safe_ident(&self.cfg.table) || !safe_ident(&self.cfg.title_column) {
            return Err(StoreError::UnsafeIdentifier(format!(
                "{} / {}",
                self.cfg.table, self.cfg.title_column
            )));
        }
        if let Some(price_column) = &self.cfg.price_column {
            if !safe_ident(price_column) {
                return Err(StoreError::UnsafeIdentifier(price_column.clone()));
            }
        }

        let title_prefix: String = listing.title.chars().take(30).collect();
        let title_like = format!("%{title_prefix}%");
        let price = extract::extract_price(&listing.price);

        let (sql, params): (String, Vec<Value>) = match (&self.cfg.price_column, price) {
            (Some(price_column), Some(price)) => (
                format!(
                    "SELECT * FROM {table} WHERE {title_column} LIKE ? AND {price_column} <= ? \
                     ORDER BY {price_column} DESC LIMIT ?",
                    table = self.cfg.table,
                    title_column = self.cfg.title_column,
                ),
                vec![
                    title_like.into(),
                    (price * 1.5).into(),
                    (self.cfg.max_rows as i64).into(),
                ],
            ),
            _ => (
                format!(
                    "SELECT * FROM {table} WHERE {title_column} LIKE ? LIMIT ?",
                    table = self.cfg.table,
                    title_column = self.cfg.title_column,
                ),
                vec![title_like.into(), (self.cfg.max_rows as i64).into()],
            ),
        };

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query(format!("prepare peer lookup failed: {e}")))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mapped = stmt
            .query_map(params_from_iter(params), |row| {
                StoreRow::from_row(row, &columns)
            })
            .map_err(|e| StoreError::Query(format!("peer lookup failed: {e}")))?;

        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row.map_err(|e| StoreError::Query(format!("peer row failed: {e}")))?);
        }

        Ok(PeerComps {
            rows,
            price_column: self.cfg.price_column.clone(),
        })
    }
}
