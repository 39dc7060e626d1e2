// src/comps/sales.rs
//
// Sold-transaction comps by tiered fallback. Scopes are tried narrowest
// first (zip, county, region); attribute filters are relaxed before the
// geography widens further, because thin markets often have zero rows
// matching exact beds/baths/year at any tier.

use log::{debug, warn};
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};

use crate::config::SalesConfig;
use crate::db::row::StoreRow;
use crate::db::safe_ident;
use crate::domain::{ExtractedAttributes, GeographicIdentity, SalesScope};
use crate::errors::StoreError;

/// Outcome of one tiered search. `scope` is set iff rows were found;
/// `relaxed` marks rows found only after dropping attribute filters.
#[derive(Debug, Clone, Default)]
pub struct SalesComps {
    pub rows: Vec<StoreRow>,
    pub scope: Option<SalesScope>,
    pub relaxed: bool,
}

pub struct SalesCompMatcher {
    cfg: SalesConfig,
}

impl SalesCompMatcher {
    pub fn new(cfg: SalesConfig) -> Self {
        Self { cfg }
    }

    /// Two-pass search over the present tiers. A tier whose query fails
    /// is logged and skipped; only an empty result across both passes
    /// yields an empty `SalesComps`.
    pub fn find_sales_comps(
        &self,
        conn: &Connection,
        identity: &GeographicIdentity,
        attrs: &ExtractedAttributes,
    ) -> SalesComps {
        if !safe_ident(&self.cfg.sales_table) || !safe_ident(&self.cfg.properties_table) {
            warn!(
                "sales comps disabled: unsafe table name ({} / {})",
                self.cfg.sales_table, self.cfg.properties_table
            );
            return SalesComps::default();
        }

        let tiers = self.tiers(identity);
        if tiers.is_empty() {
            debug!("sales comps: no zip/county/region resolved, nothing to query");
            return SalesComps::default();
        }

        let (strict_where, strict_params) = self.attribute_filters(attrs);

        for relaxed in [false, true] {
            if relaxed && strict_where.is_empty() {
                // Pass 1 already ran unfiltered; repeating it gains nothing.
                break;
            }
            let (where_extra, extra_params): (&str, &[Value]) = if relaxed {
                ("", &[])
            } else {
                (strict_where.as_str(), strict_params.as_slice())
            };

            for (scope, condition, param) in &tiers {
                match self.query_tier(conn, condition, param, where_extra, extra_params) {
                    Ok(rows) if !rows.is_empty() => {
                        debug!("sales comps: {} rows at {scope} (relaxed={relaxed})", rows.len());
                        return SalesComps {
                            rows,
                            scope: Some(*scope),
                            relaxed,
                        };
                    }
                    Ok(_) => {}
                    Err(e) => warn!("sales comps {scope} tier skipped: {e}"),
                }
            }
        }

        SalesComps::default()
    }

    fn tiers(&self, identity: &GeographicIdentity) -> Vec<(SalesScope, String, Value)> {
        let mut tiers = Vec::new();
        if let Some(zip) = &identity.zip {
            tiers.push((SalesScope::Zip, "p.zip = ?".to_string(), zip.clone().into()));
        }
        if let Some(county_id) = identity.county_id {
            tiers.push((SalesScope::County, "p.county_id = ?".to_string(), county_id.into()));
        }
        if let Some(region_id) = identity.region_id {
            tiers.push((SalesScope::Region, "p.region_id = ?".to_string(), region_id.into()));
        }
        tiers
    }

    /// Equality filters for each attribute that was actually extracted,
    /// with year-built widened to the configured window.
    fn attribute_filters(&self, attrs: &ExtractedAttributes) -> (String, Vec<Value>) {
        let mut conditions: Vec<&str> = Vec::new();
        let mut params: Vec<Value> = Vec::new();

        if let Some(beds) = attrs.beds {
            conditions.push("p.beds = ?");
            params.push(beds.into());
        }
        if let Some(baths) = attrs.baths {
            conditions.push("p.baths = ?");
            params.push(baths.into());
        }
        if let Some(year_built) = attrs.year_built {
            if self.cfg.year_tolerance >= 0 {
                conditions.push("p.year_built BETWEEN ? AND ?");
                params.push((year_built - self.cfg.year_tolerance).into());
                params.push((year_built + self.cfg.year_tolerance).into());
            }
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!(" AND {}", conditions.join(" AND "))
        };
        (clause, params)
    }

    fn query_tier(
        &self,
        conn: &Connection,
        scope_condition: &str,
        scope_param: &Value,
        where_extra: &str,
        extra_params: &[Value],
    ) -> Result<Vec<StoreRow>, StoreError> {
        let sql = format!(
            "SELECT s.sale_price, s.sale_date, p.beds, p.baths, p.square_feet, p.year_built, \
                    p.city, p.state, p.zip \
             FROM {sales} s JOIN {props} p ON s.property_id = p.id \
             WHERE {scope_condition}{where_extra} \
             ORDER BY s.sale_date DESC LIMIT ?",
            sales = self.cfg.sales_table,
            props = self.cfg.properties_table,
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| StoreError::Query(format!("prepare sales comps failed: {e}")))?;
        let columns: Vec<String> = stmt.column_names().iter().map(|c| c.to_string()).collect();

        let mut sql_params: Vec<Value> = Vec::with_capacity(extra_params.len() + 2);
        sql_params.push(scope_param.clone());
        sql_params.extend(extra_params.iter().cloned());
        sql_params.push((self.cfg.max_rows as i64).into());

        let mapped = stmt
            .query_map(params_from_iter(sql_params), |row| {
                StoreRow::from_row(row, &columns)
            })
            .map_err(|e| StoreError::Query(format!("sales comps query failed: {e}")))?;

        let mut rows = Vec::new();
        for row in mapped {
            rows.push(row.map_err(|e| StoreError::Query(format!("sales comps row failed: {e}")))?);
        }
        Ok(rows)
    }
}
