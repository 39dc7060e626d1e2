// src/engine.rs
//
// Orchestration for one listing at a time: resolve identity, gather
// comps, compose context, optionally persist. Failures never escape a
// public method; every operation returns a sentinel (None / false) so
// the caller's pipeline keeps moving without comparison context.

use std::sync::Arc;

use log::{info, warn};
use rusqlite::Connection;

use crate::comps::{compose, lot_rent_line, PeerComps, PeerMatcher, SalesCompMatcher, SalesComps};
use crate::config::{
    EngineConfig, OutputFormat, PeerConfig, PersistConfig, RentConfig, SalesConfig,
};
use crate::db::connection::Database;
use crate::db::listings::{self, DerivedListing};
use crate::db::{lookups, safe_ident};
use crate::domain::{ComparisonResult, GeographicIdentity, Listing};
use crate::extract;
use crate::geo::{Geocode, GeocodeCache, Geocoder, JsonFileBackend, LocationResolver};

pub struct CompareEngine {
    db: Database,
    resolver: LocationResolver,
    sales: Option<SalesCompMatcher>,
    peers: Option<PeerMatcher>,
    rent: Option<RentConfig>,
    persist: Option<PersistConfig>,
    output_format: OutputFormat,
}

impl CompareEngine {
    /// Builds the engine, dropping any feature whose configuration fails
    /// the identifier allow-list rather than ever running unsafe text.
    pub fn new(cfg: EngineConfig) -> Self {
        let db = Database::from_config(&cfg.store);

        if !safe_ident(&cfg.geo.zip_county_table) || !safe_ident(&cfg.geo.counties_table) {
            warn!(
                "geo mapping tables have unsafe names ({} / {}); county and region lookups will be skipped",
                cfg.geo.zip_county_table, cfg.geo.counties_table
            );
        }

        let sales = checked_sales(cfg.sales);
        let peers = checked_peers(cfg.peers);
        let rent = checked_rent(cfg.rent);
        let persist = checked_persist(cfg.persist);

        let mut resolver = LocationResolver::new(cfg.geo);
        if let Some(sales_cfg) = &sales {
            resolver = resolver.with_properties_table(sales_cfg.properties_table.clone());
        }
        if cfg.geocode.enabled {
            let cache = match &cfg.geocode.cache_file {
                Some(path) => {
                    GeocodeCache::with_backend(Box::new(JsonFileBackend::new(path.clone())))
                }
                None => GeocodeCache::new(),
            };
            match Geocoder::from_config(&cfg.geocode, Arc::new(cache)) {
                Ok(geocoder) => resolver = resolver.with_geocoder(Arc::new(geocoder)),
                Err(e) => warn!("geocoding disabled: {e}"),
            }
        }

        Self {
            db,
            resolver,
            sales: sales.map(SalesCompMatcher::new),
            peers: peers.map(PeerMatcher::new),
            rent,
            persist,
            output_format: cfg.output_format,
        }
    }

    /// Swap the geocoding capability, replacing whatever configuration
    /// installed. Intended for callers providing their own provider.
    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocode>) -> Self {
        self.resolver = self.resolver.with_geocoder(geocoder);
        self
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    /// Geographic identity for one listing; empty on store failure.
    pub fn resolve_identity(&self, listing: &Listing) -> GeographicIdentity {
        self.db
            .with_conn(|conn| Ok(self.resolver.resolve(conn, listing)))
            .unwrap_or_default()
    }

    /// Gathers every configured comparison source for a listing. None
    /// means no source is configured, no source produced anything, or
    /// the store was unreachable.
    pub fn fetch_comparison(&self, listing: &Listing) -> Option<ComparisonResult> {
        if self.sales.is_none() && self.peers.is_none() && self.rent.is_none() {
            return None;
        }
        info!("fetching comparison for listing {} ({:.50})", listing.id, listing.title);

        let outcome = self.db.with_conn(|conn| {
            let attrs = extract::extract_attributes(listing);
            let identity = if self.sales.is_some() || self.rent.is_some() {
                self.resolver.resolve(conn, listing)
            } else {
                GeographicIdentity::default()
            };

            let sales: Option<SalesComps> = self
                .sales
                .as_ref()
                .map(|matcher| matcher.find_sales_comps(conn, &identity, &attrs));

            let peers: Option<PeerComps> = match &self.peers {
                Some(matcher) => match matcher.find_similar_listings(conn, listing) {
                    Ok(found) => Some(found),
                    Err(e) => {
                        warn!("peer lookup for {} skipped: {e}", listing.id);
                        None
                    }
                },
                None => None,
            };

            let rent_line = self.rent.as_ref().and_then(|rent_cfg| {
                if attrs.rent_mentioned {
                    return None;
                }
                match lookups::average_lot_rent(
                    conn,
                    &rent_cfg.table,
                    &rent_cfg.rent_column,
                    identity.zip.as_deref(),
                    identity.county_id,
                    identity.region_id,
                ) {
                    Ok(Some((scope, average))) => Some(lot_rent_line(scope, average)),
                    Ok(None) => None,
                    Err(e) => {
                        warn!("lot rent lookup skipped: {e}");
                        None
                    }
                }
            });

            Ok(compose(listing, sales.as_ref(), peers.as_ref(), rent_line))
        });

        match outcome {
            Ok(result) if result.is_empty() => None,
            Ok(result) => {
                info!("comparison done for listing {}", listing.id);
                Some(result)
            }
            Err(e) => {
                warn!("comparison unavailable for {}: {e}", listing.id);
                None
            }
        }
    }

    /// Insert-or-update this listing in the configured listings table,
    /// re-deriving price, location and attributes first.
    pub fn upsert_listing(&self, listing: &Listing) -> bool {
        let Some(persist) = &self.persist else {
            return false;
        };
        let table = persist.listings_table.clone();

        let result = self.db.with_conn(|conn| {
            let derived = self.derive(conn, listing);
            listings::upsert_listing(conn, &table, listing, &derived)
        });

        match result {
            Ok(()) => {
                info!("upserted listing {} into {table}", listing.id);
                true
            }
            Err(e) => {
                warn!("upsert of {} failed: {e}", listing.id);
                false
            }
        }
    }

    /// Persistence gate for the evaluation loop: stores the listing when
    /// the configured policy says this verdict should be kept.
    pub fn record_evaluated(&self, listing: &Listing, accepted: bool) -> bool {
        let Some(persist) = &self.persist else {
            return false;
        };
        if persist.insert_all_evaluated || (accepted && persist.insert_accepted) {
            self.upsert_listing(listing)
        } else {
            false
        }
    }

    /// Best-effort price observation, independent of the main upsert.
    pub fn append_price_history(&self, listing: &Listing, price: f64) -> bool {
        let Some(persist) = &self.persist else {
            return false;
        };
        let Some(history_table) = persist.history_table.clone() else {
            return false;
        };

        let result = self.db.with_conn(|conn| {
            listings::append_price_history(conn, &history_table, &listing.id, price)
        });

        match result {
            Ok(()) => true,
            Err(e) => {
                warn!("price history append for {} failed: {e}", listing.id);
                false
            }
        }
    }

    fn derive(&self, conn: &Connection, listing: &Listing) -> DerivedListing {
        let parts = extract::parse_location_parts(&listing.location);
        let attrs = extract::extract_attributes(listing);
        let identity = self.resolver.resolve(conn, listing);
        DerivedListing {
            asking_price: extract::extract_price(&listing.price),
            city: parts.city,
            state: parts.state,
            // Resolution can find a zip the raw text lacks; the parsed
            // zip stands in when it cannot.
            zip: identity.zip.or(parts.zip),
            beds: attrs.beds,
            baths: attrs.baths,
            county_id: identity.county_id,
            region_id: identity.region_id,
        }
    }
}

fn checked_sales(cfg: Option<SalesConfig>) -> Option<SalesConfig> {
    let cfg = cfg?;
    if safe_ident(&cfg.sales_table) && safe_ident(&cfg.properties_table) {
        Some(cfg)
    } else {
        warn!(
            "sales comps disabled: unsafe table name ({} / {})",
            cfg.sales_table, cfg.properties_table
        );
        None
    }
}

fn checked_peers(cfg: Option<PeerConfig>) -> Option<PeerConfig> {
    let cfg = cfg?;
    let ok = safe_ident(&cfg.table)
        && safe_ident(&cfg.title_column)
        && cfg.price_column.as_deref().map_or(true, safe_ident);
    if ok {
        Some(cfg)
    } else {
        warn!("peer comparison disabled: unsafe identifier in config ({})", cfg.table);
        None
    }
}

fn checked_rent(cfg: Option<RentConfig>) -> Option<RentConfig> {
    let cfg = cfg?;
    if safe_ident(&cfg.table) && safe_ident(&cfg.rent_column) {
        Some(cfg)
    } else {
        warn!(
            "lot rent lookup disabled: unsafe identifier ({} / {})",
            cfg.table, cfg.rent_column
        );
        None
    }
}

fn checked_persist(cfg: Option<PersistConfig>) -> Option<PersistConfig> {
    let mut cfg = cfg?;
    if !safe_ident(&cfg.listings_table) {
        warn!("persistence disabled: unsafe table name ({})", cfg.listings_table);
        return None;
    }
    if let Some(history) = &cfg.history_table {
        if !safe_ident(history) {
            warn!("price history disabled: unsafe table name ({history})");
            cfg.history_table = None;
        }
    }
    Some(cfg)
}
