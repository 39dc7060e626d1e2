// src/geo/resolver.rs
//
// Zip, then county, then region, each from the narrowest source that
// answers. Resolution never fails: every miss or store error degrades to
// an absent field and the chain moves on.

use std::sync::Arc;

use log::{debug, warn};
use rusqlite::Connection;

use crate::config::GeoConfig;
use crate::db::lookups;
use crate::domain::{GeographicIdentity, Listing};
use crate::extract;
use crate::geo::geocoder::Geocode;

pub struct LocationResolver {
    geo: GeoConfig,
    /// Set when a sales mode is active; enables the store-internal
    /// fallbacks that read property rows.
    properties_table: Option<String>,
    geocoder: Option<Arc<dyn Geocode>>,
}

impl LocationResolver {
    pub fn new(geo: GeoConfig) -> Self {
        Self {
            geo,
            properties_table: None,
            geocoder: None,
        }
    }

    pub fn with_properties_table(mut self, table: impl Into<String>) -> Self {
        self.properties_table = Some(table.into());
        self
    }

    pub fn with_geocoder(mut self, geocoder: Arc<dyn Geocode>) -> Self {
        self.geocoder = Some(geocoder);
        self
    }

    /// Full identity for one listing. County is only attempted once a
    /// zip is known, and region only once a county is.
    pub fn resolve(&self, conn: &Connection, listing: &Listing) -> GeographicIdentity {
        let Some(zip) = self.resolve_zip(conn, listing) else {
            return GeographicIdentity::default();
        };
        let county_id = self.resolve_county(conn, &zip);
        let region_id = county_id.and_then(|county_id| self.resolve_region(conn, county_id));
        GeographicIdentity {
            zip: Some(zip),
            county_id,
            region_id,
        }
    }

    /// Zip priority: literal zip in the text, then live geocoding, then
    /// an exact city/state match against stored properties.
    fn resolve_zip(&self, conn: &Connection, listing: &Listing) -> Option<String> {
        let parts = extract::parse_location_parts(&listing.location);
        if let Some(zip) = parts.zip {
            debug!("listing {}: zip {zip} taken from location text", listing.id);
            return Some(zip);
        }

        let (city, state) = match (&parts.city, &parts.state) {
            (Some(city), Some(state)) => (city.as_str(), state.as_str()),
            _ => return None,
        };

        if let Some(geocoder) = &self.geocoder {
            if let Some(zip) = geocoder.geocode(city, state) {
                debug!("listing {}: zip {zip} via geocoder for {city}, {state}", listing.id);
                return Some(zip);
            }
        }

        if let Some(table) = &self.properties_table {
            match lookups::zip_for_city_state(conn, table, city, state) {
                Ok(Some(zip)) => {
                    debug!("listing {}: zip {zip} from stored properties", listing.id);
                    return Some(zip);
                }
                Ok(None) => {}
                Err(e) => warn!("stored zip lookup for {city}, {state} skipped: {e}"),
            }
        }

        None
    }

    fn resolve_county(&self, conn: &Connection, zip: &str) -> Option<i64> {
        match lookups::county_for_zip(conn, &self.geo.zip_county_table, zip) {
            Ok(Some(county_id)) => return Some(county_id),
            Ok(None) => {}
            Err(e) => warn!("county lookup for zip {zip} skipped: {e}"),
        }

        if let Some(table) = &self.properties_table {
            match lookups::county_from_properties(conn, table, zip) {
                Ok(found) => return found,
                Err(e) => warn!("property county fallback for zip {zip} skipped: {e}"),
            }
        }

        None
    }

    fn resolve_region(&self, conn: &Connection, county_id: i64) -> Option<i64> {
        match lookups::region_for_county(conn, &self.geo.counties_table, county_id) {
            Ok(Some(region_id)) => return Some(region_id),
            Ok(None) => {}
            Err(e) => warn!("region lookup for county {county_id} skipped: {e}"),
        }

        if let Some(table) = &self.properties_table {
            match lookups::region_from_properties(conn, table, county_id) {
                Ok(found) => return found,
                Err(e) => warn!("property region fallback for county {county_id} skipped: {e}"),
            }
        }

        None
    }
}
