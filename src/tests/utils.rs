// src/tests/utils.rs

use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::types::FromSql;

use crate::config::{EngineConfig, StoreConfig};
use crate::db::connection::Database;
use crate::domain::Listing;
use crate::errors::StoreError;

/// Store schema mirroring the production tables every feature reads.
pub const TEST_SCHEMA: &str = r#"
CREATE TABLE zip_county (
    zip TEXT NOT NULL,
    county_id INTEGER NOT NULL
);

CREATE TABLE counties (
    id INTEGER PRIMARY KEY,
    name TEXT,
    region_id INTEGER
);

CREATE TABLE properties (
    id INTEGER PRIMARY KEY,
    beds INTEGER,
    baths REAL,
    square_feet INTEGER,
    year_built INTEGER,
    city TEXT,
    state TEXT,
    zip TEXT,
    county_id INTEGER,
    region_id INTEGER
);

CREATE TABLE sales (
    id INTEGER PRIMARY KEY,
    property_id INTEGER NOT NULL,
    sale_price REAL,
    sale_date TEXT
);

CREATE TABLE fb_listings (
    id INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL UNIQUE,
    title TEXT,
    description TEXT,
    asking_price REAL,
    city TEXT,
    state TEXT,
    zip TEXT,
    url TEXT,
    beds INTEGER,
    baths REAL,
    county_id INTEGER,
    region_id INTEGER,
    created_at TEXT,
    updated_at TEXT
);

CREATE TABLE lot_rents (
    id INTEGER PRIMARY KEY,
    zip TEXT,
    county_id INTEGER,
    region_id INTEGER,
    lot_rent REAL
);

CREATE TABLE price_history (
    id INTEGER PRIMARY KEY,
    external_id TEXT NOT NULL,
    price REAL,
    observed_at TEXT
);
"#;

/// Unique temp path so parallel tests never share a store.
pub fn temp_path(tag: &str) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir()
        .join(format!("{tag}_{nanos}.sqlite"))
        .to_string_lossy()
        .to_string()
}

/// Returns a fresh store with the full schema at the given path.
pub fn make_db_at(path: &str) -> Database {
    let _ = env_logger::builder().is_test(true).try_init();
    let db = Database::new(path);
    db.with_conn(|conn| {
        conn.execute_batch(TEST_SCHEMA)
            .map_err(|e| StoreError::Query(format!("schema init failed: {e}")))
    })
    .expect("Failed to initialize test schema");
    db
}

/// Returns a fresh store at a unique temp path.
pub fn make_db(tag: &str) -> Database {
    make_db_at(&temp_path(tag))
}

/// Run one statement, panicking on failure.
pub fn exec(db: &Database, sql: &str) {
    db.with_conn(|conn| {
        conn.execute(sql, [])
            .map_err(|e| StoreError::Query(format!("{sql}: {e}")))?;
        Ok(())
    })
    .expect("seed statement failed");
}

/// First column of the first row.
pub fn query_one<T: FromSql>(db: &Database, sql: &str) -> T {
    db.with_conn(|conn| {
        conn.query_row(sql, [], |row| row.get(0))
            .map_err(|e| StoreError::Query(format!("{sql}: {e}")))
    })
    .expect("query failed")
}

pub fn count(db: &Database, table: &str) -> i64 {
    query_one(db, &format!("SELECT COUNT(*) FROM {table}"))
}

pub fn listing(id: &str, title: &str, price: &str, location: &str) -> Listing {
    Listing {
        id: id.to_string(),
        title: title.to_string(),
        description: String::new(),
        price: price.to_string(),
        location: location.to_string(),
        post_url: format!("https://marketplace.test/item/{id}"),
    }
}

pub fn listing_with_description(
    id: &str,
    title: &str,
    description: &str,
    price: &str,
    location: &str,
) -> Listing {
    Listing {
        description: description.to_string(),
        ..listing(id, title, price, location)
    }
}

/// Config pointing at the given store, no features enabled yet.
pub fn engine_config(store_path: &str) -> EngineConfig {
    EngineConfig {
        store: StoreConfig {
            path: store_path.to_string(),
            ..StoreConfig::default()
        },
        ..EngineConfig::default()
    }
}

/// Erie fixtures: zip 16509 in county 42, county 42 in region 7.
pub fn seed_geo(db: &Database) {
    exec(db, "INSERT INTO zip_county (zip, county_id) VALUES ('16509', 42)");
    exec(
        db,
        "INSERT INTO counties (id, name, region_id) VALUES (42, 'Erie County', 7)",
    );
}

pub fn seed_property(
    db: &Database,
    id: i64,
    zip: &str,
    county_id: i64,
    region_id: i64,
    beds: i64,
    baths: f64,
    year_built: i64,
) {
    exec(
        db,
        &format!(
            "INSERT INTO properties \
             (id, beds, baths, square_feet, year_built, city, state, zip, county_id, region_id) \
             VALUES ({id}, {beds}, {baths}, 1400, {year_built}, 'Erie', 'PA', '{zip}', {county_id}, {region_id})"
        ),
    );
}

pub fn seed_sale(db: &Database, id: i64, property_id: i64, price: f64, date: &str) {
    exec(
        db,
        &format!(
            "INSERT INTO sales (id, property_id, sale_price, sale_date) \
             VALUES ({id}, {property_id}, {price}, '{date}')"
        ),
    );
}
