pub mod connection;
pub mod listings;
pub mod lookups;
pub mod row;

pub use connection::Database;

/// Allow-list check for config-supplied table and column names before
/// they are interpolated into query text. Listing-derived values never
/// go through here; those are always bound parameters.
pub fn safe_ident(name: &str) -> bool {
    !name.is_empty()
        && name
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}
