// errors.rs
use std::fmt;

/// Errors from the comparable store. Every store call returns one of these
/// explicitly; the caller decides at the call site whether to absorb it
/// and continue with "not found" or to report failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store could not be opened or reached.
    Connection(String),
    /// A query failed (bad SQL, unknown column, lock contention).
    Query(String),
    /// A config-supplied table or column name failed the allow-list check.
    UnsafeIdentifier(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Connection(msg) => write!(f, "Store connection error: {msg}"),
            StoreError::Query(msg) => write!(f, "Query error: {msg}"),
            StoreError::UnsafeIdentifier(name) => write!(f, "Unsafe identifier rejected: {name}"),
        }
    }
}

impl std::error::Error for StoreError {}
