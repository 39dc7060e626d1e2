use rusqlite::Connection;
use std::cell::RefCell;
use std::time::Duration;

use crate::config::StoreConfig;
use crate::errors::StoreError;

// Thread-local connection slot, keyed by path so two handles on the same
// thread never share a session.
thread_local! {
    static DB_CONN: RefCell<Option<(String, Connection)>> = RefCell::new(None);
}

#[derive(Clone)]
pub struct Database {
    path: String,
    busy_timeout: Duration,
}

impl Database {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            busy_timeout: Duration::from_millis(StoreConfig::default().busy_timeout_ms),
        }
    }

    pub fn from_config(cfg: &StoreConfig) -> Self {
        Self {
            path: cfg.path.clone(),
            busy_timeout: Duration::from_millis(cfg.busy_timeout_ms),
        }
    }

    /// Provides a mutable connection to the closure, opening one lazily.
    pub fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let inner_result = DB_CONN
            .try_with(|cell| {
                let mut slot = cell.borrow_mut();
                let reopen = match &*slot {
                    Some((path, _)) => path != &self.path,
                    None => true,
                };
                if reopen {
                    let conn = Connection::open(&self.path).map_err(|e| {
                        StoreError::Connection(format!("open {} failed: {e}", self.path))
                    })?;
                    conn.busy_timeout(self.busy_timeout)
                        .map_err(|e| StoreError::Connection(format!("busy_timeout: {e}")))?;
                    *slot = Some((self.path.clone(), conn));
                }
                match slot.as_mut() {
                    Some((_, conn)) => f(conn),
                    None => Err(StoreError::Connection("connection slot empty".to_string())),
                }
            })
            .map_err(|_| StoreError::Connection("thread-local slot unavailable".to_string()))?;
        inner_result
    }
}
