// src/geo/cache.rs
//
// Geocode results cache. Misses are cached too, as None, so a query that
// once came back empty is never sent to the network again.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use log::warn;

/// A cached outcome: resolved zip, or a recorded "no result".
pub type CachedZip = Option<String>;

/// Persistence hook for the cache. Implementations load once at startup
/// and rewrite the whole map after each new entry.
pub trait CacheBackend: Send + Sync {
    fn load(&self) -> HashMap<String, CachedZip>;
    fn store(&self, entries: &HashMap<String, CachedZip>);
}

/// Whole-map JSON file. Read errors mean an empty cache, write errors
/// are logged and dropped; the cache itself keeps working in memory.
pub struct JsonFileBackend {
    path: PathBuf,
}

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CacheBackend for JsonFileBackend {
    fn load(&self) -> HashMap<String, CachedZip> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(_) => return HashMap::new(),
        };
        match serde_json::from_str(&raw) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("geocode cache file {} unreadable: {e}", self.path.display());
                HashMap::new()
            }
        }
    }

    fn store(&self, entries: &HashMap<String, CachedZip>) {
        let json = match serde_json::to_string(entries) {
            Ok(json) => json,
            Err(e) => {
                warn!("geocode cache serialize failed: {e}");
                return;
            }
        };
        if let Err(e) = fs::write(&self.path, json) {
            warn!("geocode cache write to {} failed: {e}", self.path.display());
        }
    }
}

/// In-memory cache with an optional backend, owned by whoever builds the
/// resolver. Check-then-set is atomic under one lock so two callers
/// racing on the same query cannot both think it is uncached.
pub struct GeocodeCache {
    entries: Mutex<HashMap<String, CachedZip>>,
    backend: Option<Box<dyn CacheBackend>>,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            backend: None,
        }
    }

    pub fn with_backend(backend: Box<dyn CacheBackend>) -> Self {
        let entries = backend.load();
        Self {
            entries: Mutex::new(entries),
            backend: Some(backend),
        }
    }

    /// Cache key for a city/state query.
    pub fn normalize_key(city: &str, state: &str) -> String {
        format!("{},{},usa", city.trim(), state.trim()).to_lowercase()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, CachedZip>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Outer None means "never asked"; Some(None) is a recorded miss.
    pub fn get(&self, key: &str) -> Option<CachedZip> {
        self.lock().get(key).cloned()
    }

    /// Stores the value unless the key is already present; returns
    /// whichever value the cache holds afterwards.
    pub fn insert_if_absent(&self, key: &str, value: CachedZip) -> CachedZip {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(key) {
            return existing.clone();
        }
        entries.insert(key.to_string(), value.clone());
        if let Some(backend) = &self.backend {
            backend.store(&entries);
        }
        value
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl Default for GeocodeCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_normalization() {
        assert_eq!(GeocodeCache::normalize_key(" Erie ", "PA"), "erie,pa,usa");
    }

    #[test]
    fn first_write_wins() {
        let cache = GeocodeCache::new();
        let key = GeocodeCache::normalize_key("Erie", "PA");
        assert_eq!(cache.get(&key), None);

        let winner = cache.insert_if_absent(&key, Some("16509".to_string()));
        assert_eq!(winner, Some("16509".to_string()));

        // A later writer loses; the cached value stands.
        let still = cache.insert_if_absent(&key, Some("99999".to_string()));
        assert_eq!(still, Some("16509".to_string()));
        assert_eq!(cache.get(&key), Some(Some("16509".to_string())));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn misses_are_cached() {
        let cache = GeocodeCache::new();
        cache.insert_if_absent("nowhere,zz,usa", None);
        assert_eq!(cache.get("nowhere,zz,usa"), Some(None));
    }

    #[test]
    fn json_backend_round_trips_hits_and_misses() {
        let path = std::env::temp_dir().join(format!(
            "geocode_cache_{}.json",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));

        {
            let cache = GeocodeCache::with_backend(Box::new(JsonFileBackend::new(&path)));
            cache.insert_if_absent("erie,pa,usa", Some("16509".to_string()));
            cache.insert_if_absent("nowhere,zz,usa", None);
        }

        let reloaded = GeocodeCache::with_backend(Box::new(JsonFileBackend::new(&path)));
        assert_eq!(reloaded.get("erie,pa,usa"), Some(Some("16509".to_string())));
        assert_eq!(reloaded.get("nowhere,zz,usa"), Some(None));

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn missing_backend_file_means_empty_cache() {
        let backend = JsonFileBackend::new("/nonexistent/dir/cache.json");
        let cache = GeocodeCache::with_backend(Box::new(backend));
        assert!(cache.is_empty());
    }
}
