// src/geo/geocoder.rs
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use reqwest::blocking::Client;
use serde::Deserialize;
use url::Url;

use crate::config::GeocodeConfig;
use crate::geo::cache::GeocodeCache;
use crate::geo::GeocodeError;

const USER_AGENT: &str = "market-compare/0.1 (listing comparison engine)";

/// City/state to zip capability. The resolver only ever sees this seam,
/// so the provider behind it is swappable.
pub trait Geocode: Send + Sync {
    fn geocode(&self, city: &str, state: &str) -> Option<String>;
}

/// One live lookup of a free-text query. Separated from [`Geocoder`] so
/// caching and rate limiting can be exercised without a network.
pub trait ZipProvider: Send + Sync {
    fn lookup(&self, query: &str) -> Result<Option<String>, GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct GeoResult {
    #[serde(default)]
    address: GeoAddress,
}

#[derive(Debug, Default, Deserialize)]
struct GeoAddress {
    postcode: Option<String>,
}

/// Nominatim-style search endpoint speaking JSON.
pub struct HttpProvider {
    client: Client,
    endpoint: Url,
}

impl HttpProvider {
    pub fn new(cfg: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let endpoint = Url::parse(&cfg.endpoint)
            .map_err(|e| GeocodeError::InvalidEndpoint(format!("{}: {e}", cfg.endpoint)))?;
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(cfg.timeout_secs))
            .build()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;
        Ok(Self { client, endpoint })
    }
}

impl ZipProvider for HttpProvider {
    fn lookup(&self, query: &str) -> Result<Option<String>, GeocodeError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("format", "json")
            .append_pair("addressdetails", "1")
            .append_pair("limit", "3");

        let resp = self
            .client
            .get(url)
            .send()
            .map_err(|e| GeocodeError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(GeocodeError::Network(format!("geocoder returned {status}")));
        }

        let results: Vec<GeoResult> = resp
            .json()
            .map_err(|e| GeocodeError::BadResponse(e.to_string()))?;

        // First candidate with a usable postal code wins.
        Ok(results
            .iter()
            .filter_map(|r| r.address.postcode.as_deref())
            .find_map(five_digit_zip))
    }
}

/// Truncates to five chars and accepts only all-digit results, so
/// "16509-1234" passes as "16509" and non-US postcodes drop out.
fn five_digit_zip(postcode: &str) -> Option<String> {
    let truncated: String = postcode.trim().chars().take(5).collect();
    if truncated.len() == 5 && truncated.chars().all(|c| c.is_ascii_digit()) {
        Some(truncated)
    } else {
        None
    }
}

/// Cache-first geocoding with a mandatory post-call sleep.
///
/// The sleep runs after every live attempt, hit or miss or error, so the
/// external service sees at most one request per interval from this
/// call site.
pub struct Geocoder {
    provider: Box<dyn ZipProvider>,
    cache: Arc<GeocodeCache>,
    rate_limit: Duration,
}

impl Geocoder {
    pub fn new(
        provider: Box<dyn ZipProvider>,
        cache: Arc<GeocodeCache>,
        rate_limit: Duration,
    ) -> Self {
        Self {
            provider,
            cache,
            rate_limit,
        }
    }

    pub fn from_config(
        cfg: &GeocodeConfig,
        cache: Arc<GeocodeCache>,
    ) -> Result<Self, GeocodeError> {
        let provider = HttpProvider::new(cfg)?;
        let rate_limit = Duration::from_secs_f64(cfg.rate_limit_secs.max(0.0));
        Ok(Self::new(Box::new(provider), cache, rate_limit))
    }
}

impl Geocode for Geocoder {
    fn geocode(&self, city: &str, state: &str) -> Option<String> {
        let city = city.trim();
        let state = state.trim();
        if city.is_empty() && state.is_empty() {
            return None;
        }

        let key = GeocodeCache::normalize_key(city, state);
        if let Some(cached) = self.cache.get(&key) {
            debug!("geocode cache hit for {key}");
            return cached;
        }

        let query = format!("{city},{state},USA");
        let outcome = self.provider.lookup(&query);
        if !self.rate_limit.is_zero() {
            thread::sleep(self.rate_limit);
        }

        let zip = match outcome {
            Ok(zip) => zip,
            Err(e) => {
                warn!("geocoding \"{query}\" failed: {e}");
                None
            }
        };
        self.cache.insert_if_absent(&key, zip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Instant;

    struct CountingProvider {
        calls: Arc<AtomicUsize>,
        zip: Option<String>,
        fail: bool,
    }

    impl ZipProvider for CountingProvider {
        fn lookup(&self, _query: &str) -> Result<Option<String>, GeocodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GeocodeError::Network("connection refused".to_string()))
            } else {
                Ok(self.zip.clone())
            }
        }
    }

    fn counting_geocoder(
        zip: Option<&str>,
        fail: bool,
        rate_limit: Duration,
    ) -> (Geocoder, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let provider = CountingProvider {
            calls: Arc::clone(&calls),
            zip: zip.map(str::to_string),
            fail,
        };
        let geocoder = Geocoder::new(
            Box::new(provider),
            Arc::new(GeocodeCache::new()),
            rate_limit,
        );
        (geocoder, calls)
    }

    #[test]
    fn zip_validation() {
        assert_eq!(five_digit_zip("16509"), Some("16509".to_string()));
        assert_eq!(five_digit_zip("16509-1234"), Some("16509".to_string()));
        assert_eq!(five_digit_zip(" 16509 "), Some("16509".to_string()));
        assert_eq!(five_digit_zip("165"), None);
        assert_eq!(five_digit_zip("K1A 0B1"), None);
        assert_eq!(five_digit_zip(""), None);
    }

    #[test]
    fn empty_query_never_reaches_provider() {
        let (geocoder, calls) = counting_geocoder(Some("16509"), false, Duration::ZERO);
        assert_eq!(geocoder.geocode("", "  "), None);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let (geocoder, calls) = counting_geocoder(Some("16509"), false, Duration::ZERO);
        assert_eq!(geocoder.geocode("Erie", "PA"), Some("16509".to_string()));
        assert_eq!(geocoder.geocode("Erie", "PA"), Some("16509".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn provider_error_becomes_cached_miss() {
        let (geocoder, calls) = counting_geocoder(None, true, Duration::ZERO);
        assert_eq!(geocoder.geocode("Erie", "PA"), None);
        // The failure is recorded; no retry on the next call.
        assert_eq!(geocoder.geocode("Erie", "PA"), None);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rate_limit_sleep_applies_even_on_error() {
        let limit = Duration::from_millis(30);
        let (geocoder, _) = counting_geocoder(None, true, limit);
        let start = Instant::now();
        geocoder.geocode("Erie", "PA");
        assert!(start.elapsed() >= limit);
    }

    #[test]
    fn cached_hit_skips_the_sleep() {
        let limit = Duration::from_millis(200);
        let (geocoder, _) = counting_geocoder(Some("16509"), false, limit);
        geocoder.geocode("Erie", "PA");
        let start = Instant::now();
        geocoder.geocode("Erie", "PA");
        assert!(start.elapsed() < limit);
    }
}
