mod cache;
mod geocoder;
mod resolver;

pub use cache::{CacheBackend, GeocodeCache, JsonFileBackend};
pub use geocoder::{Geocode, Geocoder, HttpProvider, ZipProvider};
pub use resolver::LocationResolver;

use std::error::Error;
use std::fmt;

#[derive(Debug)]
pub enum GeocodeError {
    InvalidEndpoint(String),
    Network(String),
    BadResponse(String),
}

impl fmt::Display for GeocodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeocodeError::InvalidEndpoint(msg) => write!(f, "Invalid geocoder endpoint: {msg}"),
            GeocodeError::Network(msg) => write!(f, "Network error: {msg}"),
            GeocodeError::BadResponse(msg) => write!(f, "Bad geocoder response: {msg}"),
        }
    }
}

impl Error for GeocodeError {}
