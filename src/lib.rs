pub mod comps;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod errors;
pub mod extract;
pub mod geo;
pub mod output;

#[cfg(test)]
mod tests;

pub use config::{EngineConfig, OutputFormat};
pub use domain::{ComparisonResult, GeographicIdentity, Listing, SalesScope};
pub use engine::CompareEngine;
pub use errors::StoreError;
