// extract.rs
//
// Regex extraction of structured facts from free-text listing fields.
// Every function here is total: bad input means None, never an error.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::{ExtractedAttributes, Listing};

static PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:,\d{3})*(?:\.\d+)?").unwrap());

static BEDS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)\s*bed").unwrap());

static BATHS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*bath").unwrap());

static YEAR_LABELED_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:built|year|yr)\s*[:\s]*(\d{4})").unwrap());

static YEAR_BARE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(19\d{2}|20[0-2]\d)\b").unwrap());

// A rent amount near the word "rent", in either order.
static RENT_THEN_AMOUNT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(?:lot\s+)?rent\b[^$\n]{0,40}\$\s*\d").unwrap());

static AMOUNT_THEN_RENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\s*[\d,]+(?:\.\d+)?[^$\n]{0,40}\b(?:lot\s+)?rent\b").unwrap());

static ZIP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d{5})(?:-\d{4})?\b").unwrap());

static LOCATION_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r",|\s{2,}").unwrap());

/// City, state and zip pulled out of a free-text location string.
/// Any of the three may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocationParts {
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
}

/// First numeric token of a price string, thousands separators stripped.
///
/// Listing prices arrive as display text like `"$30,000"`, a range like
/// `"$30,000 - $32,000"` (the lower bound wins), or a placeholder. Empty
/// strings and the `**unspecified**` placeholder yield None.
pub fn extract_price(price_text: &str) -> Option<f64> {
    let trimmed = price_text.trim();
    if trimmed.is_empty() || trimmed == "**unspecified**" {
        return None;
    }
    let m = PRICE_RE.find(trimmed)?;
    m.as_str().replace(',', "").parse::<f64>().ok()
}

/// Bed count, bath count and build year from combined listing text.
///
/// Baths may be fractional ("2.5 bath"). The year prefers a labeled
/// mention ("built 1995") and otherwise takes the first plausible
/// 1900..=2029 token anywhere in the text.
pub fn extract_beds_baths_year(text: &str) -> (Option<i64>, Option<f64>, Option<i64>) {
    let lower = text.to_lowercase();

    let beds = BEDS_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<i64>().ok());

    let baths = BATHS_RE
        .captures(&lower)
        .and_then(|c| c[1].parse::<f64>().ok());

    let year = YEAR_LABELED_RE
        .captures(&lower)
        .or_else(|| YEAR_BARE_RE.captures(&lower))
        .and_then(|c| c[1].parse::<i64>().ok());

    (beds, baths, year)
}

/// Whether the text already quotes a dollar amount near the word "rent".
/// Used to suppress the derived average-lot-rent line when the seller
/// states one themselves.
pub fn mentions_rent_with_amount(text: &str) -> bool {
    let lower = text.to_lowercase();
    RENT_THEN_AMOUNT_RE.is_match(&lower) || AMOUNT_THEN_RENT_RE.is_match(&lower)
}

/// Splits a location string like "Erie, PA" into parts.
///
/// The zip is any standalone 5-digit token (a ZIP+4 suffix is dropped).
/// Parts are separated by commas or runs of two-plus spaces; the state is
/// a final part that is exactly two letters, and the city is the first
/// part when a state was found. A lone part with no zip is a bare city.
pub fn parse_location_parts(location: &str) -> LocationParts {
    let trimmed = location.trim();
    if trimmed.is_empty() {
        return LocationParts::default();
    }

    let zip = ZIP_RE.captures(trimmed).map(|c| c[1].to_string());

    let parts: Vec<String> = LOCATION_SPLIT_RE
        .split(trimmed)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect();

    let mut city = None;
    let mut state = None;

    if parts.len() >= 2 {
        let last = &parts[parts.len() - 1];
        if last.len() == 2 && last.chars().all(|c| c.is_ascii_alphabetic()) {
            state = Some(last.clone());
            city = parts.first().cloned();
        }
    } else if parts.len() == 1 && zip.is_none() {
        city = parts.first().cloned();
    }

    LocationParts { city, state, zip }
}

/// All regex-derived facts for one listing, title and description combined.
pub fn extract_attributes(listing: &Listing) -> ExtractedAttributes {
    let text = listing.combined_text();
    let (beds, baths, year_built) = extract_beds_baths_year(&text);
    ExtractedAttributes {
        beds,
        baths,
        year_built,
        rent_mentioned: mentions_rent_with_amount(&text),
    }
}
