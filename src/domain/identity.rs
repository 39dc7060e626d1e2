/// Geographic identity resolved from a listing's location text.
///
/// Strictly top-down: `county_id` is only ever set when `zip` is, and
/// `region_id` only when `county_id` is. A fully-empty identity means the
/// location gave no usable signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GeographicIdentity {
    pub zip: Option<String>,
    pub county_id: Option<i64>,
    pub region_id: Option<i64>,
}

impl GeographicIdentity {
    pub fn is_empty(&self) -> bool {
        self.zip.is_none() && self.county_id.is_none() && self.region_id.is_none()
    }
}

/// Facts pulled from listing text by the extractor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedAttributes {
    pub beds: Option<i64>,
    pub baths: Option<f64>,
    pub year_built: Option<i64>,
    /// The listing itself already quotes a rent amount, so derived
    /// market-rent lines must stay out of the output.
    pub rent_mentioned: bool,
}
