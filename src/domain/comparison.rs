use std::fmt;

use crate::db::row::StoreRow;

/// Which geographic tier produced a match, widest last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SalesScope {
    Zip,
    County,
    Region,
}

impl SalesScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalesScope::Zip => "zip",
            SalesScope::County => "county",
            SalesScope::Region => "region",
        }
    }
}

impl fmt::Display for SalesScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the engine found for one listing, ready for downstream use.
///
/// `summary` is the multi-line narrative block handed to the evaluation
/// prompt; `concise_price_line` is the one-liner for notifications. Both
/// may be empty when no comparison source was configured or matched.
#[derive(Debug, Clone, Default)]
pub struct ComparisonResult {
    pub summary: String,
    pub rows: Vec<StoreRow>,
    pub concise_price_line: String,
    /// Set when sold comps matched, naming the tier they came from.
    pub sales_scope: Option<SalesScope>,
    /// Derived market-rent line, absent when the listing quotes its own
    /// rent or no rent data matched.
    pub average_lot_rent_line: Option<String>,
}

impl ComparisonResult {
    /// True when nothing matched and no narrative was produced.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.rows.is_empty() && self.average_lot_rent_line.is_none()
    }
}
