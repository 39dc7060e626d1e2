mod comparison;
mod identity;
mod listing;

pub use comparison::{ComparisonResult, SalesScope};
pub use identity::{ExtractedAttributes, GeographicIdentity};
pub use listing::Listing;
