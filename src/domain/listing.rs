use serde::Deserialize;

/// A marketplace listing as handed over by the monitor.
///
/// Every field except `id` may arrive empty; the engine treats empty text
/// as "no signal" rather than an error.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct Listing {
    /// Stable external identifier from the source marketplace.
    pub id: String,

    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// Display-formatted price text, e.g. "$30,000" or "$30,000 - $32,000".
    #[serde(default)]
    pub price: String,

    /// Free-text location, e.g. "Erie, PA" or "Erie, PA 16509".
    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub post_url: String,
}

impl Listing {
    /// Title and description joined for pattern extraction.
    pub fn combined_text(&self) -> String {
        format!("{} {}", self.title, self.description)
    }
}
