mod compose;
mod peers;
mod sales;

pub use compose::{compose, lot_rent_line};
pub use peers::{PeerComps, PeerMatcher};
pub use sales::{SalesCompMatcher, SalesComps};
