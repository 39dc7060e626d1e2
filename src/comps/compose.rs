// src/comps/compose.rs
//
// Turns matched rows into the narrative summary and the one-line price
// verdicts. All pure; the store is never touched from here.

use crate::comps::peers::PeerComps;
use crate::comps::sales::SalesComps;
use crate::db::row::{value_display, StoreRow};
use crate::domain::{ComparisonResult, Listing, SalesScope};
use crate::extract;

/// Merges whatever sources ran into one result. Sources that were not
/// configured pass None and leave no trace in the output.
pub fn compose(
    listing: &Listing,
    sales: Option<&SalesComps>,
    peers: Option<&PeerComps>,
    average_lot_rent_line: Option<String>,
) -> ComparisonResult {
    let listing_price = extract::extract_price(&listing.price);

    let mut summary_parts: Vec<String> = Vec::new();
    let mut sentences: Vec<String> = Vec::new();
    let mut rows: Vec<StoreRow> = Vec::new();

    if let Some(sales) = sales {
        summary_parts.push(sales_summary(sales));
        sentences.push(delta_sentence(
            "Sold comps",
            listing_price,
            &sales.rows,
            Some("sale_price"),
        ));
        rows.extend(sales.rows.iter().cloned());
    }

    if let Some(peers) = peers {
        summary_parts.push(peers_summary(&peers.rows));
        sentences.push(delta_sentence(
            "Similar listings",
            listing_price,
            &peers.rows,
            peers.price_column.as_deref(),
        ));
        rows.extend(peers.rows.iter().cloned());
    }

    ComparisonResult {
        summary: summary_parts.join("\n\n"),
        rows,
        concise_price_line: sentences.join(" "),
        sales_scope: sales.and_then(|s| s.scope),
        average_lot_rent_line,
    }
}

/// Derived market-rent line for the notification comment.
pub fn lot_rent_line(scope: SalesScope, average: f64) -> String {
    format!("Average lot rent ({scope}): ${average:.0}/mo.")
}

fn sales_summary(sales: &SalesComps) -> String {
    if sales.rows.is_empty() {
        return "No recent sales comps found for this location (zip → county → region)."
            .to_string();
    }
    let heading = match (sales.scope, sales.relaxed) {
        (Some(scope), false) => format!("Recent sold comps ({scope}):"),
        (Some(scope), true) => format!("Area comps ({scope}, attribute filters relaxed):"),
        (None, _) => "Recent sold comps:".to_string(),
    };
    format!("{heading}\n{}", rows_to_lines(&sales.rows))
}

fn peers_summary(rows: &[StoreRow]) -> String {
    if rows.is_empty() {
        return "No similar listings found in the database.".to_string();
    }
    format!(
        "Similar or related listings from your database:\n{}",
        rows_to_lines(rows)
    )
}

/// Numbered "name: value | name: value" lines, first six columns of
/// each row.
fn rows_to_lines(rows: &[StoreRow]) -> String {
    rows.iter()
        .enumerate()
        .map(|(idx, row)| {
            let cells: Vec<String> = row
                .iter()
                .take(6)
                .map(|(name, value)| format!("{name}: {}", value_display(value)))
                .collect();
            format!("  {}. {}", idx + 1, cells.join(" | "))
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// One source's price verdict: percentage above or below the mean comp
/// price, or "no comps" (nothing matched) / "no data" (rows without a
/// usable price, or the listing's own price unparseable).
fn delta_sentence(
    label: &str,
    listing_price: Option<f64>,
    rows: &[StoreRow],
    price_field: Option<&str>,
) -> String {
    if rows.is_empty() {
        return format!("{label}: no comps.");
    }
    let mean = price_field.and_then(|field| mean_price(rows, field));
    match (listing_price, mean) {
        (Some(price), Some(mean)) if mean > 0.0 => {
            let pct = (price - mean) / mean * 100.0;
            let direction = if pct < 0.0 { "below" } else { "above" };
            format!("{label}: {:.0}% {direction} average.", pct.abs())
        }
        _ => format!("{label}: no data."),
    }
}

fn mean_price(rows: &[StoreRow], field: &str) -> Option<f64> {
    let prices: Vec<f64> = rows.iter().filter_map(|row| row.as_f64(field)).collect();
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}
