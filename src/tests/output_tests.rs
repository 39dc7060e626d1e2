// src/tests/output_tests.rs

use crate::config::{OutputFormat, RentConfig, SalesConfig};
use crate::engine::CompareEngine;
use crate::output::{append_to_comment, augment_prompt};
use crate::tests::utils::{
    engine_config, exec, listing, make_db_at, seed_geo, seed_property, seed_sale, temp_path,
};

fn sales_engine(tag: &str) -> (CompareEngine, String) {
    let path = temp_path(tag);
    let db = make_db_at(&path);
    seed_geo(&db);
    seed_property(&db, 1, "16509", 42, 7, 3, 2.0, 1998);
    seed_sale(&db, 1, 1, 239_000.0, "2024-03-01");

    let mut cfg = engine_config(&path);
    cfg.sales = Some(SalesConfig::default());
    (CompareEngine::new(cfg), path)
}

#[test]
fn prompt_gains_the_comparison_block() {
    let (engine, _path) = sales_engine("output_prompt");

    let subject = listing("L1", "Skyline 3 bed", "$30,000", "Erie, PA 16509");
    let comparison = engine.fetch_comparison(&subject).expect("comps expected");

    let prompt = augment_prompt("Evaluate this listing.", &comparison);
    assert!(prompt.starts_with("Evaluate this listing."));
    assert!(prompt.contains(
        "--- Comparison data from your database (use this to compare prices/conditions): ---"
    ));
    assert!(prompt.contains("Recent sold comps (zip):"));
    assert!(prompt.contains("sale_price: 239000"));
    assert!(prompt.trim_end().ends_with("--- End of comparison data ---"));
}

#[test]
fn comment_formats_follow_the_configured_size() {
    let (engine, _path) = sales_engine("output_comment");

    let subject = listing("L1", "Skyline 3 bed", "$30,000", "Erie, PA 16509");
    let comparison = engine.fetch_comparison(&subject).expect("comps expected");

    let full = append_to_comment("Nice find.", &comparison, OutputFormat::Full);
    assert!(full.starts_with("Nice find. | DB: Recent sold comps (zip):"));
    assert!(full.contains("Sold comps:"));
    assert!(!full.contains('\n'));

    let short = append_to_comment("Nice find.", &comparison, OutputFormat::Short);
    assert!(short.contains("..."));
    assert!(short.contains("Sold comps:"));
    assert!(short.len() < full.len());

    let none = append_to_comment("Nice find.", &comparison, OutputFormat::None);
    assert_eq!(none, "Nice find.");
}

#[test]
fn rent_only_result_still_renders() {
    let path = temp_path("output_rent_only");
    let db = make_db_at(&path);
    seed_geo(&db);
    exec(&db, "INSERT INTO lot_rents (zip, lot_rent) VALUES ('16509', 425)");

    let mut cfg = engine_config(&path);
    cfg.rent = Some(RentConfig::default());
    let engine = CompareEngine::new(cfg);

    let subject = listing("L1", "Park home", "$30,000", "Erie, PA 16509");
    let comparison = engine.fetch_comparison(&subject).expect("rent line expected");

    let prompt = augment_prompt("Evaluate.", &comparison);
    assert!(prompt.contains("Average lot rent (zip): $425/mo."));

    let comment = append_to_comment("Look.", &comparison, OutputFormat::Full);
    assert_eq!(comment, "Look. | DB: Average lot rent (zip): $425/mo.");
}
