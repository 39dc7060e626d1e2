// src/output.rs
//
// Helpers for the two collaborators that consume a ComparisonResult:
// the prompt composer gets the full narrative block, the notification
// composer gets a one-line suffix sized by output_format.

use crate::config::OutputFormat;
use crate::domain::ComparisonResult;

const SHORT_SUMMARY_CHARS: usize = 120;

/// Appends the comparison block to an evaluation prompt. Prompts without
/// any comparison text pass through untouched.
pub fn augment_prompt(prompt: &str, comparison: &ComparisonResult) -> String {
    if comparison.summary.is_empty() && comparison.average_lot_rent_line.is_none() {
        return prompt.to_string();
    }
    let mut out = String::from(prompt);
    out.push_str(
        "\n\n--- Comparison data from your database (use this to compare prices/conditions): ---\n",
    );
    out.push_str(&comparison.summary);
    if let Some(line) = &comparison.average_lot_rent_line {
        if !comparison.summary.is_empty() {
            out.push('\n');
        }
        out.push_str(line);
    }
    out.push_str("\n--- End of comparison data ---\n");
    out
}

/// Appends comparison context to a notification comment. Full mode takes
/// the whole flattened summary, short mode truncates it, none leaves the
/// comment untouched. The price verdict and rent lines ride along
/// verbatim after the summary text.
pub fn append_to_comment(
    comment: &str,
    comparison: &ComparisonResult,
    format: OutputFormat,
) -> String {
    if format == OutputFormat::None || comparison.is_empty() {
        return comment.to_string();
    }

    let mut db_text = comparison.summary.replace('\n', " ").trim().to_string();
    if format == OutputFormat::Short && db_text.chars().count() > SHORT_SUMMARY_CHARS {
        db_text = db_text.chars().take(SHORT_SUMMARY_CHARS).collect::<String>() + "...";
    }

    let mut parts: Vec<String> = Vec::new();
    if !db_text.is_empty() {
        parts.push(db_text);
    }
    if !comparison.concise_price_line.is_empty() {
        parts.push(comparison.concise_price_line.clone());
    }
    if let Some(line) = &comparison.average_lot_rent_line {
        parts.push(line.clone());
    }
    if parts.is_empty() {
        return comment.to_string();
    }
    format!("{comment} | DB: {}", parts.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result_with(summary: &str, price_line: &str, rent: Option<&str>) -> ComparisonResult {
        ComparisonResult {
            summary: summary.to_string(),
            concise_price_line: price_line.to_string(),
            average_lot_rent_line: rent.map(str::to_string),
            ..ComparisonResult::default()
        }
    }

    #[test]
    fn prompt_gains_delimited_block() {
        let comparison = result_with("Recent sold comps (zip):\n  1. sale_price: 239000", "", None);
        let prompt = augment_prompt("Evaluate this listing.", &comparison);
        assert!(prompt.starts_with("Evaluate this listing."));
        assert!(prompt.contains(
            "--- Comparison data from your database (use this to compare prices/conditions): ---"
        ));
        assert!(prompt.contains("Recent sold comps (zip):"));
        assert!(prompt.trim_end().ends_with("--- End of comparison data ---"));
    }

    #[test]
    fn prompt_untouched_without_summary() {
        let comparison = ComparisonResult::default();
        assert_eq!(augment_prompt("Evaluate.", &comparison), "Evaluate.");
    }

    #[test]
    fn full_comment_carries_flattened_summary_and_verdict() {
        let comparison = result_with(
            "Recent sold comps (zip):\n  1. sale_price: 239000",
            "Sold comps: 17% below average.",
            Some("Average lot rent (county): $450/mo."),
        );
        let comment = append_to_comment("Good deal.", &comparison, OutputFormat::Full);
        assert_eq!(
            comment,
            "Good deal. | DB: Recent sold comps (zip):   1. sale_price: 239000 \
             Sold comps: 17% below average. Average lot rent (county): $450/mo."
        );
    }

    #[test]
    fn short_comment_truncates_summary_only() {
        let long_summary = "x".repeat(200);
        let comparison = result_with(&long_summary, "Sold comps: no comps.", None);
        let comment = append_to_comment("Ok.", &comparison, OutputFormat::Short);

        let expected_db = format!("{}...", "x".repeat(120));
        assert_eq!(comment, format!("Ok. | DB: {expected_db} Sold comps: no comps."));
    }

    #[test]
    fn short_comment_leaves_short_summaries_alone() {
        let comparison = result_with("brief", "", None);
        assert_eq!(
            append_to_comment("Ok.", &comparison, OutputFormat::Short),
            "Ok. | DB: brief"
        );
    }

    #[test]
    fn none_format_leaves_comment_untouched() {
        let comparison = result_with("anything", "Sold comps: no comps.", None);
        assert_eq!(
            append_to_comment("Ok.", &comparison, OutputFormat::None),
            "Ok."
        );
    }

    #[test]
    fn empty_result_appends_nothing() {
        let comparison = ComparisonResult::default();
        assert_eq!(
            append_to_comment("Ok.", &comparison, OutputFormat::Full),
            "Ok."
        );
    }
}
