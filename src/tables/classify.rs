use crate::model::{RawTable, TableCategory};

// Plain vocabulary data. Each keyword counts at most once per table no
// matter how often it repeats in the header text.
const CAPITAL_CALL_KEYWORDS: &[&str] = &[
    "capital call",
    "capital contribution",
    "drawdown",
    "call date",
    "call number",
    "contribution date",
];

const DISTRIBUTION_KEYWORDS: &[&str] = &[
    "distribution",
    "return of capital",
    "dividend",
    "distribution date",
    "payment",
    "return",
];

const ADJUSTMENT_KEYWORDS: &[&str] = &[
    "adjustment",
    "rebalance",
    "recall",
    "recallable",
    "correction",
    "amendment",
];

/// Scores the first few rows of a table against the three keyword
/// vocabularies. Ties resolve in fixed priority order: capital call,
/// then distribution, then adjustment.
pub fn classify(table: &RawTable) -> TableCategory {
    let header_text = table
        .iter()
        .take(3)
        .map(|row| {
            row.iter()
                .map(|cell| cell.to_lowercase())
                .collect::<Vec<String>>()
                .join(" ")
        })
        .collect::<Vec<String>>()
        .join(" ");

    let capital_score = keyword_score(&header_text, CAPITAL_CALL_KEYWORDS);
    let distribution_score = keyword_score(&header_text, DISTRIBUTION_KEYWORDS);
    let adjustment_score = keyword_score(&header_text, ADJUSTMENT_KEYWORDS);

    let max_score = capital_score.max(distribution_score).max(adjustment_score);
    if max_score == 0 {
        return TableCategory::Unclassified;
    }

    if capital_score == max_score {
        TableCategory::CapitalCall
    } else if distribution_score == max_score {
        TableCategory::Distribution
    } else {
        TableCategory::Adjustment
    }
}

fn keyword_score(haystack: &str, keywords: &[&str]) -> usize {
    keywords
        .iter()
        .filter(|keyword| haystack.contains(*keyword))
        .count()
}
