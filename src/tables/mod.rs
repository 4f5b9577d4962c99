use crate::model::{RawTable, TableCategory, TableStats};
use crate::store::TransactionStore;

mod classify;
mod columns;
mod extract;
mod values;

use classify::classify;
use extract::{extract_adjustments, extract_capital_calls, extract_distributions};

/// Classifies each table and dispatches to the matching extractor.
/// Tables with fewer than two rows and unclassified tables are skipped
/// silently. Extractor failures are collected as per-table error
/// strings; this function never fails as a whole.
pub fn parse_tables(
    tables: &[RawTable],
    store: &mut dyn TransactionStore,
    fund_id: i64,
) -> TableStats {
    let mut stats = TableStats::default();

    for (table_idx, table) in tables.iter().enumerate() {
        if table.len() < 2 {
            continue;
        }

        let outcome = match classify(table) {
            TableCategory::CapitalCall => extract_capital_calls(table, store, fund_id)
                .map(|count| stats.capital_calls += count),
            TableCategory::Distribution => extract_distributions(table, store, fund_id)
                .map(|count| stats.distributions += count),
            TableCategory::Adjustment => extract_adjustments(table, store, fund_id)
                .map(|count| stats.adjustments += count),
            TableCategory::Unclassified => Ok(()),
        };

        if let Err(err) = outcome {
            stats
                .errors
                .push(format!("error parsing table {table_idx}: {err:#}"));
        }
    }

    stats
}
