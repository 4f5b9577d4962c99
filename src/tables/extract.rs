use anyhow::Result;
use tracing::warn;

use crate::model::{TableCategory, TransactionRecord};
use crate::store::TransactionStore;

use super::columns::{find_header_row, resolve_columns};
use super::values::{parse_amount, parse_date};

const RECALLABLE_TOKENS: &[&str] = &["yes", "true", "y", "1"];

/// Extracts capital call records from a classified table. Bad rows are
/// skipped; the batch is committed once after the row loop. Returns the
/// number of records submitted to the store.
pub fn extract_capital_calls(
    table: &[Vec<String>],
    store: &mut dyn TransactionStore,
    fund_id: i64,
) -> Result<usize> {
    let header_idx = find_header_row(table);
    let headers = lowercased_headers(&table[header_idx]);
    let Some(columns) = resolve_columns(&headers, TableCategory::CapitalCall) else {
        return Ok(0);
    };

    let mut count = 0usize;
    for (row_idx, row) in table.iter().enumerate().skip(header_idx + 1) {
        if row.len() <= columns.max_required_index() {
            continue;
        }

        let Some(date) = parse_date(&row[columns.date]) else {
            continue;
        };
        let Some(amount) = parse_amount(&row[columns.amount], false) else {
            continue;
        };
        if amount <= 0.0 {
            continue;
        }

        let call_type = type_label(row, columns.type_label, "Capital Call");
        let record = TransactionRecord::CapitalCall {
            fund_id,
            date,
            amount,
            call_type,
        };

        if let Err(err) = store.add(&record) {
            warn!(row = row_idx, error = %err, "skipping capital call row");
            continue;
        }
        count += 1;
    }

    store.commit_batch()?;
    Ok(count)
}

pub fn extract_distributions(
    table: &[Vec<String>],
    store: &mut dyn TransactionStore,
    fund_id: i64,
) -> Result<usize> {
    let header_idx = find_header_row(table);
    let headers = lowercased_headers(&table[header_idx]);
    let Some(columns) = resolve_columns(&headers, TableCategory::Distribution) else {
        return Ok(0);
    };

    let mut count = 0usize;
    for (row_idx, row) in table.iter().enumerate().skip(header_idx + 1) {
        if row.len() <= columns.max_required_index() {
            continue;
        }

        let Some(date) = parse_date(&row[columns.date]) else {
            continue;
        };
        let Some(amount) = parse_amount(&row[columns.amount], false) else {
            continue;
        };
        if amount <= 0.0 {
            continue;
        }

        let distribution_type = type_label(row, columns.type_label, "Distribution");
        let is_recallable = recallable_flag(row, columns.recallable);
        let record = TransactionRecord::Distribution {
            fund_id,
            date,
            amount,
            distribution_type,
            is_recallable,
        };

        if let Err(err) = store.add(&record) {
            warn!(row = row_idx, error = %err, "skipping distribution row");
            continue;
        }
        count += 1;
    }

    store.commit_batch()?;
    Ok(count)
}

pub fn extract_adjustments(
    table: &[Vec<String>],
    store: &mut dyn TransactionStore,
    fund_id: i64,
) -> Result<usize> {
    let header_idx = find_header_row(table);
    let headers = lowercased_headers(&table[header_idx]);
    let Some(columns) = resolve_columns(&headers, TableCategory::Adjustment) else {
        return Ok(0);
    };

    let mut count = 0usize;
    for (row_idx, row) in table.iter().enumerate().skip(header_idx + 1) {
        if row.len() <= columns.max_required_index() {
            continue;
        }

        let Some(date) = parse_date(&row[columns.date]) else {
            continue;
        };
        // Adjustments are signed; only a total parse failure skips.
        let Some(amount) = parse_amount(&row[columns.amount], true) else {
            continue;
        };

        let adjustment_type = type_label(row, columns.type_label, "Adjustment");
        let lowered = adjustment_type.to_lowercase();
        let is_contribution_adjustment =
            lowered.contains("capital") || lowered.contains("contribution");
        let record = TransactionRecord::Adjustment {
            fund_id,
            date,
            amount,
            adjustment_type,
            is_contribution_adjustment,
        };

        if let Err(err) = store.add(&record) {
            warn!(row = row_idx, error = %err, "skipping adjustment row");
            continue;
        }
        count += 1;
    }

    store.commit_batch()?;
    Ok(count)
}

fn lowercased_headers(row: &[String]) -> Vec<String> {
    row.iter()
        .map(|cell| cell.trim().to_lowercase())
        .collect::<Vec<String>>()
}

fn type_label(row: &[String], column: Option<usize>, default: &str) -> String {
    match column {
        Some(idx) if row.len() > idx && !row[idx].trim().is_empty() => row[idx].trim().to_string(),
        _ => default.to_string(),
    }
}

fn recallable_flag(row: &[String], column: Option<usize>) -> bool {
    match column {
        Some(idx) if row.len() > idx => {
            let token = row[idx].trim().to_lowercase();
            RECALLABLE_TOKENS.contains(&token.as_str())
        }
        _ => false,
    }
}
