use crate::model::TableCategory;

const HEADER_ROW_KEYWORDS: &[&str] = &["date", "amount", "type", "description"];

/// Resolved column positions for one table. `date` and `amount` are
/// required; a table where either is missing contributes no records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMap {
    pub date: usize,
    pub amount: usize,
    pub type_label: Option<usize>,
    pub recallable: Option<usize>,
}

impl ColumnMap {
    /// Rows shorter than this cannot hold both required cells.
    pub fn max_required_index(&self) -> usize {
        self.date.max(self.amount)
    }
}

/// Scans the first three rows for a generic header word and returns the
/// first match, defaulting to row 0. Known limitation: a data cell that
/// happens to contain one of the generic words can win over the real
/// header row; the misidentified row is then treated as the header.
pub fn find_header_row(table: &[Vec<String>]) -> usize {
    for (idx, row) in table.iter().take(3).enumerate() {
        let row_text = row
            .iter()
            .map(|cell| cell.to_lowercase())
            .collect::<Vec<String>>()
            .join(" ");
        if HEADER_ROW_KEYWORDS
            .iter()
            .any(|keyword| row_text.contains(keyword))
        {
            return idx;
        }
    }

    0
}

/// First header cell containing any of the candidate names as a
/// substring. Headers are expected lower-cased and trimmed.
pub fn find_column(headers: &[String], candidates: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|header| candidates.iter().any(|name| header.contains(name)))
}

pub fn resolve_columns(headers: &[String], category: TableCategory) -> Option<ColumnMap> {
    let (date_names, amount_names, type_names, recallable_names): (
        &[&str],
        &[&str],
        &[&str],
        &[&str],
    ) = match category {
        TableCategory::CapitalCall => (
            &["date", "call date", "contribution date"],
            &["amount", "call amount", "contribution"],
            &["type", "call type", "description"],
            &[],
        ),
        TableCategory::Distribution => (
            &["date", "distribution date", "payment date"],
            &["amount", "distribution", "payment"],
            &["type", "distribution type", "description"],
            &["recallable", "recall", "is recallable"],
        ),
        TableCategory::Adjustment => (
            &["date", "adjustment date"],
            &["amount", "adjustment"],
            &["type", "adjustment type", "category"],
            &[],
        ),
        TableCategory::Unclassified => return None,
    };

    let date = find_column(headers, date_names)?;
    let amount = find_column(headers, amount_names)?;
    let type_label = find_column(headers, type_names);
    let recallable = if recallable_names.is_empty() {
        None
    } else {
        find_column(headers, recallable_names)
    };

    Some(ColumnMap {
        date,
        amount,
        type_label,
        recallable,
    })
}
