use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A raw extracted table: ordered rows of text cells, structure unknown.
pub type RawTable = Vec<Vec<String>>;

#[derive(Debug, Clone, Deserialize)]
pub struct PageText {
    pub page: i64,
    pub text: String,
}

/// One document's worth of extraction-layer output. The external
/// extraction layer already drops tables with fewer than two rows and
/// whitespace-only pages; nothing here re-validates that.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractedDocument {
    pub document_id: i64,
    pub fund_id: i64,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub tables: Vec<RawTable>,
    #[serde(default)]
    pub pages: Vec<PageText>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableCategory {
    CapitalCall,
    Distribution,
    Adjustment,
    Unclassified,
}

/// A typed transaction extracted from one table row. Constructed once,
/// handed to the store, never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub enum TransactionRecord {
    CapitalCall {
        fund_id: i64,
        date: NaiveDate,
        amount: f64,
        call_type: String,
    },
    Distribution {
        fund_id: i64,
        date: NaiveDate,
        amount: f64,
        distribution_type: String,
        is_recallable: bool,
    },
    Adjustment {
        fund_id: i64,
        date: NaiveDate,
        amount: f64,
        adjustment_type: String,
        is_contribution_adjustment: bool,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TableStats {
    pub capital_calls: usize,
    pub distributions: usize,
    pub adjustments: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingStatus {
    Completed,
    Failed,
}

impl ProcessingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingStats {
    pub pages_processed: usize,
    pub tables_found: usize,
    pub capital_calls: usize,
    pub distributions: usize,
    pub adjustments: usize,
    pub text_chunks: usize,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessingResult {
    pub status: ProcessingStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statistics: Option<ProcessingStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessingResult {
    pub fn completed(statistics: ProcessingStats) -> Self {
        Self {
            status: ProcessingStatus::Completed,
            statistics: Some(statistics),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            status: ProcessingStatus::Failed,
            statistics: None,
            error: Some(error.into()),
        }
    }
}
