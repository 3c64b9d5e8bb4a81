use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Columns an uploadable statement must carry.
pub const REQUIRED_COLUMNS: [&str; 3] = ["date", "merchant", "amount"];

/// One row of an upload CSV, after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    pub date: NaiveDate,
    pub merchant: String,
    /// Negative for spend, positive for income.
    pub amount: f64,
    pub description: Option<String>,
}

/// A row the parser could not use. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    pub line: usize,
    pub reason: String,
}

/// What an upload would send, checked locally before any network call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadPreview {
    pub rows: Vec<StatementRow>,
    pub skipped: Vec<SkippedRow>,
}

impl UploadPreview {
    pub fn accepted(&self) -> usize {
        self.rows.len()
    }

    /// Sum of accepted amounts, rounded to cents.
    pub fn total_amount(&self) -> f64 {
        let sum: f64 = self.rows.iter().map(|r| r.amount).sum();
        (sum * 100.0).round() / 100.0
    }
}
