//! Transaction record as served by the dashboard API

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::month::MonthKey;

/// Label used when a transaction carries no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// A single bank transaction.
///
/// Owned by the remote service; the client never edits one in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Transaction {
    /// Server-assigned identifier
    pub id: i64,
    /// Booking date (local calendar date, no timezone)
    pub date: NaiveDate,
    /// Merchant / counterparty name
    pub merchant: String,
    /// Positive = income, negative = expense
    pub amount: f64,
    /// Category assigned by the server, if any
    #[serde(default)]
    pub category: Option<String>,
    /// Free-form description from the statement
    #[serde(default)]
    pub description: Option<String>,
    /// Server-side creation timestamp (ISO-8601)
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Transaction {
    /// Create a transaction with no category or description.
    pub fn new(id: i64, date: NaiveDate, merchant: impl Into<String>, amount: f64) -> Self {
        Self {
            id,
            date,
            merchant: merchant.into(),
            amount,
            category: None,
            description: None,
            created_at: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns true if this is an expense (negative amount)
    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }

    /// Returns true if this is income (positive amount)
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    /// Get the absolute amount
    pub fn abs_amount(&self) -> f64 {
        self.amount.abs()
    }

    /// Category name, or `fallback` when absent or blank.
    pub fn category_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => fallback,
        }
    }

    /// Category name with the default label applied.
    pub fn category_label(&self) -> &str {
        self.category_or(UNCATEGORIZED)
    }

    /// Calendar month this transaction belongs to.
    pub fn month_key(&self) -> MonthKey {
        MonthKey::from_date(self.date)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_expense_and_income_flags() {
        let coffee = Transaction::new(1, day(2025, 3, 2), "Blue Bottle", -4.5);
        assert!(coffee.is_expense());
        assert!(!coffee.is_income());
        assert_eq!(coffee.abs_amount(), 4.5);

        let salary = Transaction::new(2, day(2025, 3, 1), "Acme Payroll", 3200.0);
        assert!(salary.is_income());
    }

    #[test]
    fn test_missing_or_blank_category_uses_default() {
        let t = Transaction::new(1, day(2025, 1, 9), "Corner Shop", -3.0);
        assert_eq!(t.category_label(), UNCATEGORIZED);

        let blank = t.clone().with_category("   ");
        assert_eq!(blank.category_label(), UNCATEGORIZED);
        assert_eq!(blank.category_or("Other"), "Other");

        let food = t.with_category("Food");
        assert_eq!(food.category_label(), "Food");
    }

    #[test]
    fn test_deserialize_without_optional_fields() {
        let json = r#"{"id": 7, "date": "2024-11-30", "merchant": "Trader Joe's", "amount": -52.1}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id, 7);
        assert_eq!(t.category, None);
        assert_eq!(t.description, None);
        assert_eq!(t.month_key().to_string(), "2024-11");
    }
}
