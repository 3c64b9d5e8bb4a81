//! Server-computed reports: summary, forecast, feedback, trends, unusual activity.
//!
//! These are the validated, defaulted forms of the endpoint payloads. The
//! wire schemas live next to the HTTP client; by the time a value reaches a
//! slice it has one of these shapes.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::state::CachePayload;

/// Result of the existence probe.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataPresence {
    pub has_data: bool,
    pub count: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Server-side statistics over all stored transactions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_transactions: u64,
    pub total_amount: f64,
    pub total_income: Option<f64>,
    pub total_expenses: Option<f64>,
    pub average_expense: Option<f64>,
    pub average_transaction: Option<f64>,
    /// Absent when the server has no dated transactions.
    pub date_range: Option<DateRange>,
}

/// One month of history behind the forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub month: String,
    pub total_expenses: f64,
    pub total_income: f64,
}

/// Next-month prediction. Every field may be missing when the server had
/// too little history to fit a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub month: Option<String>,
    pub predicted_expenses: Option<f64>,
    pub expenses_lower_bound: Option<f64>,
    pub expenses_upper_bound: Option<f64>,
    pub predicted_income: Option<f64>,
    pub income_lower_bound: Option<f64>,
    pub income_upper_bound: Option<f64>,
    pub history: Vec<ForecastPoint>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Positive,
    /// Anything the server did not mark positive.
    Concern,
}

impl FeedbackKind {
    pub fn from_wire(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("positive") {
            FeedbackKind::Positive
        } else {
            FeedbackKind::Concern
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            FeedbackKind::Positive => "✨",
            FeedbackKind::Concern => "💡",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackItem {
    pub kind: FeedbackKind,
    pub title: String,
    pub message: String,
}

/// Aggregate figures that accompany feedback and trend reports.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    pub total_income: f64,
    pub total_expenses: f64,
    pub net_income: f64,
    pub avg_monthly_income: Option<f64>,
    pub avg_monthly_expenses: Option<f64>,
    pub category_breakdown: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedbackReport {
    pub items: Vec<FeedbackItem>,
    pub summary: Option<FinancialSnapshot>,
}

impl CachePayload for FeedbackReport {
    fn is_empty_payload(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

impl TrendDirection {
    pub fn from_wire(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "increasing" => Some(TrendDirection::Increasing),
            "decreasing" => Some(TrendDirection::Decreasing),
            "stable" => Some(TrendDirection::Stable),
            _ => None,
        }
    }

    /// Display rank: rising spend first, then falling, then flat.
    pub fn rank(&self) -> u8 {
        match self {
            TrendDirection::Increasing => 0,
            TrendDirection::Decreasing => 1,
            TrendDirection::Stable => 2,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrendDirection::Increasing => "Increasing",
            TrendDirection::Decreasing => "Decreasing",
            TrendDirection::Stable => "Stable",
        }
    }
}

/// First-vs-last-month movement for one category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRecord {
    pub category: String,
    pub trend: TrendDirection,
    pub first_value: f64,
    pub last_value: f64,
    pub average: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetItem {
    pub category: String,
    pub trend: TrendDirection,
    pub budget_amount: f64,
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendsReport {
    pub calculated_trends: Vec<TrendRecord>,
    pub budget_plan: Vec<BudgetItem>,
    pub summary: Option<FinancialSnapshot>,
}

impl TrendsReport {
    /// Trends in display order. The stored report is left as received.
    pub fn sorted_trends(&self) -> Vec<TrendRecord> {
        let mut out = self.calculated_trends.clone();
        out.sort_by_key(|t| t.trend.rank());
        out
    }
}

impl CachePayload for TrendsReport {
    // the budget plan is the part the user asked for; trends alone are not enough
    fn is_empty_payload(&self) -> bool {
        self.budget_plan.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Severe,
    Mild,
}

impl Severity {
    pub fn from_score(score: f64) -> Self {
        if score.abs() > 0.4 {
            Severity::Severe
        } else {
            Severity::Mild
        }
    }
}

/// A transaction the server's anomaly model flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusualTransaction {
    pub id: i64,
    pub merchant: String,
    pub amount: f64,
    pub date: Option<NaiveDate>,
    pub category: Option<String>,
    pub anomaly_score: f64,
}

impl UnusualTransaction {
    pub fn severity(&self) -> Severity {
        Severity::from_score(self.anomaly_score)
    }
}

/// Server acknowledgement of a CSV upload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub message: String,
    pub transactions_added: u64,
    pub total_amount: f64,
}
