//! JSON shapes of the dashboard API.
//!
//! Each `Wire*` struct mirrors one endpoint body with every optional field
//! defaulted, and converts into the matching `fincoach_core` type. Decoding
//! failures surface as [`CoachError::Malformed`].

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::warn;

use fincoach_core::{
    BudgetItem, CoachError, CoachResult, DataPresence, DateRange, FeedbackItem, FeedbackKind,
    FeedbackReport, FinancialSnapshot, Forecast, ForecastPoint, Summary, Transaction,
    TrendDirection, TrendRecord, TrendsReport, UnusualTransaction, UploadReceipt,
};

/// Accepts `YYYY-MM-DD`, an ISO timestamp, or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum WireDate {
    Text(String),
    Millis(i64),
}

impl WireDate {
    pub fn to_date(&self) -> Option<NaiveDate> {
        match self {
            WireDate::Text(s) => parse_wire_date(s),
            WireDate::Millis(ms) => DateTime::from_timestamp_millis(*ms).map(|dt| dt.date_naive()),
        }
    }
}

pub fn parse_wire_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|dt| dt.date())
}

#[derive(Debug, Clone, Deserialize)]
pub struct WirePresence {
    #[serde(default)]
    pub has_data: bool,
    #[serde(default)]
    pub count: Option<u64>,
}

impl From<WirePresence> for DataPresence {
    fn from(w: WirePresence) -> Self {
        DataPresence {
            has_data: w.has_data,
            count: w.count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTransaction {
    pub id: i64,
    pub date: String,
    #[serde(default)]
    pub merchant: String,
    pub amount: f64,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl WireTransaction {
    pub fn into_transaction(self, endpoint: &str) -> CoachResult<Transaction> {
        let date = parse_wire_date(&self.date).ok_or_else(|| {
            CoachError::malformed(
                endpoint,
                format!("transaction {} has bad date '{}'", self.id, self.date),
            )
        })?;
        Ok(Transaction {
            id: self.id,
            date,
            merchant: self.merchant,
            amount: self.amount,
            category: self.category,
            description: self.description,
            created_at: self.created_at,
        })
    }
}

pub fn transactions_from_wire(endpoint: &str, wire: Vec<WireTransaction>) -> CoachResult<Vec<Transaction>> {
    wire.into_iter().map(|w| w.into_transaction(endpoint)).collect()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireDateRange {
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireSummary {
    #[serde(default)]
    pub total_transactions: u64,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default)]
    pub total_income: Option<f64>,
    #[serde(default)]
    pub total_expenses: Option<f64>,
    #[serde(default)]
    pub average_expense: Option<f64>,
    #[serde(default)]
    pub average_transaction: Option<f64>,
    #[serde(default)]
    pub date_range: Option<WireDateRange>,
}

impl From<WireSummary> for Summary {
    fn from(w: WireSummary) -> Self {
        Summary {
            total_transactions: w.total_transactions,
            total_amount: w.total_amount,
            total_income: w.total_income,
            total_expenses: w.total_expenses,
            average_expense: w.average_expense,
            average_transaction: w.average_transaction,
            date_range: w.date_range.map(|r| DateRange {
                start: r.start.as_deref().and_then(parse_wire_date),
                end: r.end.as_deref().and_then(parse_wire_date),
            }),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireForecastBody {
    #[serde(default)]
    pub month: Option<String>,
    #[serde(default)]
    pub predicted_expenses: Option<f64>,
    #[serde(default)]
    pub expenses_lower_bound: Option<f64>,
    #[serde(default)]
    pub expenses_upper_bound: Option<f64>,
    #[serde(default)]
    pub predicted_income: Option<f64>,
    #[serde(default)]
    pub income_lower_bound: Option<f64>,
    #[serde(default)]
    pub income_upper_bound: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireForecastPoint {
    pub month: String,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub total_income: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireForecast {
    #[serde(default)]
    pub forecast: WireForecastBody,
    #[serde(default)]
    pub history: Vec<WireForecastPoint>,
}

impl From<WireForecast> for Forecast {
    fn from(w: WireForecast) -> Self {
        let f = w.forecast;
        Forecast {
            month: f.month,
            predicted_expenses: f.predicted_expenses,
            expenses_lower_bound: f.expenses_lower_bound,
            expenses_upper_bound: f.expenses_upper_bound,
            predicted_income: f.predicted_income,
            income_lower_bound: f.income_lower_bound,
            income_upper_bound: f.income_upper_bound,
            history: w
                .history
                .into_iter()
                .map(|p| ForecastPoint {
                    month: p.month,
                    total_expenses: p.total_expenses,
                    total_income: p.total_income,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireSnapshot {
    #[serde(default)]
    pub total_income: f64,
    #[serde(default)]
    pub total_expenses: f64,
    #[serde(default)]
    pub net_income: f64,
    #[serde(default)]
    pub avg_monthly_income: Option<f64>,
    #[serde(default)]
    pub avg_monthly_expenses: Option<f64>,
    #[serde(default)]
    pub category_breakdown: BTreeMap<String, f64>,
}

impl From<WireSnapshot> for FinancialSnapshot {
    fn from(w: WireSnapshot) -> Self {
        FinancialSnapshot {
            total_income: w.total_income,
            total_expenses: w.total_expenses,
            net_income: w.net_income,
            avg_monthly_income: w.avg_monthly_income,
            avg_monthly_expenses: w.avg_monthly_expenses,
            category_breakdown: w.category_breakdown,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireFeedbackItem {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireFeedback {
    #[serde(default)]
    pub feedback: Vec<WireFeedbackItem>,
    #[serde(default)]
    pub summary: Option<WireSnapshot>,
}

impl From<WireFeedback> for FeedbackReport {
    fn from(w: WireFeedback) -> Self {
        FeedbackReport {
            items: w
                .feedback
                .into_iter()
                .map(|i| FeedbackItem {
                    kind: FeedbackKind::from_wire(&i.kind),
                    title: i.title,
                    message: i.message,
                })
                .collect(),
            summary: w.summary.map(Into::into),
        }
    }
}

fn trend_or_stable(raw: &str, category: &str) -> TrendDirection {
    TrendDirection::from_wire(raw).unwrap_or_else(|| {
        warn!(category, trend = raw, "unknown trend direction, treating as stable");
        TrendDirection::Stable
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireTrend {
    pub category: String,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub first_value: f64,
    #[serde(default)]
    pub last_value: f64,
    #[serde(default)]
    pub average: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireBudgetItem {
    pub category: String,
    #[serde(default)]
    pub trend: String,
    #[serde(default)]
    pub budget_amount: f64,
    #[serde(default)]
    pub recommendation: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireTrends {
    #[serde(default)]
    pub calculated_trends: Vec<WireTrend>,
    #[serde(default)]
    pub budget_plan: Vec<WireBudgetItem>,
    #[serde(default)]
    pub summary: Option<WireSnapshot>,
}

impl From<WireTrends> for TrendsReport {
    fn from(w: WireTrends) -> Self {
        TrendsReport {
            calculated_trends: w
                .calculated_trends
                .into_iter()
                .map(|t| TrendRecord {
                    trend: trend_or_stable(&t.trend, &t.category),
                    category: t.category,
                    first_value: t.first_value,
                    last_value: t.last_value,
                    average: t.average,
                })
                .collect(),
            budget_plan: w
                .budget_plan
                .into_iter()
                .map(|b| BudgetItem {
                    trend: trend_or_stable(&b.trend, &b.category),
                    category: b.category,
                    budget_amount: b.budget_amount,
                    recommendation: b.recommendation,
                })
                .collect(),
            summary: w.summary.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireUnusual {
    pub id: i64,
    #[serde(default)]
    pub merchant: String,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub date: Option<WireDate>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub anomaly_score: f64,
}

impl From<WireUnusual> for UnusualTransaction {
    fn from(w: WireUnusual) -> Self {
        UnusualTransaction {
            id: w.id,
            merchant: w.merchant,
            amount: w.amount,
            date: w.date.as_ref().and_then(WireDate::to_date),
            category: w.category,
            anomaly_score: w.anomaly_score,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireUpload {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub transactions_added: u64,
    #[serde(default)]
    pub total_amount: f64,
}

impl From<WireUpload> for UploadReceipt {
    fn from(w: WireUpload) -> Self {
        UploadReceipt {
            message: w.message,
            transactions_added: w.transactions_added,
            total_amount: w.total_amount,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireMessage {
    #[serde(default)]
    pub message: Option<String>,
}

/// Pull a readable reason out of an error body (`{"detail": ..}` or text).
pub fn error_detail(body: &str) -> String {
    #[derive(Deserialize)]
    struct Detail {
        detail: serde_json::Value,
    }
    match serde_json::from_str::<Detail>(body) {
        Ok(Detail {
            detail: serde_json::Value::String(s),
        }) => s,
        Ok(Detail { detail }) => detail.to_string(),
        Err(_) => {
            let trimmed = body.trim();
            match trimmed.char_indices().nth(200) {
                Some((cut, _)) => format!("{}…", &trimmed[..cut]),
                None => trimmed.to_string(),
            }
        }
    }
}
