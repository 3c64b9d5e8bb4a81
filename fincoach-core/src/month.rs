//! Calendar-month keys and the month filter used by the dashboard views.

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoachError;

/// A calendar month, rendered as zero-padded `YYYY-MM`.
///
/// Ordering is chronological, which matches lexicographic order of the
/// rendered key for four-digit years.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct MonthKey {
    year: i32,
    month: u32,
}

fn month_key_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?P<year>\d{4})-(?P<month>\d{2})$").expect("static regex"))
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        if (1..=12).contains(&month) {
            Some(Self { year, month })
        } else {
            None
        }
    }

    /// Month of a local calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// Short human label, e.g. `Jan 2025`.
    pub fn display_name(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%b %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for MonthKey {
    type Err = CoachError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let caps = month_key_re()
            .captures(s.trim())
            .ok_or_else(|| CoachError::InvalidInput(format!("expected YYYY-MM, got '{s}'")))?;
        let year: i32 = caps["year"]
            .parse()
            .map_err(|_| CoachError::InvalidInput(format!("bad year in '{s}'")))?;
        let month: u32 = caps["month"]
            .parse()
            .map_err(|_| CoachError::InvalidInput(format!("bad month in '{s}'")))?;
        MonthKey::new(year, month)
            .ok_or_else(|| CoachError::InvalidInput(format!("month out of range in '{s}'")))
    }
}

impl From<MonthKey> for String {
    fn from(key: MonthKey) -> Self {
        key.to_string()
    }
}

impl TryFrom<String> for MonthKey {
    type Error = CoachError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Month selection for the transaction views: everything, or one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MonthFilter {
    #[default]
    All,
    Month(MonthKey),
}

impl MonthFilter {
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            MonthFilter::All => true,
            MonthFilter::Month(key) => MonthKey::from_date(date) == *key,
        }
    }
}

impl FromStr for MonthFilter {
    type Err = CoachError;

    /// Accepts the sentinel `all` (any case) or a `YYYY-MM` key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(MonthFilter::All);
        }
        Ok(MonthFilter::Month(s.parse()?))
    }
}

impl fmt::Display for MonthFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthFilter::All => f.write_str("all"),
            MonthFilter::Month(key) => key.fmt(f),
        }
    }
}
