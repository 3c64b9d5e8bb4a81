//! Upload CSV validation.
//!
//! Expected header (any column order, extra columns ignored):
//!   date,merchant,amount[,description]
//!
//! Rows whose date or amount cannot be read are skipped and reported, the
//! same way the server treats them, so the preview matches what the upload
//! will store.

use std::path::Path;
use std::sync::OnceLock;

use anyhow::{Context, Result, bail};
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::types::{REQUIRED_COLUMNS, SkippedRow, StatementRow, UploadPreview};

const DATE_FORMATS: [&str; 7] = [
    "%Y-%m-%d",
    "%m/%d/%y",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%d %b %Y",
    "%b %d, %Y",
    "%B %d, %Y",
];

fn amount_noise() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[\s$,]").expect("static regex"))
}

/// Reject anything that is not a `.csv` file before reading it.
pub fn check_extension(path: &Path) -> Result<()> {
    let is_csv = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    if !is_csv {
        bail!("Only CSV files are allowed: {}", path.display());
    }
    Ok(())
}

/// Parse a date the way a spreadsheet export usually writes it.
pub fn parse_flexible_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // timestamps: keep the calendar day
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s.get(..19)?, fmt) {
            return Some(dt.date());
        }
    }
    None
}

/// Parse an amount, tolerating currency symbols, thousands separators and
/// accounting-style parentheses for negatives.
pub fn parse_amount(s: &str) -> Option<f64> {
    let cleaned = amount_noise().replace_all(s.trim(), "");
    let (negate, body) = match cleaned.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, &*cleaned),
    };
    let v: f64 = body.parse().ok()?;
    if !v.is_finite() {
        return None;
    }
    Some(if negate { -v } else { v })
}

/// Validate CSV text and collect the rows an upload would store.
pub fn parse_statement_csv(text: &str) -> Result<UploadPreview> {
    if text.trim().is_empty() {
        bail!("CSV file is empty");
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = rdr.headers().context("reading CSV header")?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| column(c).is_none())
        .collect();
    if !missing.is_empty() {
        bail!("Missing required columns: {}", missing.join(", "));
    }
    let (Some(date_col), Some(merchant_col), Some(amount_col)) =
        (column("date"), column("merchant"), column("amount"))
    else {
        bail!("Missing required columns");
    };
    let description_col = column("description");

    let mut preview = UploadPreview::default();
    for (idx, result) in rdr.records().enumerate() {
        // header is line 1
        let line = idx + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                preview.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let raw_date = record.get(date_col).unwrap_or("");
        let Some(date) = parse_flexible_date(raw_date) else {
            preview.skipped.push(SkippedRow {
                line,
                reason: format!("unreadable date '{raw_date}'"),
            });
            continue;
        };

        let raw_amount = record.get(amount_col).unwrap_or("");
        let Some(amount) = parse_amount(raw_amount) else {
            preview.skipped.push(SkippedRow {
                line,
                reason: format!("unreadable amount '{raw_amount}'"),
            });
            continue;
        };

        let description = description_col
            .and_then(|c| record.get(c))
            .filter(|d| !d.is_empty())
            .map(str::to_string);

        preview.rows.push(StatementRow {
            date,
            merchant: record.get(merchant_col).unwrap_or("").to_string(),
            amount,
            description,
        });
    }

    Ok(preview)
}

/// Check and parse a statement file on disk.
pub fn load_statement(path: impl AsRef<Path>) -> Result<UploadPreview> {
    let path = path.as_ref();
    check_extension(path)?;
    let bytes = std::fs::read(path).with_context(|| format!("opening {}", path.display()))?;
    let text = String::from_utf8(bytes).with_context(|| format!("{} is not UTF-8", path.display()))?;
    parse_statement_csv(&text).with_context(|| format!("validating {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_basic_statement() {
        let text = "date,merchant,amount,description\n\
                    2025-04-01,Corner Cafe,-4.50,latte\n\
                    04/03/2025,ACME Payroll,\"2,000.00\",\n";
        let preview = parse_statement_csv(text).unwrap();
        assert_eq!(preview.accepted(), 2);
        assert!(preview.skipped.is_empty());
        assert_eq!(preview.rows[0].description.as_deref(), Some("latte"));
        assert_eq!(preview.rows[1].date, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
        assert_eq!(preview.rows[1].amount, 2000.0);
        assert_eq!(preview.rows[1].description, None);
        assert_eq!(preview.total_amount(), 1995.5);
    }

    #[test]
    fn test_description_optional_and_column_order_free() {
        let text = "amount,merchant,date\n-12.00,Grocer,2025-05-02\n";
        let preview = parse_statement_csv(text).unwrap();
        assert_eq!(preview.rows[0].merchant, "Grocer");
        assert_eq!(preview.rows[0].amount, -12.0);
    }

    #[test]
    fn test_missing_columns_named() {
        let err = parse_statement_csv("date,description\n2025-01-01,x\n").unwrap_err();
        assert_eq!(err.to_string(), "Missing required columns: merchant, amount");
    }

    #[test]
    fn test_empty_file_rejected() {
        let err = parse_statement_csv("  \n").unwrap_err();
        assert_eq!(err.to_string(), "CSV file is empty");
    }

    #[test]
    fn test_bad_rows_skipped_with_line_numbers() {
        let text = "date,merchant,amount\n\
                    not-a-date,A,-1.00\n\
                    2025-02-01,B,abc\n\
                    2025-02-02,C,-3.00\n";
        let preview = parse_statement_csv(text).unwrap();
        assert_eq!(preview.accepted(), 1);
        assert_eq!(preview.skipped.len(), 2);
        assert_eq!(preview.skipped[0].line, 2);
        assert_eq!(preview.skipped[1].line, 3);
        assert!(preview.skipped[1].reason.contains("amount"));
    }

    #[test]
    fn test_amount_formats() {
        assert_eq!(parse_amount("$1,234.50"), Some(1234.5));
        assert_eq!(parse_amount("(15.00)"), Some(-15.0));
        assert_eq!(parse_amount("-0.99"), Some(-0.99));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("NaN"), None);
    }

    #[test]
    fn test_date_formats() {
        let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(parse_flexible_date("2025-03-07"), Some(d));
        assert_eq!(parse_flexible_date("03/07/2025"), Some(d));
        assert_eq!(parse_flexible_date("07 Mar 2025"), Some(d));
        assert_eq!(parse_flexible_date("2025-03-07T10:15:00"), Some(d));
        assert_eq!(parse_flexible_date("yesterday"), None);
    }

    #[test]
    fn test_extension_check() {
        assert!(check_extension(Path::new("april.CSV")).is_ok());
        assert!(check_extension(Path::new("april.xlsx")).is_err());
        assert!(check_extension(Path::new("april")).is_err());
    }
}
