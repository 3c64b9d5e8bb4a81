//! fincoach-ingest: local validation of transaction CSVs before upload.

pub mod statement;
pub mod types;

pub use statement::{check_extension, load_statement, parse_amount, parse_flexible_date, parse_statement_csv};
pub use types::{REQUIRED_COLUMNS, SkippedRow, StatementRow, UploadPreview};
