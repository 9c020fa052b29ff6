use chrono::NaiveDate;
use thiserror::Error;

/// Rejections raised while reading a dataset, before any record reaches the
/// forecaster. Row numbers count data rows from 1, excluding the header.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to open dataset: {0}")]
    Io(#[from] std::io::Error),
    #[error("row {row}: {source}")]
    Csv {
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("missing required columns: {}", missing.join(", "))]
    MissingColumns { missing: Vec<&'static str> },
    #[error("row {row}: vendor name is empty")]
    EmptyVendor { row: usize },
    #[error("row {row}: {field} {value} is outside 0-100")]
    OutOfRange {
        row: usize,
        field: &'static str,
        value: f64,
    },
    #[error("row {row}: duplicate period {period} for vendor {vendor}")]
    DuplicatePeriod {
        row: usize,
        vendor: String,
        period: NaiveDate,
    },
}
