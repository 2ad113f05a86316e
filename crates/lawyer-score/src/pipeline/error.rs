use serde::Serialize;

/// Failures that stop a batch before any record is produced.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InputError {
    #[error("CSV file appears to be empty")]
    Empty,
    #[error("CSV file must have at least a header row")]
    NoHeader,
    #[error("CSV header row could not be read: {0}")]
    UnreadableHeader(String),
    #[error("CSV file contains only headers, no data rows found")]
    NoDataRows,
    #[error("no valid data rows could be processed from the CSV file ({skipped} skipped)")]
    NoValidRows { skipped: usize },
}

/// A single data row that was dropped while the rest of the batch continued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("row {row_number}: {kind}")]
pub struct RowError {
    pub row_number: usize,
    pub kind: RowErrorKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum RowErrorKind {
    #[error("malformed delimited record: {0}")]
    Malformed(String),
    #[error("row has no values")]
    Blank,
}
