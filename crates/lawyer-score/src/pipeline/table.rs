use super::error::{InputError, RowError, RowErrorKind};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Field separator used by an upload, chosen from the header line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Delimiter {
    Comma,
    Semicolon,
}

impl Delimiter {
    pub fn as_byte(self) -> u8 {
        match self {
            Delimiter::Comma => b',',
            Delimiter::Semicolon => b';',
        }
    }

    /// Semicolon wins only when the header has no commas at all, or splits
    /// into strictly more fields on `;` than on `,`.
    pub fn detect(first_line: &str) -> Self {
        if first_line.contains(';') {
            let semicolon_fields = first_line.split(';').count();
            let comma_fields = first_line.split(',').count();
            if !first_line.contains(',') || semicolon_fields > comma_fields {
                return Delimiter::Semicolon;
            }
        }
        Delimiter::Comma
    }
}

/// One data line keyed by header text. Values are untyped strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RawRow {
    row_number: usize,
    cells: BTreeMap<String, String>,
}

impl RawRow {
    pub fn new(row_number: usize) -> Self {
        Self {
            row_number,
            cells: BTreeMap::new(),
        }
    }

    pub fn from_pairs<K, V>(row_number: usize, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut row = Self::new(row_number);
        for (header, value) in pairs {
            row.insert(header, value);
        }
        row
    }

    /// First column wins when a header is repeated.
    pub fn insert(&mut self, header: impl Into<String>, value: impl Into<String>) {
        self.cells.entry(header.into()).or_insert_with(|| value.into());
    }

    /// 1-based position among the non-blank lines of the upload (header is 1).
    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn get(&self, header: &str) -> Option<&str> {
        self.cells.get(header).map(String::as_str)
    }

    pub fn cells(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .map(|(header, value)| (header.as_str(), value.as_str()))
    }

    pub fn is_blank(&self) -> bool {
        self.cells.values().all(|value| value.trim().is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub delimiter: Delimiter,
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    pub malformed: Vec<RowError>,
}

pub fn parse_table(content: &str) -> Result<ParsedTable, InputError> {
    if content.trim().is_empty() {
        return Err(InputError::Empty);
    }

    let lines: Vec<&str> = content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .collect();
    let Some(first_line) = lines.first() else {
        return Err(InputError::NoHeader);
    };
    let first_line = first_line.trim_start_matches('\u{feff}');

    let delimiter = Delimiter::detect(first_line);
    let headers = split_line(first_line, delimiter)
        .map_err(InputError::UnreadableHeader)?;
    debug!(columns = headers.len(), ?delimiter, "csv header parsed");

    if lines.len() == 1 {
        return Err(InputError::NoDataRows);
    }

    let mut rows = Vec::with_capacity(lines.len() - 1);
    let mut malformed = Vec::new();
    for (index, line) in lines.iter().enumerate().skip(1) {
        let row_number = index + 1;
        match split_line(line, delimiter) {
            Ok(values) => {
                let mut row = RawRow::new(row_number);
                for (column, header) in headers.iter().enumerate() {
                    if header.is_empty() {
                        continue;
                    }
                    let value = values.get(column).map(String::as_str).unwrap_or("");
                    row.insert(header.as_str(), value);
                }
                rows.push(row);
            }
            Err(err) => {
                warn!(row = row_number, error = %err, "skipping malformed row");
                malformed.push(RowError {
                    row_number,
                    kind: RowErrorKind::Malformed(err),
                });
            }
        }
    }

    Ok(ParsedTable {
        delimiter,
        headers,
        rows,
        malformed,
    })
}

/// Quote-aware split of a single physical line. A line with an odd number of
/// quote characters has a field that never closes and is rejected.
fn split_line(line: &str, delimiter: Delimiter) -> Result<Vec<String>, String> {
    if line.matches('"').count() % 2 != 0 {
        return Err("unterminated quoted field".to_string());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.as_byte())
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(line.as_bytes());

    let mut record = csv::StringRecord::new();
    let has_record = reader
        .read_record(&mut record)
        .map_err(|err| err.to_string())?;
    if !has_record {
        return Ok(Vec::new());
    }
    Ok(record.iter().map(str::to_string).collect())
}
