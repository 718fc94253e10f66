//! Shared CSV table reading.
//!
//! Every tabular input (persisted map, universe snapshot, vendor tables,
//! reference lookups) is a header row plus one row per key. This module
//! reads such a table into keyed rows; callers decide what the columns mean.

use super::field::non_blank;
use std::io::Read;
use thiserror::Error;

/// Errors for malformed tabular data.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("malformed csv")]
    Csv(#[from] csv::Error),

    #[error("table I/O error")]
    Io(#[from] std::io::Error),

    #[error("missing column '{column}'")]
    MissingColumn { column: String },

    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },

    #[error("record '{bloomberg_ticker}' has no {scheme} key")]
    MissingKey {
        bloomberg_ticker: String,
        scheme: String,
    },
}

/// One data row: its key and the remaining `(header, value)` cells in
/// header order. Blank cells are kept as empty strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedRow {
    pub key: String,
    pub cells: Vec<(String, String)>,
}

impl KeyedRow {
    /// Non-blank cells only.
    pub fn values(&self) -> impl Iterator<Item = (&str, &str)> {
        self.cells
            .iter()
            .filter_map(|(h, v)| non_blank(v).map(|v| (h.as_str(), v)))
    }

    pub fn value(&self, column: &str) -> Option<&str> {
        self.cells
            .iter()
            .find(|(h, _)| h == column)
            .and_then(|(_, v)| non_blank(v))
    }
}

/// Read a CSV table with a header row, keyed on `key_column`.
///
/// Rows whose key cell is blank are skipped with a warning. Row order is
/// preserved and duplicate keys are returned as-is.
pub fn read_keyed_rows<R: Read>(reader: R, key_column: &str) -> Result<Vec<KeyedRow>, FormatError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    let key_idx = headers
        .iter()
        .position(|h| h == key_column)
        .ok_or_else(|| FormatError::MissingColumn {
            column: key_column.to_string(),
        })?;

    let mut rows = Vec::new();
    for (line, record) in rdr.records().enumerate() {
        let record = record?;
        let Some(key) = record.get(key_idx).and_then(non_blank) else {
            tracing::warn!(row = line + 1, column = key_column, "skipping row with blank key");
            continue;
        };
        let cells = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != key_idx)
            .map(|(i, h)| (h.clone(), record.get(i).unwrap_or_default().to_string()))
            .collect();
        rows.push(KeyedRow {
            key: key.to_string(),
            cells,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_rows_in_order() {
        let csv = "bloomberg_ticker,country\nMSFT US,US\nAAPL US,\n";
        let rows = read_keyed_rows(csv.as_bytes(), "bloomberg_ticker").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key, "MSFT US");
        assert_eq!(rows[0].value("country"), Some("US"));
        assert_eq!(rows[1].value("country"), None);
        assert_eq!(rows[1].values().count(), 0);
    }

    #[test]
    fn missing_key_column_is_an_error() {
        let csv = "ticker,country\nMSFT,US\n";
        let err = read_keyed_rows(csv.as_bytes(), "bloomberg_ticker").unwrap_err();
        assert!(matches!(err, FormatError::MissingColumn { .. }));
    }

    #[test]
    fn blank_keys_are_skipped() {
        let csv = "bloomberg_ticker,country\n,US\nAAPL US,US\n";
        let rows = read_keyed_rows(csv.as_bytes(), "bloomberg_ticker").unwrap();
        assert_eq!(rows.len(), 1);
    }
}
