//! Universe snapshot: the latest published list of eligible securities.

use super::candidate::Candidate;
use super::field::{Field, BLOOMBERG_TICKER};
use super::table::{read_keyed_rows, FormatError, KeyedRow};
use super::ticker_map::KeyScheme;
use std::collections::BTreeSet;
use std::io::Read;

/// Universe rows in source order.
///
/// Duplicated keys are kept so the export reflects the source verbatim; the
/// diffing side only ever looks at [`UniverseSnapshot::keys`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseSnapshot {
    rows: Vec<KeyedRow>,
}

impl UniverseSnapshot {
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FormatError> {
        let rows = read_keyed_rows(reader, BLOOMBERG_TICKER)?;
        Ok(Self { rows })
    }

    pub fn from_csv_str(text: &str) -> Result<Self, FormatError> {
        Self::from_csv_reader(text.as_bytes())
    }

    /// Snapshot with no metadata columns.
    pub fn from_tickers<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let rows = tickers
            .into_iter()
            .map(|t| KeyedRow {
                key: t.into(),
                cells: Vec::new(),
            })
            .collect();
        Self { rows }
    }

    /// Bloomberg tickers in source order, duplicates included.
    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.key.as_str())
    }

    /// Distinct Bloomberg tickers.
    pub fn keys(&self) -> BTreeSet<String> {
        self.rows.iter().map(|r| r.key.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Bloomberg-keyed candidate built from the rows whose key is in
    /// `include`. Every included key is registered even without metadata,
    /// so an outer merge creates its record.
    pub fn to_candidate(&self, include: &BTreeSet<String>) -> Candidate {
        let mut candidate = Candidate::new(KeyScheme::Bloomberg);
        for row in self.rows.iter().filter(|r| include.contains(&r.key)) {
            candidate.insert_key(&row.key);
            for (column, value) in row.values() {
                if let Some(field) = Field::from_column(column) {
                    candidate.insert(&row.key, field, value);
                }
            }
        }
        candidate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "bloomberg_ticker,ticker,signals_universe\n\
                       AAPL US,AAPL,1\n\
                       MSFT US,MSFT,1\n\
                       AAPL US,AAPL,1\n";

    #[test]
    fn keeps_source_order_and_duplicates() {
        let snap = UniverseSnapshot::from_csv_str(CSV).unwrap();
        let tickers: Vec<&str> = snap.tickers().collect();
        assert_eq!(tickers, vec!["AAPL US", "MSFT US", "AAPL US"]);
        assert_eq!(snap.keys().len(), 2);
    }

    #[test]
    fn candidate_filters_and_maps_columns() {
        let snap = UniverseSnapshot::from_csv_str(CSV).unwrap();
        let include: BTreeSet<String> = ["MSFT US".to_string()].into();
        let c = snap.to_candidate(&include);
        assert_eq!(c.len(), 1);
        let row = c.get("MSFT US").unwrap();
        assert_eq!(row.get(&Field::LegacyTicker).map(String::as_str), Some("MSFT"));
        assert_eq!(
            row.get(&Field::Extra("signals_universe".into())).map(String::as_str),
            Some("1")
        );
    }

    #[test]
    fn requires_bloomberg_column() {
        assert!(UniverseSnapshot::from_csv_str("ticker\nAAPL\n").is_err());
    }
}
