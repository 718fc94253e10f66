//! The keyed collection of ticker records.
//!
//! A `TickerMap` is keyed by one identifier scheme at a time. It is normally
//! keyed by Bloomberg ticker; it is temporarily re-keyed by EODHD ticker
//! (see [`TickerMap::pivot`]) while EODHD-addressed lookups run.

use super::eodhd_symbol::EodhdSymbolRule;
use super::field::{Field, BLOOMBERG_TICKER};
use super::fingerprint::MapFingerprint;
use super::record::TickerRecord;
use super::table::{read_keyed_rows, FormatError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::io::{Read, Write};

/// Which identifier a map (or candidate) is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyScheme {
    Bloomberg,
    Eodhd,
}

impl KeyScheme {
    /// The record field that serves as the key, `None` for the primary key.
    pub fn key_field(&self) -> Option<Field> {
        match self {
            KeyScheme::Bloomberg => None,
            KeyScheme::Eodhd => Some(Field::EodhdTicker),
        }
    }

    pub fn key_of<'a>(&self, record: &'a TickerRecord) -> Option<&'a str> {
        match self {
            KeyScheme::Bloomberg => Some(record.bloomberg_ticker.as_str()),
            KeyScheme::Eodhd => record.eodhd_ticker.as_deref(),
        }
    }
}

impl fmt::Display for KeyScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyScheme::Bloomberg => f.write_str("bloomberg_ticker"),
            KeyScheme::Eodhd => f.write_str("eodhd_ticker"),
        }
    }
}

/// Ticker records keyed by the active [`KeyScheme`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickerMap {
    pub(crate) scheme: KeyScheme,
    pub(crate) records: BTreeMap<String, TickerRecord>,
}

impl Default for TickerMap {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of [`TickerMap::derive_eodhd_tickers`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EodhdDerivation {
    /// Records that gained an EODHD ticker.
    pub derived: usize,
    /// Symbols left unassigned, with the Bloomberg tickers that wanted them.
    pub conflicts: BTreeMap<String, Vec<String>>,
}

impl EodhdDerivation {
    pub fn skipped(&self) -> usize {
        self.conflicts.values().map(Vec::len).sum()
    }
}

impl TickerMap {
    /// Empty Bloomberg-keyed map.
    pub fn new() -> Self {
        Self {
            scheme: KeyScheme::Bloomberg,
            records: BTreeMap::new(),
        }
    }

    /// Build a Bloomberg-keyed map, rejecting duplicate keys.
    pub fn from_records(
        records: impl IntoIterator<Item = TickerRecord>,
    ) -> Result<Self, FormatError> {
        let mut map = Self::new();
        for record in records {
            map.insert(record)?;
        }
        Ok(map)
    }

    /// Insert a record under its key in the active scheme.
    pub fn insert(&mut self, record: TickerRecord) -> Result<(), FormatError> {
        let key = self
            .scheme
            .key_of(&record)
            .ok_or_else(|| FormatError::MissingKey {
                bloomberg_ticker: record.bloomberg_ticker.clone(),
                scheme: self.scheme.to_string(),
            })?
            .to_string();
        if self.records.contains_key(&key) {
            return Err(FormatError::DuplicateKey { key });
        }
        self.records.insert(key, record);
        Ok(())
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    pub fn get(&self, key: &str) -> Option<&TickerRecord> {
        self.records.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Keys in the active scheme, sorted.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(|k| k.as_str())
    }

    pub fn records(&self) -> impl Iterator<Item = &TickerRecord> {
        self.records.values()
    }

    /// Bloomberg tickers of every record, whatever the active scheme.
    pub fn bloomberg_tickers(&self) -> BTreeSet<String> {
        self.records
            .values()
            .map(|r| r.bloomberg_ticker.clone())
            .collect()
    }

    /// Keys (active scheme) of records where any of `fields` is null.
    pub fn keys_missing_any(&self, fields: &[Field]) -> Vec<String> {
        self.records
            .iter()
            .filter(|(_, r)| r.missing_any(fields))
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Fill a null `eodhd_ticker` from the legacy ticker of each record.
    ///
    /// A symbol is only assigned when no other record holds it and no other
    /// record derives it in the same call; the EODHD key must stay unique.
    /// Records left out that way are listed in the report.
    pub fn derive_eodhd_tickers(&mut self, rule: &EodhdSymbolRule) -> EodhdDerivation {
        let held: BTreeSet<String> = self
            .records
            .values()
            .filter_map(|r| r.eodhd_ticker.clone())
            .collect();

        let mut proposals: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (key, record) in &self.records {
            if record.eodhd_ticker.is_some() {
                continue;
            }
            if let Some(symbol) = record.legacy_ticker.as_deref().and_then(|t| rule.derive(t)) {
                proposals.entry(symbol).or_default().push(key.clone());
            }
        }

        let mut report = EodhdDerivation::default();
        for (symbol, keys) in proposals {
            if keys.len() > 1 || held.contains(&symbol) {
                tracing::warn!(
                    symbol = %symbol,
                    records = ?keys,
                    "eodhd symbol already taken; not derived"
                );
                let bloomberg = keys
                    .iter()
                    .filter_map(|k| self.records.get(k))
                    .map(|r| r.bloomberg_ticker.clone())
                    .collect();
                report.conflicts.insert(symbol, bloomberg);
                continue;
            }
            for key in keys {
                if let Some(record) = self.records.get_mut(&key) {
                    if record.fill(&Field::EodhdTicker, &symbol) {
                        report.derived += 1;
                    }
                }
            }
        }
        report
    }

    /// Content fingerprint, independent of the active key scheme.
    pub fn fingerprint(&self) -> MapFingerprint {
        let mut sorted: Vec<&TickerRecord> = self.records.values().collect();
        sorted.sort_by(|a, b| a.bloomberg_ticker.cmp(&b.bloomberg_ticker));
        MapFingerprint::of_records(sorted)
    }

    /// Every extra column present in any record, sorted.
    pub fn extra_columns(&self) -> BTreeSet<String> {
        self.records
            .values()
            .flat_map(|r| r.extra.keys().cloned())
            .collect()
    }

    /// Read a Bloomberg-keyed map from CSV. Unknown columns become extras.
    pub fn read_csv<R: Read>(reader: R) -> Result<Self, FormatError> {
        let rows = read_keyed_rows(reader, BLOOMBERG_TICKER)?;
        let mut map = Self::new();
        for row in rows {
            let mut record = TickerRecord::new(row.key);
            for (column, value) in row.cells {
                if let Some(field) = Field::from_column(&column) {
                    record.fill(&field, &value);
                }
            }
            map.insert(record)?;
        }
        Ok(map)
    }

    /// Write the map as CSV, sorted by Bloomberg ticker.
    ///
    /// Columns: `bloomberg_ticker`, the known fields (legacy ticker as
    /// `ticker`), then extras sorted by name. Null cells are written empty.
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<(), FormatError> {
        let extras: Vec<Field> = self.extra_columns().into_iter().map(Field::Extra).collect();
        let columns: Vec<Field> = Field::KNOWN.iter().cloned().chain(extras).collect();

        let mut wtr = csv::Writer::from_writer(writer);
        let mut header = vec![BLOOMBERG_TICKER.to_string()];
        header.extend(columns.iter().map(|c| c.persisted_column().to_string()));
        wtr.write_record(&header)?;

        let mut sorted: Vec<&TickerRecord> = self.records.values().collect();
        sorted.sort_by(|a, b| a.bloomberg_ticker.cmp(&b.bloomberg_ticker));
        for record in sorted {
            let mut row = vec![record.bloomberg_ticker.as_str()];
            row.extend(columns.iter().map(|c| record.get(c).unwrap_or_default()));
            wtr.write_record(&row)?;
        }
        wtr.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> TickerMap {
        TickerMap::from_records([
            TickerRecord::new("AAPL US")
                .with(Field::LegacyTicker, "AAPL")
                .with(Field::Country, "US"),
            TickerRecord::new("7203 JP")
                .with(Field::LegacyTicker, "7203.T")
                .with(Field::Extra("date_added".into()), "2020-01-01"),
        ])
        .unwrap()
    }

    #[test]
    fn duplicate_bloomberg_key_rejected() {
        let err = TickerMap::from_records([TickerRecord::new("A US"), TickerRecord::new("A US")])
            .unwrap_err();
        assert!(matches!(err, FormatError::DuplicateKey { key } if key == "A US"));
    }

    #[test]
    fn csv_roundtrip_keeps_extras() {
        let map = sample();
        let mut buf = Vec::new();
        map.write_csv(&mut buf).unwrap();
        let text = String::from_utf8(buf.clone()).unwrap();
        assert!(text.starts_with("bloomberg_ticker,ticker,eodhd_ticker,country"));
        assert!(text.contains("date_added"));

        let back = TickerMap::read_csv(buf.as_slice()).unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn reads_ticker_alias_column() {
        let csv = "bloomberg_ticker,ticker,country\nAAPL US,AAPL,\n";
        let map = TickerMap::read_csv(csv.as_bytes()).unwrap();
        let rec = map.get("AAPL US").unwrap();
        assert_eq!(rec.legacy_ticker.as_deref(), Some("AAPL"));
        assert!(rec.country.is_none());
    }

    #[test]
    fn keys_missing_any_selects_partial_records() {
        let map = sample();
        let keys = map.keys_missing_any(&[Field::Country]);
        assert_eq!(keys, vec!["7203 JP".to_string()]);
    }

    #[test]
    fn derive_eodhd_fills_only_nulls() {
        let mut map = sample();
        let report = map.derive_eodhd_tickers(&EodhdSymbolRule::default());
        assert_eq!(report.derived, 2);
        assert!(report.conflicts.is_empty());
        assert_eq!(map.get("AAPL US").unwrap().eodhd_ticker.as_deref(), Some("AAPL.US"));
        assert_eq!(map.get("7203 JP").unwrap().eodhd_ticker.as_deref(), Some("7203.TSE"));
        assert_eq!(map.derive_eodhd_tickers(&EodhdSymbolRule::default()).derived, 0);
    }

    #[test]
    fn derive_skips_symbol_held_by_another_record() {
        let mut map = TickerMap::from_records([
            TickerRecord::new("AAPL US")
                .with(Field::LegacyTicker, "AAPL")
                .with(Field::EodhdTicker, "AAPL.US"),
            TickerRecord::new("AAPL UW").with(Field::LegacyTicker, "AAPL"),
        ])
        .unwrap();

        let report = map.derive_eodhd_tickers(&EodhdSymbolRule::default());

        assert_eq!(report.derived, 0);
        assert_eq!(report.conflicts["AAPL.US"], vec!["AAPL UW".to_string()]);
        assert_eq!(map.get("AAPL UW").unwrap().eodhd_ticker, None);
        assert!(map.pivot(KeyScheme::Eodhd).is_err());
    }

    #[test]
    fn derive_skips_symbol_wanted_twice_in_one_call() {
        let mut map = TickerMap::from_records([
            TickerRecord::new("MSFT US").with(Field::LegacyTicker, "MSFT"),
            TickerRecord::new("MSFT OLD").with(Field::LegacyTicker, "MSFT"),
            TickerRecord::new("VOD LN").with(Field::LegacyTicker, "VOD.L"),
        ])
        .unwrap();

        let report = map.derive_eodhd_tickers(&EodhdSymbolRule::default());

        assert_eq!(report.derived, 1);
        assert_eq!(report.skipped(), 2);
        assert_eq!(
            report.conflicts["MSFT.US"],
            vec!["MSFT OLD".to_string(), "MSFT US".to_string()]
        );
        assert_eq!(map.get("MSFT US").unwrap().eodhd_ticker, None);
        assert_eq!(map.get("VOD LN").unwrap().eodhd_ticker.as_deref(), Some("VOD.LSE"));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = sample();
        let mut b = sample();
        assert_eq!(a.fingerprint(), b.fingerprint());
        b.records.get_mut("AAPL US").unwrap().fill(&Field::Sector, "Technology");
        assert_ne!(a.fingerprint(), b.fingerprint());
    }
}
