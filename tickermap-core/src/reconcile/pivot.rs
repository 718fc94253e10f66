//! Identifier scheme pivot.
//!
//! EODHD addresses instruments by its own symbol, so the map is re-keyed by
//! `eodhd_ticker` before EODHD lookups and back by `bloomberg_ticker` before
//! it is persisted. Records themselves are moved, never rebuilt, which keeps
//! the round trip lossless.

use crate::domain::{KeyScheme, TickerMap, TickerRecord};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PivotError {
    #[error("cannot key '{bloomberg_ticker}' by {scheme}: value is null")]
    MissingKey {
        bloomberg_ticker: String,
        scheme: KeyScheme,
    },

    #[error("cannot key by {scheme}: '{key}' is shared by '{first}' and '{second}'")]
    DuplicateKey {
        scheme: KeyScheme,
        key: String,
        first: String,
        second: String,
    },
}

impl TickerMap {
    /// Re-key the map by `target`.
    ///
    /// Fails without partial results when any record lacks a `target` key or
    /// two records share one.
    pub fn pivot(self, target: KeyScheme) -> Result<TickerMap, PivotError> {
        self.rekey(target, None)
    }

    /// Re-key the map by `target`, setting aside records with a null
    /// `target` key instead of failing on them.
    ///
    /// The set-aside records come back in Bloomberg order and can be returned
    /// with [`TickerMap::reattach`]. A key shared by two records is still an
    /// error.
    pub fn pivot_partial(
        self,
        target: KeyScheme,
    ) -> Result<(TickerMap, Vec<TickerRecord>), PivotError> {
        let mut unkeyed = Vec::new();
        let map = self.rekey(target, Some(&mut unkeyed))?;
        unkeyed.sort_by(|a, b| a.bloomberg_ticker.cmp(&b.bloomberg_ticker));
        Ok((map, unkeyed))
    }

    /// Insert records under their key in the active scheme.
    pub fn reattach(&mut self, records: Vec<TickerRecord>) -> Result<(), PivotError> {
        let scheme = self.scheme;
        for record in records {
            let key = key_in(scheme, &record)?;
            if let Some(existing) = self.records.get(&key) {
                return Err(PivotError::DuplicateKey {
                    scheme,
                    key,
                    first: existing.bloomberg_ticker.clone(),
                    second: record.bloomberg_ticker,
                });
            }
            self.records.insert(key, record);
        }
        Ok(())
    }

    fn rekey(
        self,
        target: KeyScheme,
        mut unkeyed: Option<&mut Vec<TickerRecord>>,
    ) -> Result<TickerMap, PivotError> {
        if self.scheme == target {
            return Ok(self);
        }

        let from = self.scheme;
        let mut records: BTreeMap<String, TickerRecord> = BTreeMap::new();
        for record in self.records.into_values() {
            let key = match (key_in(target, &record), unkeyed.as_deref_mut()) {
                (Ok(key), _) => key,
                (Err(PivotError::MissingKey { .. }), Some(aside)) => {
                    aside.push(record);
                    continue;
                }
                (Err(e), _) => return Err(e),
            };
            if let Some(existing) = records.get(&key) {
                return Err(PivotError::DuplicateKey {
                    scheme: target,
                    key,
                    first: existing.bloomberg_ticker.clone(),
                    second: record.bloomberg_ticker,
                });
            }
            records.insert(key, record);
        }

        tracing::debug!(from = %from, to = %target, records = records.len(), "pivoted ticker map");
        Ok(TickerMap {
            scheme: target,
            records,
        })
    }
}

fn key_in(scheme: KeyScheme, record: &TickerRecord) -> Result<String, PivotError> {
    scheme
        .key_of(record)
        .map(str::to_string)
        .ok_or_else(|| PivotError::MissingKey {
            bloomberg_ticker: record.bloomberg_ticker.clone(),
            scheme,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Field;

    fn map() -> TickerMap {
        TickerMap::from_records([
            TickerRecord::new("AAPL US")
                .with(Field::LegacyTicker, "AAPL")
                .with(Field::EodhdTicker, "AAPL.US")
                .with(Field::Country, "US"),
            TickerRecord::new("7203 JP")
                .with(Field::LegacyTicker, "7203.T")
                .with(Field::EodhdTicker, "7203.TSE"),
        ])
        .unwrap()
    }

    #[test]
    fn forward_pivot_rekeys() {
        let pivoted = map().pivot(KeyScheme::Eodhd).unwrap();
        assert_eq!(pivoted.scheme(), KeyScheme::Eodhd);
        let keys: Vec<&str> = pivoted.keys().collect();
        assert_eq!(keys, vec!["7203.TSE", "AAPL.US"]);
        assert_eq!(
            pivoted.get("AAPL.US").unwrap().bloomberg_ticker,
            "AAPL US"
        );
    }

    #[test]
    fn round_trip_is_identity() {
        let original = map();
        let back = original
            .clone()
            .pivot(KeyScheme::Eodhd)
            .unwrap()
            .pivot(KeyScheme::Bloomberg)
            .unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn null_eodhd_ticker_is_fatal() {
        let mut m = map();
        m.insert(TickerRecord::new("NEW US")).unwrap();
        let err = m.pivot(KeyScheme::Eodhd).unwrap_err();
        assert_eq!(
            err,
            PivotError::MissingKey {
                bloomberg_ticker: "NEW US".into(),
                scheme: KeyScheme::Eodhd
            }
        );
    }

    #[test]
    fn shared_eodhd_ticker_is_fatal() {
        let mut m = map();
        m.insert(TickerRecord::new("AAPL UW").with(Field::EodhdTicker, "AAPL.US"))
            .unwrap();
        let err = m.pivot(KeyScheme::Eodhd).unwrap_err();
        assert!(matches!(err, PivotError::DuplicateKey { key, .. } if key == "AAPL.US"));
    }

    #[test]
    fn partial_pivot_sets_aside_unkeyed_records() {
        let mut m = map();
        m.insert(TickerRecord::new("NEW US").with(Field::Country, "US"))
            .unwrap();
        let original = m.clone();

        let (pivoted, aside) = m.pivot_partial(KeyScheme::Eodhd).unwrap();
        assert_eq!(pivoted.len(), 2);
        assert_eq!(aside.len(), 1);
        assert_eq!(aside[0].bloomberg_ticker, "NEW US");

        let mut back = pivoted.pivot(KeyScheme::Bloomberg).unwrap();
        back.reattach(aside).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn partial_pivot_still_rejects_shared_keys() {
        let mut m = map();
        m.insert(TickerRecord::new("AAPL UW").with(Field::EodhdTicker, "AAPL.US"))
            .unwrap();
        let err = m.pivot_partial(KeyScheme::Eodhd).unwrap_err();
        assert!(matches!(err, PivotError::DuplicateKey { .. }));
    }

    #[test]
    fn reattach_rejects_existing_key() {
        let mut m = map();
        let err = m.reattach(vec![TickerRecord::new("AAPL US")]).unwrap_err();
        assert!(matches!(err, PivotError::DuplicateKey { key, .. } if key == "AAPL US"));
    }

    #[test]
    fn pivot_to_same_scheme_is_noop() {
        let m = map();
        assert_eq!(m.clone().pivot(KeyScheme::Bloomberg).unwrap(), m);
    }
}
