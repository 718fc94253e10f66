//! Outer merge with fill-if-missing.
//!
//! This is the only write path for attribute values. Onboarding and every
//! enrichment pass are a [`TickerMap::merge_fill`] with a different candidate.

use crate::domain::{Candidate, Field, KeyScheme, TickerMap, TickerRecord};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("candidate keyed by {candidate} cannot merge into a map keyed by {map}")]
    SchemeMismatch { map: KeyScheme, candidate: KeyScheme },
}

/// What a merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Keys added by the outer join.
    pub inserted: Vec<String>,
    /// Cells written per field.
    pub filled: BTreeMap<Field, usize>,
    /// Candidate keys with no record that could not be inserted (non-primary scheme).
    pub unmatched: Vec<String>,
}

impl MergeReport {
    pub fn cells_filled(&self) -> usize {
        self.filled.values().sum()
    }

    /// True when the map was left untouched.
    pub fn is_noop(&self) -> bool {
        self.inserted.is_empty() && self.filled.is_empty()
    }

    pub fn absorb(&mut self, other: MergeReport) {
        self.inserted.extend(other.inserted);
        for (field, n) in other.filled {
            *self.filled.entry(field).or_default() += n;
        }
        self.unmatched.extend(other.unmatched);
    }
}

impl TickerMap {
    /// Outer-join `candidate` into the map and fill null cells from it.
    ///
    /// - Every key already in the map is still present afterwards.
    /// - Candidate-only keys become new records when the map is keyed by
    ///   Bloomberg ticker; under any other scheme they are reported as
    ///   unmatched, since a record cannot exist without its primary key.
    /// - A non-null cell is never modified, and the active key column is
    ///   never written.
    pub fn merge_fill(&mut self, candidate: &Candidate) -> Result<MergeReport, MergeError> {
        if candidate.scheme() != self.scheme {
            return Err(MergeError::SchemeMismatch {
                map: self.scheme,
                candidate: candidate.scheme(),
            });
        }

        let key_field = self.scheme.key_field();
        let mut report = MergeReport::default();

        for (key, cells) in candidate.iter() {
            if !self.records.contains_key(key) {
                match self.scheme {
                    KeyScheme::Bloomberg => {
                        self.records.insert(key.clone(), TickerRecord::new(key.clone()));
                        report.inserted.push(key.clone());
                    }
                    KeyScheme::Eodhd => {
                        report.unmatched.push(key.clone());
                        continue;
                    }
                }
            }
            let Some(record) = self.records.get_mut(key) else {
                continue;
            };

            for (field, value) in cells {
                if key_field.as_ref() == Some(field) {
                    continue;
                }
                if record.fill(field, value) {
                    *report.filled.entry(field.clone()).or_default() += 1;
                }
            }
        }

        if !report.unmatched.is_empty() {
            tracing::debug!(
                scheme = %self.scheme,
                count = report.unmatched.len(),
                "candidate keys without a record were skipped"
            );
        }
        Ok(report)
    }
}
