use super::field::{non_blank, Field};
use super::ticker_map::KeyScheme;
use std::collections::BTreeMap;

/// Sparse partial records proposed for a merge, keyed in one [`KeyScheme`].
///
/// Only non-blank values are stored, so a provider that answers with an
/// empty string for a key contributes nothing to the fill.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    scheme: KeyScheme,
    rows: BTreeMap<String, BTreeMap<Field, String>>,
}

impl Candidate {
    pub fn new(scheme: KeyScheme) -> Self {
        Self {
            scheme,
            rows: BTreeMap::new(),
        }
    }

    pub fn scheme(&self) -> KeyScheme {
        self.scheme
    }

    /// Record a value for `key`. Blank keys and blank values are dropped.
    ///
    /// A key seen twice keeps its first value for a field.
    pub fn insert(&mut self, key: &str, field: Field, value: &str) {
        let (Some(key), Some(value)) = (non_blank(key), non_blank(value)) else {
            return;
        };
        self.rows
            .entry(key.to_string())
            .or_default()
            .entry(field)
            .or_insert_with(|| value.to_string());
    }

    /// Register a key with no values (it still takes part in the outer join).
    pub fn insert_key(&mut self, key: &str) {
        if let Some(key) = non_blank(key) {
            self.rows.entry(key.to_string()).or_default();
        }
    }

    pub fn get(&self, key: &str) -> Option<&BTreeMap<Field, String>> {
        self.rows.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeMap<Field, String>)> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total number of non-null cells carried.
    pub fn cell_count(&self) -> usize {
        self.rows.values().map(|r| r.len()).sum()
    }
}
