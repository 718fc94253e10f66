//! CSV-backed reference data: vendor mapping tables and per-key lookups.

use super::provider::{AttributeLookup, MappingBuilder, ProviderError};
use crate::domain::table::read_keyed_rows;
use crate::domain::{Candidate, Field, KeyScheme, BLOOMBERG_TICKER};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

fn open(path: &Path) -> Result<BufReader<File>, ProviderError> {
    Ok(BufReader::new(File::open(path)?))
}

/// Vendor mapping tables, merged in the order given.
///
/// Each table is a CSV keyed by `bloomberg_ticker`; its other columns are
/// mapped through [`Field::from_column`]. When two tables disagree the
/// earlier one wins, matching fill-if-missing downstream.
pub struct CsvMappingBuilder {
    paths: Vec<PathBuf>,
}

impl CsvMappingBuilder {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl MappingBuilder for CsvMappingBuilder {
    fn build_map(&self) -> Result<Candidate, ProviderError> {
        let mut candidate = Candidate::new(KeyScheme::Bloomberg);
        for path in &self.paths {
            let rows = read_keyed_rows(open(path)?, BLOOMBERG_TICKER)?;
            tracing::debug!(path = %path.display(), rows = rows.len(), "loaded vendor mapping table");
            for row in &rows {
                for (column, value) in row.values() {
                    if let Some(field) = Field::from_column(column) {
                        candidate.insert(&row.key, field, value);
                    }
                }
            }
        }
        Ok(candidate)
    }
}

/// One attribute per Bloomberg ticker, read from a CSV table.
///
/// The table is loaded once at construction; lookups are in-memory.
#[derive(Debug, Clone)]
pub struct ReferenceTable {
    name: String,
    values: BTreeMap<String, String>,
}

impl ReferenceTable {
    /// Load `value_column` keyed by `bloomberg_ticker` from `path`.
    pub fn from_csv(path: &Path, value_column: &str) -> Result<Self, ProviderError> {
        let rows = read_keyed_rows(open(path)?, BLOOMBERG_TICKER)?;
        if rows.first().is_some_and(|r| !r.cells.iter().any(|(h, _)| h == value_column)) {
            return Err(crate::domain::FormatError::MissingColumn {
                column: value_column.to_string(),
            }
            .into());
        }
        let mut values = BTreeMap::new();
        for row in rows {
            if let Some(v) = row.value(value_column) {
                values.entry(row.key.clone()).or_insert_with(|| v.to_string());
            }
        }
        Ok(Self {
            name: value_column.to_string(),
            values,
        })
    }

    pub fn from_pairs<I, K, V>(name: &str, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            name: name.to_string(),
            values: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl AttributeLookup for ReferenceTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookup(&self, bloomberg_ticker: &str) -> Result<Option<String>, ProviderError> {
        Ok(self.values.get(bloomberg_ticker).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, body: &str) -> PathBuf {
        let p = dir.join(name);
        std::fs::write(&p, body).unwrap();
        p
    }

    #[test]
    fn builder_merges_tables_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        let a = write(dir.path(), "a.csv", "bloomberg_ticker,ticker,country\nAAPL US,AAPL,\n");
        let b = write(
            dir.path(),
            "b.csv",
            "bloomberg_ticker,ticker,country\nAAPL US,AAPL.X,US\nOLD US,OLD,US\n",
        );

        let c = CsvMappingBuilder::new(vec![a, b]).build_map().unwrap();

        let aapl = c.get("AAPL US").unwrap();
        assert_eq!(aapl.get(&Field::LegacyTicker).map(String::as_str), Some("AAPL"));
        assert_eq!(aapl.get(&Field::Country).map(String::as_str), Some("US"));
        assert!(c.get("OLD US").is_some());
    }

    #[test]
    fn reference_table_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "country.csv", "bloomberg_ticker,country\nAAPL US,US\nVOD LN,\n");
        let t = ReferenceTable::from_csv(&p, "country").unwrap();
        assert_eq!(t.lookup("AAPL US").unwrap().as_deref(), Some("US"));
        assert_eq!(t.lookup("VOD LN").unwrap(), None);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn reference_table_requires_value_column() {
        let dir = tempfile::tempdir().unwrap();
        let p = write(dir.path(), "x.csv", "bloomberg_ticker,sector\nAAPL US,IT\n");
        assert!(ReferenceTable::from_csv(&p, "country").is_err());
    }
}
