use super::field::{non_blank, Field};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One security, identified by its Bloomberg ticker.
///
/// Every attribute is nullable and independently fillable. Columns the
/// engine does not know about are carried through untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TickerRecord {
    pub bloomberg_ticker: String,
    pub legacy_ticker: Option<String>,
    pub eodhd_ticker: Option<String>,
    pub country: Option<String>,
    pub polygon_ticker: Option<String>,
    pub isin: Option<String>,
    pub industry: Option<String>,
    pub sector: Option<String>,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl TickerRecord {
    /// Empty record for a Bloomberg ticker.
    pub fn new(bloomberg_ticker: impl Into<String>) -> Self {
        Self {
            bloomberg_ticker: bloomberg_ticker.into(),
            ..Self::default()
        }
    }

    /// Builder-style setter, mostly for tests and fixtures.
    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(&field, Some(value.into()));
        self
    }

    pub fn get(&self, field: &Field) -> Option<&str> {
        match field {
            Field::LegacyTicker => self.legacy_ticker.as_deref(),
            Field::EodhdTicker => self.eodhd_ticker.as_deref(),
            Field::Country => self.country.as_deref(),
            Field::PolygonTicker => self.polygon_ticker.as_deref(),
            Field::Isin => self.isin.as_deref(),
            Field::Industry => self.industry.as_deref(),
            Field::Sector => self.sector.as_deref(),
            Field::Extra(name) => self.extra.get(name).map(|s| s.as_str()),
        }
    }

    pub fn is_null(&self, field: &Field) -> bool {
        self.get(field).is_none()
    }

    /// Write `value` into `field` only if the cell is currently null.
    ///
    /// Returns `true` when the cell was written. Blank values never count as
    /// a value and leave the cell null.
    pub fn fill(&mut self, field: &Field, value: &str) -> bool {
        let Some(value) = non_blank(value) else {
            return false;
        };
        if !self.is_null(field) {
            return false;
        }
        self.set(field, Some(value.to_string()));
        true
    }

    /// Unconditional write. Only used while constructing records.
    fn set(&mut self, field: &Field, value: Option<String>) {
        let value = value.and_then(|v| non_blank(&v).map(str::to_string));
        match field {
            Field::LegacyTicker => self.legacy_ticker = value,
            Field::EodhdTicker => self.eodhd_ticker = value,
            Field::Country => self.country = value,
            Field::PolygonTicker => self.polygon_ticker = value,
            Field::Isin => self.isin = value,
            Field::Industry => self.industry = value,
            Field::Sector => self.sector = value,
            Field::Extra(name) => match value {
                Some(v) => {
                    self.extra.insert(name.clone(), v);
                }
                None => {
                    self.extra.remove(name);
                }
            },
        }
    }

    /// True when any of `fields` is null.
    pub fn missing_any(&self, fields: &[Field]) -> bool {
        fields.iter().any(|f| self.is_null(f))
    }
}
