use serde::{Deserialize, Serialize};
use std::fmt;

/// Column name of the primary key. Never a fillable [`Field`].
pub const BLOOMBERG_TICKER: &str = "bloomberg_ticker";

/// A fillable column of a ticker record.
///
/// Known attribute columns get their own variant; anything else carried over
/// from a universe snapshot or vendor table is an opaque `Extra` column.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Field {
    LegacyTicker,
    EodhdTicker,
    Country,
    PolygonTicker,
    Isin,
    Industry,
    Sector,
    Extra(String),
}

impl Field {
    /// Known columns in persisted order.
    pub const KNOWN: [Field; 7] = [
        Field::LegacyTicker,
        Field::EodhdTicker,
        Field::Country,
        Field::PolygonTicker,
        Field::Isin,
        Field::Industry,
        Field::Sector,
    ];

    /// Map a column header to a field. Returns `None` for `bloomberg_ticker`.
    ///
    /// `ticker` is accepted as an alias of `legacy_ticker`; it is the header
    /// the persisted map and the vendor mapping tables use.
    pub fn from_column(name: &str) -> Option<Field> {
        let field = match name.trim() {
            BLOOMBERG_TICKER => return None,
            "legacy_ticker" | "ticker" => Field::LegacyTicker,
            "eodhd_ticker" => Field::EodhdTicker,
            "country" => Field::Country,
            "polygon_ticker" => Field::PolygonTicker,
            "isin" => Field::Isin,
            "industry" => Field::Industry,
            "sector" => Field::Sector,
            other => Field::Extra(other.to_string()),
        };
        Some(field)
    }

    /// Canonical column header.
    pub fn column(&self) -> &str {
        match self {
            Field::LegacyTicker => "legacy_ticker",
            Field::EodhdTicker => "eodhd_ticker",
            Field::Country => "country",
            Field::PolygonTicker => "polygon_ticker",
            Field::Isin => "isin",
            Field::Industry => "industry",
            Field::Sector => "sector",
            Field::Extra(name) => name,
        }
    }
}

impl Field {
    /// Header written when the map is persisted. The legacy ticker keeps the
    /// `ticker` name other readers of the mapping file expect.
    pub fn persisted_column(&self) -> &str {
        match self {
            Field::LegacyTicker => "ticker",
            other => other.column(),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

/// Normalize a raw cell: blank or whitespace-only values are null.
pub fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticker_alias_maps_to_legacy() {
        assert_eq!(Field::from_column("ticker"), Some(Field::LegacyTicker));
        assert_eq!(Field::from_column("legacy_ticker"), Some(Field::LegacyTicker));
    }

    #[test]
    fn primary_key_is_not_a_field() {
        assert_eq!(Field::from_column("bloomberg_ticker"), None);
    }

    #[test]
    fn unknown_columns_pass_through() {
        assert_eq!(
            Field::from_column("date_added"),
            Some(Field::Extra("date_added".into()))
        );
        assert_eq!(Field::Extra("date_added".into()).column(), "date_added");
        assert_eq!(Field::LegacyTicker.persisted_column(), "ticker");
        assert_eq!(Field::Isin.persisted_column(), "isin");
    }

    #[test]
    fn blank_cells_are_null() {
        assert_eq!(non_blank("  "), None);
        assert_eq!(non_blank(""), None);
        assert_eq!(non_blank(" US "), Some("US"));
    }
}
