//! Duplicate legacy-ticker detection.

use crate::domain::TickerMap;
use std::collections::{BTreeMap, BTreeSet};

/// Legacy tickers shared by more than one record, with the Bloomberg
/// tickers sharing each. Null legacy tickers are not identifiers and are
/// never grouped.
pub fn duplicate_groups(map: &TickerMap) -> BTreeMap<String, BTreeSet<String>> {
    let mut by_legacy: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for record in map.records() {
        if let Some(legacy) = record.legacy_ticker.as_deref() {
            by_legacy
                .entry(legacy.to_string())
                .or_default()
                .insert(record.bloomberg_ticker.clone());
        }
    }
    by_legacy.retain(|_, keys| keys.len() > 1);
    by_legacy
}

/// Bloomberg tickers whose legacy ticker is shared with another record.
pub fn find_duplicates(map: &TickerMap) -> BTreeSet<String> {
    duplicate_groups(map).into_values().flatten().collect()
}

/// Alert text listing the affected keys, one group per line.
pub fn duplicate_message(groups: &BTreeMap<String, BTreeSet<String>>) -> String {
    let mut out = format!(
        "Found {} legacy ticker(s) mapped to more than one bloomberg_ticker:",
        groups.len()
    );
    for (legacy, keys) in groups {
        let keys: Vec<&str> = keys.iter().map(|k| k.as_str()).collect();
        out.push_str(&format!("\n{legacy}: {}", keys.join(", ")));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Field, TickerRecord};

    fn map() -> TickerMap {
        TickerMap::from_records([
            TickerRecord::new("A US").with(Field::LegacyTicker, "X"),
            TickerRecord::new("B US").with(Field::LegacyTicker, "X"),
            TickerRecord::new("C US").with(Field::LegacyTicker, "Y"),
            TickerRecord::new("D US"),
            TickerRecord::new("E US"),
        ])
        .unwrap()
    }

    #[test]
    fn shared_legacy_ticker_is_flagged() {
        let dups = find_duplicates(&map());
        let expected: BTreeSet<String> = ["A US".to_string(), "B US".to_string()].into();
        assert_eq!(dups, expected);
    }

    #[test]
    fn null_legacy_tickers_are_not_duplicates() {
        let dups = find_duplicates(&map());
        assert!(!dups.contains("D US"));
        assert!(!dups.contains("E US"));
    }

    #[test]
    fn clean_map_has_no_duplicates() {
        let m = TickerMap::from_records([
            TickerRecord::new("A US").with(Field::LegacyTicker, "X"),
            TickerRecord::new("C US").with(Field::LegacyTicker, "Y"),
        ])
        .unwrap();
        assert!(find_duplicates(&m).is_empty());
    }

    #[test]
    fn message_lists_groups() {
        let msg = duplicate_message(&duplicate_groups(&map()));
        assert!(msg.contains("X: A US, B US"));
        assert!(!msg.contains("C US"));
    }
}
