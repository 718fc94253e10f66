//! EODHD symbol derivation from legacy (Yahoo-style) tickers.
//!
//! Legacy tickers carry the listing exchange as a dotted suffix (`7203.T`,
//! `VOD.L`); US listings carry none. EODHD addresses instruments as
//! `CODE.EXCHANGE` with its own exchange codes, so the suffix is translated.

use std::collections::BTreeMap;

/// Suffix translation table, legacy suffix → EODHD exchange code.
const DEFAULT_SUFFIXES: &[(&str, &str)] = &[
    ("AS", "AS"),
    ("AX", "AU"),
    ("BK", "BK"),
    ("BO", "BSE"),
    ("BR", "BR"),
    ("CO", "CO"),
    ("DE", "XETRA"),
    ("F", "F"),
    ("HE", "HE"),
    ("HK", "HK"),
    ("IR", "IR"),
    ("IS", "IS"),
    ("JK", "JK"),
    ("JO", "JSE"),
    ("KL", "KLSE"),
    ("KQ", "KQ"),
    ("KS", "KO"),
    ("L", "LSE"),
    ("LS", "LS"),
    ("MC", "MC"),
    ("MI", "MI"),
    ("MX", "MX"),
    ("NS", "NSE"),
    ("NZ", "NZ"),
    ("OL", "OL"),
    ("PA", "PA"),
    ("SA", "SA"),
    ("SG", "STU"),
    ("SI", "SG"),
    ("SS", "SHG"),
    ("ST", "ST"),
    ("SW", "SW"),
    ("SZ", "SHE"),
    ("T", "TSE"),
    ("TO", "TO"),
    ("TW", "TW"),
    ("TWO", "TWO"),
    ("V", "V"),
    ("VI", "VI"),
    ("WA", "WAR"),
];

/// Derives an EODHD symbol from a legacy ticker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EodhdSymbolRule {
    suffixes: BTreeMap<String, String>,
    default_exchange: String,
}

impl Default for EodhdSymbolRule {
    fn default() -> Self {
        Self {
            suffixes: DEFAULT_SUFFIXES
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            default_exchange: "US".to_string(),
        }
    }
}

impl EodhdSymbolRule {
    /// Default table with entries replaced or added by `overrides`.
    pub fn with_overrides(overrides: &BTreeMap<String, String>) -> Self {
        let mut rule = Self::default();
        for (suffix, exchange) in overrides {
            rule.suffixes
                .insert(suffix.trim().to_ascii_uppercase(), exchange.trim().to_string());
        }
        rule
    }

    /// `AAPL` → `AAPL.US`, `7203.T` → `7203.TSE`.
    ///
    /// Suffixes missing from the table are kept verbatim. Returns `None` for
    /// a blank ticker.
    pub fn derive(&self, legacy_ticker: &str) -> Option<String> {
        let ticker = legacy_ticker.trim();
        if ticker.is_empty() {
            return None;
        }
        match ticker.rsplit_once('.') {
            Some((code, suffix)) if !code.is_empty() && !suffix.is_empty() => {
                let suffix = suffix.to_ascii_uppercase();
                let exchange = self.suffixes.get(&suffix).cloned().unwrap_or(suffix);
                Some(format!("{code}.{exchange}"))
            }
            _ => Some(format!("{ticker}.{}", self.default_exchange)),
        }
    }
}
