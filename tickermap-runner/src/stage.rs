//! Enrichment stage descriptors and their candidate sources.
//!
//! A stage names the fields it fills, the key scheme its source addresses
//! records by, and the source itself. The executor in [`crate::enrich`]
//! handles selection, pivoting and merging, so a source only turns a list of
//! keys into a sparse [`Candidate`].

use tickermap_core::data::{
    AttributeLookup, EodhdProvider, LookupProgress, ProviderError, TracingProgress,
};
use tickermap_core::{Candidate, Field, KeyScheme};

/// Resolves values for a batch of keys.
pub trait CandidateSource {
    /// Scheme of the keys this source accepts and returns.
    fn scheme(&self) -> KeyScheme;

    fn resolve(&self, keys: &[String]) -> Result<Candidate, ProviderError>;
}

/// One enrichment pass.
pub struct EnrichmentStage<'a> {
    pub name: &'static str,
    /// A record is selected when any of these is null.
    pub targets: Vec<Field>,
    pub source: Box<dyn CandidateSource + 'a>,
}

impl<'a> EnrichmentStage<'a> {
    pub fn scheme(&self) -> KeyScheme {
        self.source.scheme()
    }

    /// `country` via a per-key lookup on Bloomberg ticker.
    pub fn country(lookup: &'a dyn AttributeLookup) -> Self {
        Self {
            name: "country",
            targets: vec![Field::Country],
            source: Box::new(PerKeyLookup::new(Field::Country, lookup)),
        }
    }

    /// `polygon_ticker` via a per-key lookup on Bloomberg ticker.
    pub fn polygon_ticker(lookup: &'a dyn AttributeLookup) -> Self {
        Self {
            name: "polygon_ticker",
            targets: vec![Field::PolygonTicker],
            source: Box::new(PerKeyLookup::new(Field::PolygonTicker, lookup)),
        }
    }

    /// `isin` via a batched EODHD search.
    pub fn isin(provider: &'a dyn EodhdProvider) -> Self {
        Self {
            name: "isin",
            targets: vec![Field::Isin],
            source: Box::new(IsinSearch { provider }),
        }
    }

    /// `industry`, `sector` and a second chance at `isin` via one batched
    /// EODHD fundamentals fetch.
    pub fn fundamentals(provider: &'a dyn EodhdProvider) -> Self {
        Self {
            name: "fundamentals",
            targets: vec![Field::Industry, Field::Isin, Field::Sector],
            source: Box::new(FundamentalsFetch { provider }),
        }
    }
}

/// Stage plan in the required order. Absent collaborators drop their stages.
pub fn standard_stages<'a>(
    country: Option<&'a dyn AttributeLookup>,
    polygon: Option<&'a dyn AttributeLookup>,
    eodhd: Option<&'a dyn EodhdProvider>,
) -> Vec<EnrichmentStage<'a>> {
    let mut stages = Vec::new();
    if let Some(lookup) = country {
        stages.push(EnrichmentStage::country(lookup));
    }
    if let Some(lookup) = polygon {
        stages.push(EnrichmentStage::polygon_ticker(lookup));
    }
    if let Some(provider) = eodhd {
        stages.push(EnrichmentStage::isin(provider));
        stages.push(EnrichmentStage::fundamentals(provider));
    }
    stages
}

/// One lookup call per Bloomberg ticker.
pub struct PerKeyLookup<'a> {
    field: Field,
    lookup: &'a dyn AttributeLookup,
    progress: &'a dyn LookupProgress,
}

impl<'a> PerKeyLookup<'a> {
    pub fn new(field: Field, lookup: &'a dyn AttributeLookup) -> Self {
        Self {
            field,
            lookup,
            progress: &TracingProgress,
        }
    }

    pub fn with_progress(mut self, progress: &'a dyn LookupProgress) -> Self {
        self.progress = progress;
        self
    }
}

impl CandidateSource for PerKeyLookup<'_> {
    fn scheme(&self) -> KeyScheme {
        KeyScheme::Bloomberg
    }

    fn resolve(&self, keys: &[String]) -> Result<Candidate, ProviderError> {
        let stage = self.lookup.name();
        let total = keys.len();
        self.progress.on_batch_start(stage, total);

        let mut candidate = Candidate::new(KeyScheme::Bloomberg);
        let mut found = 0;
        for (i, key) in keys.iter().enumerate() {
            let value = self.lookup.lookup(key)?;
            let hit = value.as_deref().is_some_and(|v| !v.trim().is_empty());
            if let Some(v) = value {
                candidate.insert(key, self.field.clone(), &v);
            }
            if hit {
                found += 1;
            }
            self.progress.on_key(stage, key, i, total, hit);
        }

        self.progress.on_batch_complete(stage, found, total);
        Ok(candidate)
    }
}

/// Batched ISIN search keyed by EODHD symbol.
pub struct IsinSearch<'a> {
    provider: &'a dyn EodhdProvider,
}

impl CandidateSource for IsinSearch<'_> {
    fn scheme(&self) -> KeyScheme {
        KeyScheme::Eodhd
    }

    fn resolve(&self, keys: &[String]) -> Result<Candidate, ProviderError> {
        let found = self.provider.search(keys)?;
        let mut candidate = Candidate::new(KeyScheme::Eodhd);
        for (symbol, isin) in &found {
            candidate.insert(symbol, Field::Isin, isin);
        }
        Ok(candidate)
    }
}

/// Batched fundamentals fetch keyed by EODHD symbol. Each returned field is
/// filled independently.
pub struct FundamentalsFetch<'a> {
    provider: &'a dyn EodhdProvider,
}

impl CandidateSource for FundamentalsFetch<'_> {
    fn scheme(&self) -> KeyScheme {
        KeyScheme::Eodhd
    }

    fn resolve(&self, keys: &[String]) -> Result<Candidate, ProviderError> {
        let found = self.provider.get_fundamentals(keys)?;
        let mut candidate = Candidate::new(KeyScheme::Eodhd);
        for (symbol, f) in &found {
            let cells = [
                (Field::Industry, &f.industry),
                (Field::Sector, &f.sector),
                (Field::Isin, &f.isin),
            ];
            for (field, value) in cells {
                if let Some(v) = value {
                    candidate.insert(symbol, field, v);
                }
            }
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tickermap_core::data::{Fundamentals, ReferenceTable};

    struct FixedEodhd;

    impl EodhdProvider for FixedEodhd {
        fn search(&self, symbols: &[String]) -> Result<BTreeMap<String, String>, ProviderError> {
            Ok(symbols
                .iter()
                .filter(|s| s.as_str() == "AAPL.US")
                .map(|s| (s.clone(), "US0378331005".to_string()))
                .collect())
        }

        fn get_fundamentals(
            &self,
            symbols: &[String],
        ) -> Result<BTreeMap<String, Fundamentals>, ProviderError> {
            Ok(symbols
                .iter()
                .map(|s| {
                    (
                        s.clone(),
                        Fundamentals {
                            industry: None,
                            sector: Some("Technology".into()),
                            isin: Some(String::new()),
                        },
                    )
                })
                .collect())
        }
    }

    #[test]
    fn plan_order_is_fixed() {
        let table = ReferenceTable::from_pairs("country", [("AAPL US", "US")]);
        let stages = standard_stages(Some(&table), Some(&table), Some(&FixedEodhd));
        let names: Vec<&str> = stages.iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["country", "polygon_ticker", "isin", "fundamentals"]);
        assert_eq!(stages[0].scheme(), KeyScheme::Bloomberg);
        assert_eq!(stages[2].scheme(), KeyScheme::Eodhd);
    }

    #[test]
    fn absent_collaborators_drop_stages() {
        let stages = standard_stages(None, None, Some(&FixedEodhd));
        assert_eq!(stages.len(), 2);
        assert!(standard_stages(None, None, None).is_empty());
    }

    #[test]
    fn per_key_lookup_skips_misses() {
        let table = ReferenceTable::from_pairs("country", [("AAPL US", "US")]);
        let source = PerKeyLookup::new(Field::Country, &table);
        let c = source
            .resolve(&["AAPL US".to_string(), "VOD LN".to_string()])
            .unwrap();
        assert_eq!(c.len(), 1);
        assert!(c.get("VOD LN").is_none());
    }

    #[derive(Default)]
    struct Counting {
        keys: std::cell::Cell<usize>,
        found: std::cell::Cell<usize>,
    }

    impl LookupProgress for Counting {
        fn on_batch_start(&self, _stage: &str, _total: usize) {}

        fn on_key(&self, _stage: &str, _key: &str, _index: usize, _total: usize, _found: bool) {
            self.keys.set(self.keys.get() + 1);
        }

        fn on_batch_complete(&self, _stage: &str, found: usize, _total: usize) {
            self.found.set(found);
        }
    }

    #[test]
    fn per_key_lookup_reports_progress() {
        let table = ReferenceTable::from_pairs("country", [("AAPL US", "US"), ("BLANK US", " ")]);
        let progress = Counting::default();
        let source = PerKeyLookup::new(Field::Country, &table).with_progress(&progress);

        let keys = ["AAPL US", "BLANK US", "VOD LN"].map(String::from);
        let c = source.resolve(&keys).unwrap();

        assert_eq!(progress.keys.get(), 3);
        assert_eq!(progress.found.get(), 1);
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn isin_search_is_sparse() {
        let stage = EnrichmentStage::isin(&FixedEodhd);
        let c = stage
            .source
            .resolve(&["AAPL.US".to_string(), "GHOST.US".to_string()])
            .unwrap();
        assert_eq!(c.len(), 1);
    }

    #[test]
    fn fundamentals_drop_empty_fields() {
        let stage = EnrichmentStage::fundamentals(&FixedEodhd);
        let c = stage.source.resolve(&["AAPL.US".to_string()]).unwrap();
        let row = c.get("AAPL.US").unwrap();
        assert_eq!(row.get(&Field::Sector).map(String::as_str), Some("Technology"));
        assert!(!row.contains_key(&Field::Industry));
        assert!(!row.contains_key(&Field::Isin));
    }
}
