//! Onboarding of new universe tickers.

use thiserror::Error;
use tickermap_core::data::{MappingBuilder, ProviderError};
use tickermap_core::{
    EodhdDerivation, EodhdSymbolRule, MergeError, MergeReport, TickerMap, UniverseDiff,
    UniverseSnapshot,
};

#[derive(Debug, Error)]
pub enum OnboardingError {
    #[error("vendor mapping build failed")]
    Build(#[source] ProviderError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// What onboarding changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnboardingReport {
    /// Snapshot rows merged into the map.
    pub universe: MergeReport,
    /// Vendor mapping merged into the map.
    pub vendor: MergeReport,
    /// Derived `eodhd_ticker`s, and the symbols withheld because another
    /// record holds or wants them.
    pub eodhd: EodhdDerivation,
}

impl OnboardingReport {
    pub fn inserted(&self) -> usize {
        self.universe.inserted.len() + self.vendor.inserted.len()
    }
}

/// Alert text listing EODHD symbols that were not derived.
pub fn eodhd_conflict_message(derivation: &EodhdDerivation) -> String {
    let mut text = format!(
        "EODHD symbol not derived for {} record(s); the symbol is already taken:",
        derivation.skipped()
    );
    for (symbol, tickers) in &derivation.conflicts {
        text.push_str(&format!("\n{symbol}: {}", tickers.join(", ")));
    }
    text
}

/// Bring newly listed tickers into a Bloomberg-keyed map.
///
/// The vendor mapping is built first so a builder failure leaves the map
/// untouched. Then the eligible snapshot rows and the vendor mapping are
/// merged in that order, and missing EODHD symbols are derived from legacy
/// tickers. A symbol that would collide with another record's is left null.
pub fn onboard(
    map: &mut TickerMap,
    snapshot: &UniverseSnapshot,
    diff: &UniverseDiff,
    builder: &dyn MappingBuilder,
    rule: &EodhdSymbolRule,
) -> Result<OnboardingReport, OnboardingError> {
    tracing::info!(new = diff.new.len(), "onboarding new tickers");

    let vendor_candidate = builder.build_map().map_err(OnboardingError::Build)?;

    let universe = map.merge_fill(&snapshot.to_candidate(&diff.eligible))?;
    let vendor = map.merge_fill(&vendor_candidate)?;
    let eodhd = map.derive_eodhd_tickers(rule);

    let report = OnboardingReport {
        universe,
        vendor,
        eodhd,
    };
    tracing::info!(
        inserted = report.inserted(),
        vendor_cells = report.vendor.cells_filled(),
        eodhd_derived = report.eodhd.derived,
        eodhd_skipped = report.eodhd.skipped(),
        "onboarding complete"
    );
    Ok(report)
}
