//! Stage executor for enrichment passes.
//!
//! Each stage: pivot the map to the stage's key scheme, select records with
//! any target field null, resolve only those keys, merge-and-fill the
//! result. The map is pivoted back to Bloomberg keys once all stages ran.
//!
//! Records with no key in a stage's scheme (an EODHD stage and a null
//! `eodhd_ticker`) are set aside while the map is keyed that way and come
//! back untouched when it is re-keyed by Bloomberg ticker. Two records
//! sharing a key still abort the run.

use crate::stage::EnrichmentStage;
use thiserror::Error;
use tickermap_core::data::ProviderError;
use tickermap_core::{KeyScheme, MergeError, MergeReport, PivotError, TickerMap, TickerRecord};

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error(transparent)]
    Pivot(#[from] PivotError),

    #[error("stage '{stage}' source failed")]
    Source {
        stage: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("stage '{stage}' merge failed")]
    Merge {
        stage: &'static str,
        #[source]
        source: MergeError,
    },
}

impl EnrichError {
    /// Stage that failed, when the failure belongs to one.
    pub fn stage(&self) -> Option<&'static str> {
        match self {
            EnrichError::Pivot(_) => None,
            EnrichError::Source { stage, .. } | EnrichError::Merge { stage, .. } => Some(*stage),
        }
    }
}

/// Result of one stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub name: &'static str,
    pub scheme: KeyScheme,
    /// Records with at least one target field null.
    pub selected: usize,
    /// Records left out because they have no key in `scheme`.
    pub set_aside: usize,
    /// `None` when nothing was selected and the source was not called.
    pub merge: Option<MergeReport>,
}

impl StageOutcome {
    pub fn skipped(&self) -> bool {
        self.merge.is_none()
    }

    pub fn cells_filled(&self) -> usize {
        self.merge.as_ref().map_or(0, MergeReport::cells_filled)
    }
}

/// Run `stages` in order over `map` and return the Bloomberg-keyed result.
pub fn run_stages(
    mut map: TickerMap,
    stages: &[EnrichmentStage<'_>],
) -> Result<(TickerMap, Vec<StageOutcome>), EnrichError> {
    let mut outcomes = Vec::with_capacity(stages.len());
    let mut aside = Vec::new();

    for stage in stages {
        let scheme = stage.scheme();
        map = rekey(map, &mut aside, scheme)?;

        let keys = map.keys_missing_any(&stage.targets);
        let _span = tracing::info_span!("stage", name = stage.name, %scheme).entered();

        if keys.is_empty() {
            tracing::info!("no records need this stage, skipping");
            outcomes.push(StageOutcome {
                name: stage.name,
                scheme,
                selected: 0,
                set_aside: aside.len(),
                merge: None,
            });
            continue;
        }

        tracing::info!(selected = keys.len(), "resolving");
        let candidate = stage
            .source
            .resolve(&keys)
            .map_err(|source| EnrichError::Source {
                stage: stage.name,
                source,
            })?;
        let report = map
            .merge_fill(&candidate)
            .map_err(|source| EnrichError::Merge {
                stage: stage.name,
                source,
            })?;

        if !report.unmatched.is_empty() {
            tracing::warn!(
                unmatched = report.unmatched.len(),
                "source returned keys absent from the map"
            );
        }
        tracing::info!(
            returned = candidate.len(),
            filled = report.cells_filled(),
            "stage complete"
        );

        outcomes.push(StageOutcome {
            name: stage.name,
            scheme,
            selected: keys.len(),
            set_aside: aside.len(),
            merge: Some(report),
        });
    }

    let map = rekey(map, &mut aside, KeyScheme::Bloomberg)?;
    Ok((map, outcomes))
}

/// Key `map` by `target`, going through Bloomberg keys so set-aside records
/// are reattached before a new set is taken out.
fn rekey(
    map: TickerMap,
    aside: &mut Vec<TickerRecord>,
    target: KeyScheme,
) -> Result<TickerMap, EnrichError> {
    if map.scheme() == target {
        return Ok(map);
    }
    let mut map = map.pivot(KeyScheme::Bloomberg)?;
    map.reattach(std::mem::take(aside))?;
    if target == KeyScheme::Bloomberg {
        return Ok(map);
    }

    let (keyed, unkeyed) = map.pivot_partial(target)?;
    if !unkeyed.is_empty() {
        let tickers: Vec<&str> = unkeyed.iter().map(|r| r.bloomberg_ticker.as_str()).collect();
        tracing::warn!(
            scheme = %target,
            count = unkeyed.len(),
            records = ?tickers,
            "records without a key are skipped by this stage"
        );
    }
    *aside = unkeyed;
    Ok(keyed)
}
