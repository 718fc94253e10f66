//! End-to-end reconciliation run.
//!
//! load map → duplicate check → fetch universe → diff against blacklist →
//! onboard new tickers → enrichment stages → persist if changed → export.
//!
//! The map lives in memory for the whole run and is pushed once, after every
//! stage succeeded. Any error aborts the run without persisting.

use crate::config::PipelineConfig;
use crate::enrich::{run_stages, EnrichError, StageOutcome};
use crate::export::export_universe;
use crate::onboarding::{eodhd_conflict_message, onboard, OnboardingError, OnboardingReport};
use crate::stage::EnrichmentStage;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;
use tickermap_core::data::{
    ArtifactError, ArtifactStore, MappingBuilder, MappingStore, Notifier, ProviderError,
    StoreError, UniverseSource,
};
use tickermap_core::reconcile::duplicate_message;
use tickermap_core::{
    diff_universe, duplicate_groups, Blacklist, EodhdSymbolRule, MapFingerprint, MergeError,
    PivotError, TickerMap, UniverseDiff,
};

/// Run failure, one variant per step.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("load ticker map")]
    LoadMap(#[source] StoreError),

    #[error("fetch universe")]
    FetchUniverse(#[source] ProviderError),

    #[error("read blacklist {path}")]
    Blacklist {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("onboarding")]
    Onboarding(#[from] OnboardingError),

    #[error("enrichment stage '{stage}' source failed")]
    Enrichment {
        stage: &'static str,
        #[source]
        source: ProviderError,
    },

    #[error("enrichment stage '{stage}' merge failed")]
    Merge {
        stage: &'static str,
        #[source]
        source: MergeError,
    },

    #[error("identifier pivot")]
    Pivot(#[source] PivotError),

    #[error("export universe")]
    Export(#[source] ArtifactError),

    #[error("persist ticker map")]
    Persist(#[source] StoreError),
}

impl From<EnrichError> for RunError {
    fn from(err: EnrichError) -> Self {
        match err {
            EnrichError::Pivot(e) => RunError::Pivot(e),
            EnrichError::Source { stage, source } => RunError::Enrichment { stage, source },
            EnrichError::Merge { stage, source } => RunError::Merge { stage, source },
        }
    }
}

/// Everything a run talks to.
pub struct Collaborators<'a> {
    pub store: &'a dyn MappingStore,
    pub universe: &'a dyn UniverseSource,
    pub mapping_builder: &'a dyn MappingBuilder,
    pub notifier: &'a dyn Notifier,
    /// Enrichment plan, already in execution order.
    pub stages: Vec<EnrichmentStage<'a>>,
    /// Required for export; when absent the export step is skipped.
    pub artifacts: Option<&'a dyn ArtifactStore>,
}

/// Summary of a successful run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Bloomberg tickers whose legacy ticker is shared with another record.
    pub duplicates: BTreeSet<String>,
    pub diff: UniverseDiff,
    pub onboarding: Option<OnboardingReport>,
    /// Empty when enrichment did not run.
    pub stages: Vec<StageOutcome>,
    pub fingerprint_before: MapFingerprint,
    pub fingerprint_after: MapFingerprint,
    pub records: usize,
    pub persisted: bool,
    /// Lines written when the universe was exported.
    pub exported: Option<usize>,
}

impl RunReport {
    /// True when the map content differs from what was loaded.
    pub fn changed(&self) -> bool {
        self.fingerprint_before != self.fingerprint_after
    }

    pub fn enriched(&self) -> bool {
        !self.stages.is_empty()
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let filled: usize = self.stages.iter().map(StageOutcome::cells_filled).sum();
        write!(
            f,
            "{} records, {} new, {} blacklisted, {} duplicates, {} cells enriched, map {} ({}), persisted={}, {}s",
            self.records,
            self.diff.new.len(),
            self.diff.blacklisted.len(),
            self.duplicates.len(),
            filled,
            if self.changed() { "changed" } else { "unchanged" },
            self.fingerprint_after.short(),
            self.persisted,
            (self.finished_at - self.started_at).num_seconds(),
        )
    }
}

/// Run one reconciliation pass.
pub fn run_pipeline(
    config: &PipelineConfig,
    collab: Collaborators<'_>,
) -> Result<RunReport, RunError> {
    let started_at = Utc::now();

    let mut map = collab.store.read_ticker_map().map_err(RunError::LoadMap)?;
    let fingerprint_before = map.fingerprint();
    tracing::info!(records = map.len(), fingerprint = %fingerprint_before.short(), "ticker map loaded");

    let duplicates = check_duplicates(&map, collab.notifier, &config.alerts.channel);

    let snapshot = collab
        .universe
        .fetch_universe()
        .map_err(RunError::FetchUniverse)?;
    let blacklist = load_blacklist(config)?;
    let diff = diff_universe(&map.bloomberg_tickers(), &snapshot.keys(), &blacklist);
    tracing::info!(
        universe = snapshot.len(),
        eligible = diff.eligible.len(),
        new = diff.new.len(),
        blacklisted = diff.blacklisted.len(),
        "universe diffed"
    );

    let onboarding = if diff.has_new() {
        let rule = EodhdSymbolRule::with_overrides(&config.vendor.eodhd_suffix_overrides);
        let report = onboard(
            &mut map,
            &snapshot,
            &diff,
            collab.mapping_builder,
            &rule,
        )?;
        if !report.eodhd.conflicts.is_empty() {
            let message = eodhd_conflict_message(&report.eodhd);
            if let Err(e) = collab.notifier.send_message(&config.alerts.channel, &message) {
                tracing::warn!(error = %e, "failed to send eodhd conflict alert");
            }
        }
        Some(report)
    } else {
        tracing::info!("no new tickers");
        None
    };

    let mut stages = Vec::new();
    if diff.has_new() || config.enrich_existing {
        let (enriched, outcomes) = run_stages(map, &collab.stages)?;
        map = enriched;
        stages = outcomes;
    }

    let fingerprint_after = map.fingerprint();
    let changed = fingerprint_after != fingerprint_before;

    let persisted = if config.dry_run {
        tracing::info!(changed, "dry run, not persisting");
        false
    } else if changed || config.always_persist {
        collab
            .store
            .push_ticker_map(&map)
            .map_err(RunError::Persist)?;
        tracing::info!(records = map.len(), fingerprint = %fingerprint_after.short(), "ticker map persisted");
        true
    } else {
        tracing::info!("ticker map unchanged, not persisting");
        false
    };

    let exported = match (&config.export, collab.artifacts) {
        (Some(_), _) if config.dry_run => None,
        (Some(export), Some(store)) => {
            Some(export_universe(&snapshot, store, &export.path).map_err(RunError::Export)?)
        }
        (Some(_), None) => {
            tracing::warn!("export configured without an artifact store, skipping");
            None
        }
        (None, _) => None,
    };

    let report = RunReport {
        started_at,
        finished_at: Utc::now(),
        duplicates,
        diff,
        onboarding,
        stages,
        fingerprint_before,
        fingerprint_after,
        records: map.len(),
        persisted,
        exported,
    };
    tracing::info!("run complete: {report}");
    Ok(report)
}

/// Detect duplicate legacy tickers and send one alert listing them.
/// Advisory only: notification failures are logged and the run continues.
pub fn check_duplicates(map: &TickerMap, notifier: &dyn Notifier, channel: &str) -> BTreeSet<String> {
    let groups = duplicate_groups(map);
    if groups.is_empty() {
        return BTreeSet::new();
    }
    let message = duplicate_message(&groups);
    tracing::warn!(groups = groups.len(), "duplicate legacy tickers");
    if let Err(e) = notifier.send_message(channel, &message) {
        tracing::warn!(error = %e, "failed to send duplicate alert");
    }
    groups.into_values().flatten().collect()
}

/// Send the single failure alert for an aborted run. The text carries the
/// error and each of its causes once, joined by `": "`.
pub fn report_failure(
    notifier: &dyn Notifier,
    channel: &str,
    err: &(dyn std::error::Error + 'static),
) {
    let text = format!("tickermap run failed: {}", error_chain(err));
    if let Err(e) = notifier.send_message(channel, &text) {
        tracing::warn!(error = %e, "failed to send failure alert");
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut text = err.to_string();
    let mut cause = err.source();
    while let Some(e) = cause {
        text.push_str(": ");
        text.push_str(&e.to_string());
        cause = e.source();
    }
    text
}

fn load_blacklist(config: &PipelineConfig) -> Result<Blacklist, RunError> {
    let blacklist =
        Blacklist::from_file(&config.blacklist_path).map_err(|source| RunError::Blacklist {
            path: config.blacklist_path.display().to_string(),
            source,
        })?;
    tracing::debug!(entries = blacklist.len(), "blacklist loaded");
    Ok(blacklist)
}
