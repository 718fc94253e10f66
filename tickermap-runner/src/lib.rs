//! Tickermap Runner: orchestration of a reconciliation run.
//!
//! This crate builds on `tickermap-core` to provide:
//! - TOML pipeline configuration
//! - Onboarding of new universe tickers
//! - Enrichment stage descriptors and the stage executor
//! - Universe list export
//! - `run_pipeline`, returning a report or the failing step

pub mod config;
pub mod enrich;
pub mod export;
pub mod onboarding;
pub mod runner;
pub mod stage;

pub use config::{AlertConfig, ConfigError, ExportConfig, PipelineConfig, SecretNames, VendorConfig};
pub use enrich::{run_stages, EnrichError, StageOutcome};
pub use export::{export_universe, render_universe};
pub use onboarding::{eodhd_conflict_message, onboard, OnboardingError, OnboardingReport};
pub use runner::{check_duplicates, report_failure, run_pipeline, Collaborators, RunError, RunReport};
pub use stage::{standard_stages, CandidateSource, EnrichmentStage};

#[cfg(test)]
mod send_sync_checks {
    use super::*;

    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}

    #[test]
    fn reports_are_send_sync() {
        assert_send::<RunReport>();
        assert_sync::<RunReport>();
        assert_send::<RunError>();
        assert_sync::<RunError>();
        assert_send::<PipelineConfig>();
        assert_sync::<PipelineConfig>();
    }
}
