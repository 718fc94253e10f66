//! Collaborator traits and structured error types.
//!
//! The engine only talks to the outside world through these traits, so each
//! source (HTTP, local files, in-memory fakes in tests) can be swapped freely.

use crate::domain::{Candidate, FormatError, TickerMap, UniverseSnapshot};
use std::collections::BTreeMap;
use thiserror::Error;

/// Errors from data providers.
///
/// These are not retried by the engine; HTTP clients retry internally before
/// giving up with one of these.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by {provider} (retry after {retry_after_secs}s)")]
    RateLimited {
        provider: String,
        retry_after_secs: u64,
    },

    #[error("authentication rejected by {provider}")]
    AuthenticationRequired { provider: String },

    #[error("HTTP {status} from {provider}: {context}")]
    Http {
        provider: String,
        status: u16,
        context: String,
    },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("malformed table")]
    Format(#[from] FormatError),

    #[error("provider I/O error")]
    Io(#[from] std::io::Error),

    #[error("provider error: {0}")]
    Other(String),
}

/// Errors from the mapping store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("mapping store I/O error at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed ticker map")]
    Format(#[from] FormatError),

    #[error("refusing to persist a map keyed by {0}; pivot back to bloomberg_ticker first")]
    WrongScheme(crate::domain::KeyScheme),
}

/// Persisted ticker map. Last writer wins.
pub trait MappingStore {
    fn read_ticker_map(&self) -> Result<TickerMap, StoreError>;

    fn push_ticker_map(&self, map: &TickerMap) -> Result<(), StoreError>;
}

/// Source of the latest universe snapshot.
pub trait UniverseSource {
    fn fetch_universe(&self) -> Result<UniverseSnapshot, ProviderError>;
}

/// Builds the full vendor mapping (historical and current universe members).
pub trait MappingBuilder {
    /// Bloomberg-keyed candidate of vendor attributes.
    fn build_map(&self) -> Result<Candidate, ProviderError>;
}

/// Per-key attribute lookup (country, polygon ticker).
pub trait AttributeLookup {
    fn name(&self) -> &str;

    /// `Ok(None)` when the source has no value for the key.
    fn lookup(&self, bloomberg_ticker: &str) -> Result<Option<String>, ProviderError>;
}

/// Fundamentals for one EODHD symbol. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fundamentals {
    pub industry: Option<String>,
    pub sector: Option<String>,
    pub isin: Option<String>,
}

/// EODHD search and fundamentals, addressed by EODHD symbol.
///
/// Results are sparse: symbols the provider knows nothing about are absent
/// from the returned map.
pub trait EodhdProvider {
    /// ISIN per EODHD symbol.
    fn search(&self, symbols: &[String]) -> Result<BTreeMap<String, String>, ProviderError>;

    fn get_fundamentals(
        &self,
        symbols: &[String],
    ) -> Result<BTreeMap<String, Fundamentals>, ProviderError>;
}

/// Progress callback for per-key lookups.
pub trait LookupProgress {
    fn on_batch_start(&self, stage: &str, total: usize);

    fn on_key(&self, stage: &str, key: &str, index: usize, total: usize, found: bool);

    fn on_batch_complete(&self, stage: &str, found: usize, total: usize);
}

/// Progress reporter that logs through `tracing`.
pub struct TracingProgress;

impl LookupProgress for TracingProgress {
    fn on_batch_start(&self, stage: &str, total: usize) {
        tracing::info!(stage, total, "resolving missing values");
    }

    fn on_key(&self, stage: &str, key: &str, index: usize, total: usize, found: bool) {
        tracing::debug!(stage, key, "[{}/{}] found={found}", index + 1, total);
    }

    fn on_batch_complete(&self, stage: &str, found: usize, total: usize) {
        tracing::info!(stage, found, total, "lookup batch complete");
    }
}
