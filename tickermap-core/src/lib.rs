//! Ticker map core: domain types, reconciliation engine, provider adapters.
//!
//! - Domain types (records, the keyed map, candidates, universe snapshot, blacklist)
//! - Duplicate detection and universe diffing
//! - Outer merge with fill-if-missing, the only write path for attributes
//! - Identifier scheme pivot between Bloomberg and EODHD keys
//! - Collaborator traits with CSV, HTTP, and Slack adapters

pub mod data;
pub mod domain;
pub mod reconcile;

pub use domain::{
    Blacklist, Candidate, EodhdDerivation, EodhdSymbolRule, Field, KeyScheme, MapFingerprint,
    TickerMap, TickerRecord, UniverseSnapshot,
};
pub use reconcile::{
    diff_universe, duplicate_groups, find_duplicates, MergeError, MergeReport, PivotError,
    UniverseDiff,
};
