//! Universe diffing against the known ticker map.

use crate::domain::Blacklist;
use std::collections::BTreeSet;

/// Result of comparing the latest universe with the known map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UniverseDiff {
    /// `latest - blacklist`
    pub eligible: BTreeSet<String>,
    /// `eligible - known`
    pub new: BTreeSet<String>,
    /// Latest-universe tickers removed by the blacklist.
    pub blacklisted: BTreeSet<String>,
}

impl UniverseDiff {
    pub fn has_new(&self) -> bool {
        !self.new.is_empty()
    }
}

/// Compute eligible and new tickers. The blacklist only affects what gets
/// onboarded; known records are never removed here.
pub fn diff_universe(
    known: &BTreeSet<String>,
    latest: &BTreeSet<String>,
    blacklist: &Blacklist,
) -> UniverseDiff {
    let (blacklisted, eligible): (BTreeSet<String>, BTreeSet<String>) =
        latest.iter().cloned().partition(|t| blacklist.contains(t));
    let new = eligible.difference(known).cloned().collect();
    UniverseDiff {
        eligible,
        new,
        blacklisted,
    }
}
