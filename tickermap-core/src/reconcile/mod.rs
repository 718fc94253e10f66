//! Reconciliation engine: duplicates, universe diff, merge-and-fill, pivot.

pub mod duplicates;
pub mod merge;
pub mod pivot;
pub mod universe_diff;

pub use duplicates::{duplicate_groups, duplicate_message, find_duplicates};
pub use merge::{MergeError, MergeReport};
pub use pivot::PivotError;
pub use universe_diff::{diff_universe, UniverseDiff};
