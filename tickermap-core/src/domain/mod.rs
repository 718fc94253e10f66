//! Domain types for the ticker map

pub mod blacklist;
pub mod candidate;
pub mod eodhd_symbol;
pub mod field;
pub mod fingerprint;
pub mod record;
pub mod snapshot;
pub mod table;
pub mod ticker_map;

pub use blacklist::Blacklist;
pub use candidate::Candidate;
pub use eodhd_symbol::EodhdSymbolRule;
pub use field::{Field, BLOOMBERG_TICKER};
pub use fingerprint::MapFingerprint;
pub use record::TickerRecord;
pub use snapshot::UniverseSnapshot;
pub use table::{FormatError, KeyedRow};
pub use ticker_map::{EodhdDerivation, KeyScheme, TickerMap};
