use super::field::Field;
use super::record::TickerRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// BLAKE3 content hash of a ticker map.
///
/// Used to decide whether a run mutated the map and needs to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapFingerprint(pub String);

impl MapFingerprint {
    /// Hash records in the given order. Cells are unit-separated and records
    /// record-separated so adjacent values cannot alias.
    pub fn of_records<'a>(records: impl IntoIterator<Item = &'a TickerRecord>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for record in records {
            hasher.update(record.bloomberg_ticker.as_bytes());
            for field in Field::KNOWN.iter() {
                hasher.update(b"\x1f");
                if let Some(v) = record.get(field) {
                    hasher.update(b"=");
                    hasher.update(v.as_bytes());
                }
            }
            for (name, value) in &record.extra {
                hasher.update(b"\x1f");
                hasher.update(name.as_bytes());
                hasher.update(b"=");
                hasher.update(value.as_bytes());
            }
            hasher.update(b"\x1e");
        }
        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex characters, for log lines.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for MapFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
