//! Universe list export.

use tickermap_core::data::{ArtifactError, ArtifactStore};
use tickermap_core::UniverseSnapshot;

/// Every snapshot ticker, one per line, in source order.
///
/// Blacklisted and repeated tickers are kept: the file mirrors the published
/// universe, not the onboarded subset.
pub fn render_universe(snapshot: &UniverseSnapshot) -> String {
    let mut out = String::new();
    for ticker in snapshot.tickers() {
        out.push_str(ticker);
        out.push('\n');
    }
    out
}

/// Write the rendered universe under `logical_path`. Returns the line count.
pub fn export_universe(
    snapshot: &UniverseSnapshot,
    store: &dyn ArtifactStore,
    logical_path: &str,
) -> Result<usize, ArtifactError> {
    let body = render_universe(snapshot);
    store.put(logical_path, &body)?;
    tracing::info!(path = logical_path, tickers = snapshot.len(), "universe exported");
    Ok(snapshot.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tickermap_core::data::LocalArtifactStore;

    #[test]
    fn renders_in_source_order_with_duplicates() {
        let snapshot = UniverseSnapshot::from_tickers(["MSFT US", "AAPL US", "MSFT US"]);
        assert_eq!(render_universe(&snapshot), "MSFT US\nAAPL US\nMSFT US\n");
    }

    #[test]
    fn empty_snapshot_renders_empty() {
        let snapshot = UniverseSnapshot::from_tickers(Vec::<String>::new());
        assert_eq!(render_universe(&snapshot), "");
    }

    #[test]
    fn export_writes_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        let snapshot = UniverseSnapshot::from_tickers(["AAPL US", "VOD LN"]);

        let n = export_universe(&snapshot, &store, "numerai-universe.txt").unwrap();

        assert_eq!(n, 2);
        let text = std::fs::read_to_string(dir.path().join("numerai-universe.txt")).unwrap();
        assert_eq!(text, "AAPL US\nVOD LN\n");
    }
}
