use std::collections::BTreeSet;
use std::path::Path;

/// Bloomberg tickers that must never be onboarded.
///
/// Loaded once per run from a newline-delimited file. Surrounding whitespace
/// and blank lines are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    tickers: BTreeSet<String>,
}

impl Blacklist {
    pub fn from_lines(text: &str) -> Self {
        text.lines().collect()
    }

    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_lines(&text))
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.tickers.contains(ticker)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Blacklist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let tickers = iter
            .into_iter()
            .filter_map(|s| {
                let t = s.as_ref().trim();
                (!t.is_empty()).then(|| t.to_string())
            })
            .collect();
        Self { tickers }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lines() {
        let bl = Blacklist::from_lines("ZZZZ US\n\n  QQQQ US \r\n");
        assert_eq!(bl.len(), 2);
        assert!(bl.contains("ZZZZ US"));
        assert!(bl.contains("QQQQ US"));
    }

    #[test]
    fn loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blacklist.txt");
        std::fs::write(&path, "ZZZZ US\n").unwrap();
        let bl = Blacklist::from_file(&path).unwrap();
        assert!(bl.contains("ZZZZ US"));
    }
}
