//! CSV file mapping store.
//!
//! Writes are atomic: the map is written to a `.tmp` sibling and renamed
//! into place, so a crash mid-write never leaves a truncated map behind.

use super::provider::{MappingStore, StoreError};
use crate::domain::{KeyScheme, TickerMap};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

pub struct CsvMappingStore {
    path: PathBuf,
}

impl CsvMappingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }
}

impl MappingStore for CsvMappingStore {
    fn read_ticker_map(&self) -> Result<TickerMap, StoreError> {
        let file = File::open(&self.path).map_err(|e| self.io_err(e))?;
        let map = TickerMap::read_csv(BufReader::new(file))?;
        tracing::debug!(path = %self.path.display(), records = map.len(), "read ticker map");
        Ok(map)
    }

    fn push_ticker_map(&self, map: &TickerMap) -> Result<(), StoreError> {
        if map.scheme() != KeyScheme::Bloomberg {
            return Err(StoreError::WrongScheme(map.scheme()));
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let tmp_path = self.path.with_extension("csv.tmp");
        let file = File::create(&tmp_path).map_err(|e| self.io_err(e))?;
        if let Err(e) = map.write_csv(BufWriter::new(file)) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }
        fs::rename(&tmp_path, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            self.io_err(e)
        })?;

        tracing::info!(path = %self.path.display(), records = map.len(), "pushed ticker map");
        Ok(())
    }
}
