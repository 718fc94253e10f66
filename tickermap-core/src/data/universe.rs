//! Universe snapshot sources.

use super::http::{HttpBody, HttpFetcher};
use super::provider::{ProviderError, UniverseSource};
use crate::domain::UniverseSnapshot;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Duration;

/// Published universe CSV fetched over HTTP.
pub struct HttpUniverseSource {
    http: HttpFetcher,
    url: String,
}

impl HttpUniverseSource {
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            http: HttpFetcher::new("universe", Duration::from_secs(60))?,
            url: url.into(),
        })
    }
}

impl UniverseSource for HttpUniverseSource {
    fn fetch_universe(&self) -> Result<UniverseSnapshot, ProviderError> {
        tracing::info!(url = %self.url, "downloading latest universe");
        match self.http.get_text(&self.url, &[], "universe csv")? {
            HttpBody::Ok(body) => Ok(UniverseSnapshot::from_csv_str(&body)?),
            HttpBody::NotFound => Err(ProviderError::Http {
                provider: self.http.provider().to_string(),
                status: 404,
                context: self.url.clone(),
            }),
        }
    }
}

/// Universe CSV read from a local file (offline runs, fixtures).
pub struct FileUniverseSource {
    path: PathBuf,
}

impl FileUniverseSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl UniverseSource for FileUniverseSource {
    fn fetch_universe(&self) -> Result<UniverseSnapshot, ProviderError> {
        let file = File::open(&self.path)?;
        Ok(UniverseSnapshot::from_csv_reader(BufReader::new(file))?)
    }
}
