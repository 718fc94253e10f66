//! Artifact store for line-delimited exports.

use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("invalid artifact path '{0}'")]
    InvalidPath(String),

    #[error("artifact I/O error at {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Accepts a text blob under a logical path.
pub trait ArtifactStore {
    fn put(&self, logical_path: &str, body: &str) -> Result<(), ArtifactError>;
}

/// Artifacts written under a local root directory.
pub struct LocalArtifactStore {
    root: PathBuf,
}

impl LocalArtifactStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve a logical path under the root. Absolute paths and `..` are
    /// rejected so an export can never escape the root.
    pub fn resolve(&self, logical_path: &str) -> Result<PathBuf, ArtifactError> {
        let rel = Path::new(logical_path);
        let ok = !logical_path.trim().is_empty()
            && rel.components().all(|c| matches!(c, Component::Normal(_)));
        if !ok {
            return Err(ArtifactError::InvalidPath(logical_path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl ArtifactStore for LocalArtifactStore {
    fn put(&self, logical_path: &str, body: &str) -> Result<(), ArtifactError> {
        let path = self.resolve(logical_path)?;
        let io_err = |source| ArtifactError::Io {
            path: path.display().to_string(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        tracing::info!(path = %path.display(), bytes = body.len(), "artifact written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_under_root() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalArtifactStore::new(dir.path());
        store.put("lists/numerai-universe.txt", "A\nB\n").unwrap();
        let text = std::fs::read_to_string(dir.path().join("lists/numerai-universe.txt")).unwrap();
        assert_eq!(text, "A\nB\n");
    }

    #[test]
    fn rejects_escaping_paths() {
        let store = LocalArtifactStore::new("/tmp/x");
        assert!(store.resolve("../etc/passwd").is_err());
        assert!(store.resolve("/abs").is_err());
        assert!(store.resolve("").is_err());
    }
}
