//! Webpack manifest loading.
//!
//! The manifest is read once per [`ManifestLoader`]. A failed read is cached
//! as well: every later call sees the same error until the loader is dropped
//! (in practice, until the process restarts).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde_json::Value;

/// Error produced while reading the manifest file.
///
/// Cloneable so the cached failure can be handed out repeatedly.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// The file could not be read.
    #[error("cannot read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },
    /// The file is not valid JSON.
    #[error("invalid JSON in {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },
    /// The JSON document is not an object.
    #[error("{} is not a JSON object", .0.display())]
    NotObject(PathBuf),
}

/// Logical asset name to emitted file path, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    entries: Vec<(String, String)>,
}

impl Manifest {
    /// Parse a manifest document.
    ///
    /// Entries whose value is not a string are skipped.
    pub fn from_json(text: &str, path: &Path) -> Result<Self, ManifestError> {
        let value: Value = serde_json::from_str(text).map_err(|e| ManifestError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let Value::Object(map) = value else {
            return Err(ManifestError::NotObject(path.to_path_buf()));
        };

        let entries = map
            .into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(emitted) => Some((key, emitted)),
                _ => None,
            })
            .collect();
        Ok(Self { entries })
    }

    /// Iterate `(key, emitted path)` pairs in document order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Exact key lookup.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Manifest {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Lazily loads and caches the manifest file.
///
/// Thread-safe: under contention exactly one caller performs the read, the
/// others block until it finishes and then observe its outcome.
#[derive(Debug)]
pub struct ManifestLoader {
    path: PathBuf,
    state: OnceLock<Result<Manifest, ManifestError>>,
}

impl ManifestLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: OnceLock::new(),
        }
    }

    /// Loader already holding `manifest`; no file is read.
    pub fn preloaded(manifest: Manifest) -> Self {
        Self {
            path: PathBuf::new(),
            state: OnceLock::from(Ok(manifest)),
        }
    }

    /// Manifest file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Return the cached manifest, reading the file on first use.
    pub fn load(&self) -> Result<&Manifest, &ManifestError> {
        self.state
            .get_or_init(|| {
                let result = read_manifest(&self.path);
                match &result {
                    Ok(manifest) => tracing::debug!(
                        path = %self.path.display(),
                        entries = manifest.len(),
                        "Loaded webpack manifest"
                    ),
                    Err(e) => tracing::warn!(error = %e, "Webpack manifest unavailable"),
                }
                result
            })
            .as_ref()
    }
}

fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let text = std::fs::read_to_string(path).map_err(|e| ManifestError::Read {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    Manifest::from_json(&text, path)
}
