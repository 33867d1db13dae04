// ABOUTME: Persisted per-container metadata (project id and user).
// ABOUTME: A JSON object keyed by container name, rewritten in full on every change.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Sentinel for a value nobody has observed yet.
pub const UNKNOWN: &str = "-";

/// Last-known metadata of one container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    #[serde(rename = "PROJECT_ID", default)]
    pub project_id: Option<String>,
    #[serde(rename = "USER", default)]
    pub user: Option<String>,
}

/// Errors reading or writing the metadata file.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to read metadata store {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("metadata store {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to write metadata store {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to serialize metadata store: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Durable mapping from container name to [`MetadataRecord`].
///
/// Loaded once; every mutation is flushed to disk before returning.
#[derive(Debug)]
pub struct MetadataStore {
    path: PathBuf,
    records: BTreeMap<String, MetadataRecord>,
}

impl MetadataStore {
    /// Load the store. A missing or blank file yields an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let records = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => BTreeMap::new(),
            Ok(content) => serde_json::from_str(&content).map_err(|source| StoreError::Parse {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no metadata store at {}, starting empty", path.display());
                BTreeMap::new()
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, name: &str) -> Option<&MetadataRecord> {
        self.records.get(name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.records.keys().map(String::as_str)
    }

    /// Record the project id of a container created just now.
    pub fn seed(&mut self, name: &str, project_id: &str) -> Result<(), StoreError> {
        self.records.insert(
            name.to_string(),
            MetadataRecord {
                project_id: Some(project_id.to_string()),
                user: Some(UNKNOWN.to_string()),
            },
        );
        self.save()
    }

    pub fn set_project(&mut self, name: &str, project_id: &str) -> Result<(), StoreError> {
        self.records.entry(name.to_string()).or_default().project_id =
            Some(project_id.to_string());
        self.save()
    }

    pub fn set_user(&mut self, name: &str, user: &str) -> Result<(), StoreError> {
        self.records.entry(name.to_string()).or_default().user = Some(user.to_string());
        self.save()
    }

    /// Delete a record. Returns whether one existed.
    pub fn remove(&mut self, name: &str) -> Result<bool, StoreError> {
        let existed = self.records.remove(name).is_some();
        self.save()?;
        Ok(existed)
    }

    /// Rewrite the whole file.
    pub fn save(&self) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(&self.records)?;
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, json).map_err(|source| StoreError::Write {
            path: self.path.clone(),
            source,
        })?;
        tracing::debug!(
            "metadata store written ({} records) to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }
}
