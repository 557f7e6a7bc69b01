//! JSON manifest catalog
//!
//! A manifest lists the models available for placement:
//!
//! ```json
//! {
//!   "generated": "2026-03-01T12:00:00Z",
//!   "models": [
//!     { "id": "oak-chair", "name": "Oak chair", "url": "chairs/oak.glb",
//!       "created_at": "2026-02-27T09:30:00Z" }
//!   ]
//! }
//! ```
//!
//! Entries are listed newest first. Entries without `created_at` go last.

use crate::error::{AssetError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use placement::{CatalogEntry, CatalogProvider};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// One model in a manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestEntry {
    pub id: String,
    pub name: String,
    /// Asset locator handed to the loader
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<&ManifestEntry> for CatalogEntry {
    fn from(entry: &ManifestEntry) -> Self {
        CatalogEntry {
            id: entry.id.clone(),
            display_name: entry.name.clone(),
            asset_locator: entry.url.clone(),
        }
    }
}

/// On-disk catalog document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub models: Vec<ManifestEntry>,
}

impl Manifest {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn read(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|err| AssetError::io(path, err))?;
        Self::from_json(&json)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|err| AssetError::io(path, err))
    }

    /// Catalog entries, newest first
    ///
    /// Later duplicates of an id are dropped.
    pub fn entries(&self) -> Vec<CatalogEntry> {
        let mut models: Vec<&ManifestEntry> = self.models.iter().collect();
        // Stable: equal timestamps keep manifest order
        models.sort_by_key(|entry| Reverse(entry.created_at));

        let mut seen = HashSet::new();
        models
            .into_iter()
            .filter(|entry| {
                let fresh = seen.insert(entry.id.as_str());
                if !fresh {
                    warn!(id = %entry.id, "duplicate catalog id ignored");
                }
                fresh
            })
            .map(CatalogEntry::from)
            .collect()
    }
}

/// Catalog provider backed by a manifest file
///
/// Nothing is listed until the first [`refresh`](CatalogProvider::refresh);
/// each refresh re-reads the file.
#[derive(Debug)]
pub struct ManifestCatalog {
    path: PathBuf,
    entries: RwLock<Vec<CatalogEntry>>,
}

impl ManifestCatalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: RwLock::new(Vec::new()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_manifest(&self) -> Result<Manifest> {
        let json = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| AssetError::io(&self.path, err))?;
        Manifest::from_json(&json)
    }
}

#[async_trait]
impl CatalogProvider for ManifestCatalog {
    async fn list(&self) -> placement::Result<Vec<CatalogEntry>> {
        Ok(self.entries.read().await.clone())
    }

    async fn refresh(&self) -> placement::Result<()> {
        let manifest = self.read_manifest().await.map_err(|err| {
            warn!(path = %self.path.display(), error = %err, "failed to read catalog manifest");
            err.into_catalog_error()
        })?;

        let entries = manifest.entries();
        info!(path = %self.path.display(), models = entries.len(), "catalog loaded");
        debug!(ids = ?entries.iter().map(|e| e.id.as_str()).collect::<Vec<_>>(), "catalog ids");
        *self.entries.write().await = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "models": [
            {"id": "old", "name": "Old", "url": "old.glb", "created_at": "2025-01-01T00:00:00Z"},
            {"id": "undated", "name": "Undated", "url": "undated.gltf"},
            {"id": "new", "name": "New", "url": "new.glb", "created_at": "2026-06-01T00:00:00Z"},
            {"id": "old", "name": "Old copy", "url": "old-copy.glb", "created_at": "2024-01-01T00:00:00Z"}
        ]
    }"#;

    fn ids(entries: &[CatalogEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_entries_newest_first() {
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        let entries = manifest.entries();
        assert_eq!(ids(&entries), ["new", "old", "undated"]);
        assert_eq!(entries[1].display_name, "Old");
        assert_eq!(entries[1].asset_locator, "old.glb");
    }

    #[test]
    fn test_malformed_manifest() {
        assert!(matches!(
            Manifest::from_json(r#"{"models": [{"id": 3}]}"#),
            Err(AssetError::Manifest(_))
        ));
    }

    #[test]
    fn test_manifest_write_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        let manifest = Manifest::from_json(MANIFEST).unwrap();
        manifest.write(&path).unwrap();
        assert_eq!(Manifest::read(&path).unwrap(), manifest);
    }

    #[tokio::test]
    async fn test_refresh_rereads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let catalog = ManifestCatalog::new(&path);
        assert!(catalog.list().await.unwrap().is_empty());

        catalog.refresh().await.unwrap();
        assert_eq!(catalog.list().await.unwrap().len(), 3);

        std::fs::write(
            &path,
            r#"{"models": [{"id": "lamp", "name": "Lamp", "url": "lamp.glb"}]}"#,
        )
        .unwrap();
        // Stale until refreshed
        assert_eq!(catalog.list().await.unwrap().len(), 3);
        catalog.refresh().await.unwrap();
        assert_eq!(ids(&catalog.list().await.unwrap()), ["lamp"]);
    }

    #[tokio::test]
    async fn test_missing_manifest_is_catalog_error() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = ManifestCatalog::new(dir.path().join("absent.json"));
        let err = catalog.refresh().await.unwrap_err();
        assert!(matches!(err, placement::Error::Catalog(_)));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models.json");
        std::fs::write(&path, MANIFEST).unwrap();
        let catalog = ManifestCatalog::new(&path);
        catalog.refresh().await.unwrap();

        std::fs::write(&path, "{ not json").unwrap();
        assert!(catalog.refresh().await.is_err());
        assert_eq!(catalog.list().await.unwrap().len(), 3);
    }
}
