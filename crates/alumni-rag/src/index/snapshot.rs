//! On-disk index snapshots published through a `CURRENT` manifest
//!
//! Layout of the snapshot directory:
//!
//! ```text
//! snapshot-<seq>.json   serialized VectorIndex
//! CURRENT               {"snapshot": "snapshot-<seq>.json", ...}
//! ```
//!
//! A snapshot is written to a `.tmp` file, synced and renamed into place.
//! Renaming `CURRENT.tmp` over `CURRENT` is the single step that publishes
//! it, so a crash at any point leaves `CURRENT` naming a complete snapshot.
//! The previously published snapshot is kept as a backup; older ones are pruned.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

use super::VectorIndex;

const MANIFEST_FILE: &str = "CURRENT";
const SNAPSHOT_PREFIX: &str = "snapshot-";
const SNAPSHOT_SUFFIX: &str = ".json";
const TMP_SUFFIX: &str = ".tmp";

/// Contents of the `CURRENT` manifest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    /// File name of the published snapshot, relative to the directory
    pub snapshot: String,
    /// Sequence number encoded in the file name
    pub sequence: u64,
    /// Entries in the snapshot
    pub entries: usize,
    pub written_at: DateTime<Utc>,
}

/// Snapshot directory for one collection
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read the manifest, if one has been published
    pub fn manifest(&self) -> Result<Option<Manifest>> {
        let path = self.dir.join(MANIFEST_FILE);
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read(&path)
            .map_err(|e| Error::persistence(format!("Failed to read {}: {}", path.display(), e)))?;
        let manifest: Manifest = serde_json::from_slice(&raw)
            .map_err(|e| Error::persistence(format!("Corrupt manifest {}: {}", path.display(), e)))?;
        Ok(Some(manifest))
    }

    /// Load the published snapshot
    pub fn load(&self) -> Result<Option<VectorIndex>> {
        let manifest = match self.manifest()? {
            Some(manifest) => manifest,
            None => return Ok(None),
        };

        if parse_sequence(&manifest.snapshot) != Some(manifest.sequence) {
            return Err(Error::persistence(format!(
                "Manifest names an invalid snapshot: {}",
                manifest.snapshot
            )));
        }

        let path = self.dir.join(&manifest.snapshot);
        let raw = fs::read(&path)
            .map_err(|e| Error::persistence(format!("Failed to read {}: {}", path.display(), e)))?;
        let index: VectorIndex = serde_json::from_slice(&raw)
            .map_err(|e| Error::persistence(format!("Corrupt snapshot {}: {}", path.display(), e)))?;

        if index.len() != manifest.entries {
            return Err(Error::persistence(format!(
                "Snapshot {} has {} entries, manifest records {}",
                manifest.snapshot,
                index.len(),
                manifest.entries
            )));
        }

        Ok(Some(index))
    }

    /// Write and publish a snapshot, returning its manifest
    pub fn publish(&self, index: &VectorIndex) -> Result<Manifest> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            Error::persistence(format!("Failed to create {}: {}", self.dir.display(), e))
        })?;

        let previous = self.manifest().ok().flatten();
        let sequence = self.highest_sequence()?.map_or(1, |seq| seq + 1);
        let name = format!("{}{}{}", SNAPSHOT_PREFIX, sequence, SNAPSHOT_SUFFIX);

        let bytes = serde_json::to_vec(index)?;
        self.write_atomic(&name, &bytes)?;

        let manifest = Manifest {
            snapshot: name,
            sequence,
            entries: index.len(),
            written_at: Utc::now(),
        };
        self.write_atomic(MANIFEST_FILE, &serde_json::to_vec_pretty(&manifest)?)?;

        let mut keep = vec![manifest.snapshot.clone()];
        if let Some(previous) = previous {
            keep.push(previous.snapshot);
        }
        self.prune(&keep);

        tracing::debug!(
            "Published {} ({} entries) in {}",
            manifest.snapshot,
            manifest.entries,
            self.dir.display()
        );
        Ok(manifest)
    }

    fn write_atomic(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let target = self.dir.join(name);
        let tmp = self.dir.join(format!("{}{}", name, TMP_SUFFIX));

        let write = || -> std::io::Result<()> {
            let mut file = File::create(&tmp)?;
            file.write_all(bytes)?;
            file.sync_all()?;
            fs::rename(&tmp, &target)?;
            sync_dir(&self.dir);
            Ok(())
        };

        write().map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::persistence(format!("Failed to write {}: {}", target.display(), e))
        })
    }

    fn highest_sequence(&self) -> Result<Option<u64>> {
        let mut highest = None;
        for name in self.snapshot_files()? {
            if let Some(seq) = parse_sequence(&name) {
                highest = highest.max(Some(seq));
            }
        }
        Ok(highest)
    }

    fn snapshot_files(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir).map_err(|e| {
            Error::persistence(format!("Failed to list {}: {}", self.dir.display(), e))
        })?;

        Ok(entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter(|name| name.starts_with(SNAPSHOT_PREFIX))
            .collect())
    }

    /// Remove snapshots (and stray temp files) not listed in `keep`
    fn prune(&self, keep: &[String]) {
        let files = match self.snapshot_files() {
            Ok(files) => files,
            Err(e) => {
                tracing::warn!("Skipping snapshot pruning: {}", e);
                return;
            }
        };

        for name in files.into_iter().filter(|name| !keep.contains(name)) {
            if let Err(e) = fs::remove_file(self.dir.join(&name)) {
                tracing::warn!("Failed to remove old snapshot {}: {}", name, e);
            }
        }
    }
}

fn parse_sequence(name: &str) -> Option<u64> {
    name.strip_prefix(SNAPSHOT_PREFIX)?
        .strip_suffix(SNAPSHOT_SUFFIX)?
        .parse()
        .ok()
}

#[cfg(unix)]
fn sync_dir(dir: &Path) {
    if let Ok(handle) = File::open(dir) {
        let _ = handle.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::IndexEntry;
    use tempfile::TempDir;

    fn index(texts: &[&str]) -> VectorIndex {
        VectorIndex::new(
            "hashing-4",
            4,
            texts
                .iter()
                .map(|t| IndexEntry {
                    text: t.to_string(),
                    embedding: vec![1.0, 0.0, 0.0, 0.0],
                })
                .collect(),
        )
    }

    #[test]
    fn test_missing_manifest_loads_nothing() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path().join("vectorstore_alumni"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn test_publish_then_load() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        let manifest = store.publish(&index(&["Name: Arjun Sharma"])).unwrap();
        assert_eq!(manifest.sequence, 1);
        assert_eq!(manifest.snapshot, "snapshot-1.json");

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded.model(), "hashing-4");
        assert_eq!(loaded.entries()[0].text, "Name: Arjun Sharma");
    }

    #[test]
    fn test_keeps_previous_snapshot_as_backup() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());

        store.publish(&index(&["a"])).unwrap();
        store.publish(&index(&["a", "b"])).unwrap();
        let manifest = store.publish(&index(&["a", "b", "c"])).unwrap();
        assert_eq!(manifest.sequence, 3);

        let mut files = store.snapshot_files().unwrap();
        files.sort();
        assert_eq!(files, vec!["snapshot-2.json", "snapshot-3.json"]);
        assert_eq!(store.load().unwrap().unwrap().len(), 3);
    }

    #[test]
    fn test_interrupted_write_keeps_published_snapshot() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        store.publish(&index(&["a", "b"])).unwrap();

        // half-written files left behind by a crash are never read
        fs::write(dir.path().join("snapshot-2.json.tmp"), b"{\"entries\": [").unwrap();
        fs::write(dir.path().join("CURRENT.tmp"), b"{").unwrap();

        assert_eq!(store.load().unwrap().unwrap().len(), 2);

        // and are cleaned up by the next publish
        store.publish(&index(&["a", "b", "c"])).unwrap();
        assert!(!dir.path().join("snapshot-2.json.tmp").exists());
        assert_eq!(store.load().unwrap().unwrap().len(), 3);
    }

    #[test]
    fn test_corrupt_snapshot_is_an_error() {
        let dir = TempDir::new().unwrap();
        let store = SnapshotStore::new(dir.path());
        let manifest = store.publish(&index(&["a"])).unwrap();

        fs::write(dir.path().join(&manifest.snapshot), b"not json").unwrap();
        assert!(matches!(store.load(), Err(Error::Persistence(_))));
    }
}
