use crate::ports::outbound::SnapshotRepository;
use crate::reference_index::domain::IndexSnapshot;
use crate::shared::error::IndexError;
use crate::shared::security::{read_regular_file, validate_not_symlink};
use crate::shared::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// JsonSnapshotRepository adapter storing the index as one JSON file
///
/// Writes go to a temporary file in the same directory which is then
/// renamed over the target, so a crash mid-write never leaves a truncated
/// snapshot behind. The file is compact, one JSON document per line.
pub struct JsonSnapshotRepository {
    path: PathBuf,
}

impl JsonSnapshotRepository {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn corrupt(&self, details: impl Into<String>) -> Option<IndexSnapshot> {
        let error = IndexError::CorruptSnapshot {
            path: self.path.clone(),
            details: details.into(),
        };
        warn!(%error, "discarding index snapshot");
        None
    }

    fn write_error(&self, details: impl Into<String>) -> anyhow::Error {
        IndexError::SnapshotWriteError {
            path: self.path.clone(),
            details: details.into(),
        }
        .into()
    }
}

impl SnapshotRepository for JsonSnapshotRepository {
    fn load(&self) -> Option<IndexSnapshot> {
        if fs::symlink_metadata(&self.path).is_err() {
            debug!(path = %self.path.display(), "no index snapshot found");
            return None;
        }

        let content = match read_regular_file(&self.path, "index snapshot") {
            Ok(content) => content,
            Err(e) => return self.corrupt(e.to_string()),
        };

        match serde_json::from_str::<IndexSnapshot>(&content) {
            Ok(snapshot) => {
                debug!(
                    path = %self.path.display(),
                    records = snapshot.records.len(),
                    fresh = snapshot.fresh,
                    "loaded index snapshot"
                );
                Some(snapshot)
            }
            Err(e) => self.corrupt(e.to_string()),
        }
    }

    fn save(&self, snapshot: &IndexSnapshot) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            self.write_error(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;

        if fs::symlink_metadata(&self.path).is_ok() {
            validate_not_symlink(&self.path, "write")
                .map_err(|e| self.write_error(e.to_string()))?;
        }

        let mut file = NamedTempFile::new_in(&parent)
            .map_err(|e| self.write_error(format!("Failed to create temporary file: {}", e)))?;
        let mut writer = std::io::BufWriter::new(&mut file);
        serde_json::to_writer(&mut writer, snapshot)
            .map_err(|e| self.write_error(format!("Failed to serialize snapshot: {}", e)))?;
        writer
            .write_all(b"\n")
            .and_then(|_| writer.flush())
            .map_err(|e| self.write_error(e.to_string()))?;
        drop(writer);
        file.persist(&self.path)
            .map_err(|e| self.write_error(e.error.to_string()))?;

        debug!(
            path = %self.path.display(),
            records = snapshot.records.len(),
            "saved index snapshot"
        );
        Ok(())
    }

    fn location(&self) -> Option<&Path> {
        Some(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference_index::domain::{AssetId, IndexStore};
    use tempfile::TempDir;

    fn id(s: &str) -> AssetId {
        AssetId::new(s).unwrap()
    }

    fn sample_snapshot() -> IndexSnapshot {
        let mut store = IndexStore::new();
        store.upsert(id("Assets/a.prefab"), vec![id("Assets/b.mat")]);
        store.upsert(id("Assets/b.mat"), vec![]);
        store.set_fresh(true);
        store.to_snapshot()
    }

    #[test]
    fn test_missing_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonSnapshotRepository::new(temp_dir.path().join("index.json"));
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonSnapshotRepository::new(temp_dir.path().join("nested/dir/index.json"));
        let snapshot = sample_snapshot();

        repo.save(&snapshot).unwrap();
        let loaded = repo.load().unwrap();
        assert_eq!(loaded.records, snapshot.records);
        assert!(loaded.fresh);
        assert_eq!(repo.location(), Some(repo.path()));
    }

    #[test]
    fn test_save_writes_compact_json() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        let repo = JsonSnapshotRepository::new(&path);
        repo.save(&sample_snapshot()).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(content.lines().count(), 1);
        assert!(content.contains("\"fresh\":true"));
        assert_eq!(repo.load().unwrap().records.len(), 2);
    }

    #[test]
    fn test_corrupt_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        fs::write(&path, "{ not json").unwrap();

        let repo = JsonSnapshotRepository::new(&path);
        assert!(repo.load().is_none());
    }

    #[test]
    fn test_directory_in_place_of_file_loads_none() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("index.json");
        fs::create_dir(&path).unwrap();

        assert!(JsonSnapshotRepository::new(&path).load().is_none());
    }

    #[test]
    fn test_save_overwrites_previous_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonSnapshotRepository::new(temp_dir.path().join("index.json"));
        repo.save(&sample_snapshot()).unwrap();
        repo.save(&IndexSnapshot::default()).unwrap();

        let loaded = repo.load().unwrap();
        assert!(loaded.records.is_empty());
        assert!(!loaded.fresh);
    }

    #[cfg(unix)]
    #[test]
    fn test_save_refuses_symlink_target() {
        let temp_dir = TempDir::new().unwrap();
        let real = temp_dir.path().join("real.json");
        fs::write(&real, "{}").unwrap();
        let link = temp_dir.path().join("index.json");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let repo = JsonSnapshotRepository::new(&link);
        let err = repo.save(&sample_snapshot()).unwrap_err();
        assert!(err.to_string().contains("Failed to write index snapshot"));
        assert!(repo.load().is_none());
    }
}
