use crate::domain::fare::FareSnapshot;
use crate::error::CheckerError;
use crate::storage::SnapshotStore;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use uuid::Uuid;

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PersistedSnapshot {
    version: u32,
    saved_at: DateTime<Utc>,
    run_id: Uuid,
    offers: FareSnapshot,
}

/// Pretty-printed JSON file holding the last accepted snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the stored snapshot; `Ok(None)` when the file does not exist yet.
    pub fn try_load(&self) -> Result<Option<FareSnapshot>, CheckerError> {
        let corrupt = |detail: String| CheckerError::PersistenceCorrupt {
            path: self.path.clone(),
            detail,
        };

        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(corrupt(e.to_string())),
        };

        let persisted: PersistedSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| corrupt(e.to_string()))?;
        if persisted.version != FORMAT_VERSION {
            return Err(corrupt(format!(
                "unsupported snapshot version {}",
                persisted.version
            )));
        }

        tracing::debug!(
            path = %self.path.display(),
            run_id = %persisted.run_id,
            saved_at = %persisted.saved_at,
            offers = persisted.offers.len(),
            "loaded previous fare snapshot"
        );
        Ok(Some(persisted.offers))
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn load(&self) -> FareSnapshot {
        match self.try_load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no previous fare snapshot");
                FareSnapshot::empty()
            }
            Err(err) => {
                tracing::warn!(error = %err, "ignoring unreadable fare snapshot");
                FareSnapshot::empty()
            }
        }
    }

    fn save(&self, snapshot: &FareSnapshot, run_id: Uuid) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        let persisted = PersistedSnapshot {
            version: FORMAT_VERSION,
            saved_at: Utc::now(),
            run_id,
            offers: snapshot.clone(),
        };
        let bytes =
            serde_json::to_vec_pretty(&persisted).context("failed to serialize fare snapshot")?;

        // Write to a sibling temp file, then rename over the target.
        let tmp_path = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp_path)
                .with_context(|| format!("failed to create {}", tmp_path.display()))?;
            file.write_all(&bytes)
                .with_context(|| format!("failed to write {}", tmp_path.display()))?;
            file.sync_all()
                .with_context(|| format!("failed to sync {}", tmp_path.display()))?;
        }
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "failed to move {} into place at {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        tracing::debug!(path = %self.path.display(), offers = snapshot.len(), "saved fare snapshot");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::fare::tests::offer;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;

    fn sample() -> FareSnapshot {
        FareSnapshot::new(vec![
            offer("2024-03-05", Decimal::new(4200, 2)),
            offer("2024-01-10", Decimal::new(3800, 2)).with_converted(Some(Decimal::new(114000, 2))),
        ])
    }

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("snapshot.json"));
        assert!(store.try_load().unwrap().is_none());
        assert!(store.load().is_empty());
    }

    #[test]
    fn save_then_load_round_trips_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("nested/snapshot.json"));
        let snapshot = sample();

        store.save(&snapshot, Uuid::new_v4()).unwrap();
        assert_eq!(store.load(), snapshot);
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn save_replaces_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("snapshot.json"));
        store.save(&sample(), Uuid::new_v4()).unwrap();
        store.save(&FareSnapshot::empty(), Uuid::new_v4()).unwrap();
        assert_eq!(store.try_load().unwrap(), Some(FareSnapshot::empty()));
    }

    #[test]
    fn corrupt_file_degrades_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        fs::write(&path, b"{\"version\":1,\"offers\":[{\"date\":").unwrap();

        let store = JsonFileSnapshotStore::new(&path);
        assert!(matches!(
            store.try_load(),
            Err(CheckerError::PersistenceCorrupt { .. })
        ));
        assert!(store.load().is_empty());
    }

    #[test]
    fn unknown_version_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");
        let body = serde_json::json!({
            "version": 99,
            "saved_at": "2024-01-01T00:00:00Z",
            "run_id": Uuid::nil(),
            "offers": []
        });
        fs::write(&path, body.to_string()).unwrap();

        let store = JsonFileSnapshotStore::new(&path);
        assert!(store.try_load().is_err());
        assert!(store.load().is_empty());
    }

    #[test]
    fn persisted_file_is_human_readable_json() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileSnapshotStore::new(dir.path().join("snapshot.json"));
        store.save(&sample(), Uuid::nil()).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v["version"], 1);
        assert_eq!(v["offers"][0]["date"], "2024-01-10");
        assert_eq!(v["offers"][0]["price_source"], "38.00");
        assert_eq!(v["offers"][0]["price_converted"], "1140.00");
        assert!(v["offers"][1]["price_converted"].is_null());
    }
}
