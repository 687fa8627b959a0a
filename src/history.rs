/// Backup manifest for live move runs.
///
/// Before a destructive batch the planned moves are written to
/// `.fileorg_history.json` in the target directory. After the batch the file
/// is rewritten with the entries that actually completed, which is what undo
/// reverses. Only paths are recorded, never file content. This is a
/// best-effort record, not a transaction log.
use crate::error::HistoryError;
use crate::plan::Plan;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the manifest inside the target directory.
pub const HISTORY_FILE: &str = ".fileorg_history.json";

/// One recorded move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// Where the file was before the run.
    pub original_path: PathBuf,
    /// Where the file was (or would be) placed.
    pub new_path: PathBuf,
    /// Category or date segment.
    pub bucket: String,
    /// Whether the move finished.
    #[serde(default)]
    pub completed: bool,
}

/// Snapshot of one organization run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupManifest {
    /// RFC 3339 timestamp of when the snapshot was taken.
    pub timestamp: String,
    /// The directory that was organized.
    pub base_path: PathBuf,
    /// Root the category or date folders were created under.
    pub destination_root: PathBuf,
    pub entries: Vec<BackupEntry>,
}

impl BackupManifest {
    /// Captures every transfer of a plan, none completed yet.
    pub fn snapshot(base_path: &Path, plan: &Plan) -> Self {
        Self {
            timestamp: chrono::Utc::now().to_rfc3339(),
            base_path: base_path.to_path_buf(),
            destination_root: plan.destination_root.clone(),
            entries: plan
                .transfers()
                .map(|entry| BackupEntry {
                    original_path: entry.source.clone(),
                    new_path: entry.destination.clone(),
                    bucket: entry.bucket.clone(),
                    completed: false,
                })
                .collect(),
        }
    }

    /// Marks the entry for `original_path` as done.
    pub fn mark_completed(&mut self, original_path: &Path) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.original_path == original_path)
        {
            entry.completed = true;
        }
    }

    /// Marks the entry for `original_path` as reverted, so undo no longer
    /// considers it.
    pub fn mark_restored(&mut self, original_path: &Path) {
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| entry.original_path == original_path)
        {
            entry.completed = false;
        }
    }

    /// Entries whose move finished and has not been undone.
    pub fn completed(&self) -> impl DoubleEndedIterator<Item = &BackupEntry> {
        self.entries.iter().filter(|entry| entry.completed)
    }

    /// Path of the manifest for a base directory.
    pub fn path_for(base_path: &Path) -> PathBuf {
        base_path.join(HISTORY_FILE)
    }

    /// Writes the manifest as pretty JSON.
    pub fn save(&self) -> Result<PathBuf, HistoryError> {
        let path = Self::path_for(&self.base_path);
        let json = serde_json::to_string_pretty(self)?;
        fs::write(&path, json).map_err(|source| HistoryError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    /// Loads the manifest of a base directory, if one exists.
    pub fn load(base_path: &Path) -> Result<Option<Self>, HistoryError> {
        let path = Self::path_for(base_path);
        if !path.exists() {
            return Ok(None);
        }

        let json = fs::read_to_string(&path).map_err(|source| HistoryError::Read {
            path: path.clone(),
            source,
        })?;
        Ok(Some(serde_json::from_str(&json)?))
    }

    /// Deletes the manifest of a base directory.
    pub fn delete(base_path: &Path) -> Result<(), HistoryError> {
        let path = Self::path_for(base_path);
        if path.exists() {
            fs::remove_file(&path).map_err(|source| HistoryError::Write { path, source })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Action, PlanEntry, SkipReason};
    use tempfile::TempDir;

    fn sample_plan(base: &Path) -> Plan {
        let mut plan = Plan::new(base.to_path_buf());
        plan.push(PlanEntry {
            source: base.join("a.txt"),
            destination: base.join("Documents").join("a.txt"),
            bucket: "Documents".to_string(),
            action: Action::Move,
            size: 0,
        });
        plan.push(PlanEntry {
            source: base.join("Images").join("b.png"),
            destination: base.join("Images").join("b.png"),
            bucket: "Images".to_string(),
            action: Action::Skip(SkipReason::AlreadyOrganized),
            size: 0,
        });
        plan
    }

    #[test]
    fn test_snapshot_only_records_transfers() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let manifest = BackupManifest::snapshot(temp_dir.path(), &sample_plan(temp_dir.path()));

        assert_eq!(manifest.entries.len(), 1);
        assert_eq!(manifest.entries[0].bucket, "Documents");
        assert!(!manifest.entries[0].completed);
        assert_eq!(manifest.completed().count(), 0);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        let mut manifest = BackupManifest::snapshot(base, &sample_plan(base));
        manifest.mark_completed(&base.join("a.txt"));

        let path = manifest.save().expect("save failed");
        assert_eq!(path, base.join(HISTORY_FILE));

        let loaded = BackupManifest::load(base)
            .expect("load failed")
            .expect("manifest missing");
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.completed().count(), 1);
    }

    #[test]
    fn test_load_missing_is_none() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        assert!(BackupManifest::load(temp_dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_load_garbage_is_format_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join(HISTORY_FILE), "{ not json").unwrap();
        assert!(matches!(
            BackupManifest::load(temp_dir.path()),
            Err(HistoryError::Format(_))
        ));
    }

    #[test]
    fn test_delete() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();
        BackupManifest::snapshot(base, &sample_plan(base))
            .save()
            .unwrap();
        BackupManifest::delete(base).unwrap();
        assert!(!base.join(HISTORY_FILE).exists());
        BackupManifest::delete(base).unwrap();
    }
}
