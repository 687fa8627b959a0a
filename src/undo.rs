/// Reverting the last organization run.
///
/// Undo reads the backup manifest of a directory and moves every completed
/// entry back, most recent first. A file that is gone from its recorded
/// location is skipped. When the original location has been reoccupied the
/// file is restored next to it under a disambiguated name.
use crate::conflict::resolve_name;
use crate::error::{HistoryError, OrganizeError, OrganizeResult};
use crate::executor::move_file;
use crate::history::{BackupEntry, BackupManifest};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Represents the result of an undo operation.
#[derive(Debug, Default)]
pub struct UndoReport {
    /// Number of files successfully restored.
    pub restored_files: usize,
    /// Files restored under a different name, as (restored path, occupied original).
    pub renamed: Vec<(PathBuf, PathBuf)>,
    /// Files that were skipped because they are no longer where we put them.
    pub skipped_files: Vec<(PathBuf, String)>,
    /// Files that could not be moved back.
    pub failed_restores: Vec<(PathBuf, String)>,
    /// Whether the manifest was removed afterwards.
    pub history_cleared: bool,
}

impl UndoReport {
    /// Returns the total number of entries processed.
    pub fn total_processed(&self) -> usize {
        self.restored_files + self.failed_restores.len() + self.skipped_files.len()
    }

    /// Returns true if every entry was restored.
    pub fn is_complete_success(&self) -> bool {
        self.failed_restores.is_empty() && self.skipped_files.is_empty()
    }
}

enum Restored {
    InPlace,
    Renamed(PathBuf),
}

/// Manages undo operations for file organization.
pub struct UndoManager;

impl UndoManager {
    /// Undoes the most recent organization of `base_path`.
    ///
    /// Returns an error if the directory does not exist or has no readable
    /// manifest. Per-file problems are collected in the report. The manifest
    /// is deleted only when every entry was restored.
    ///
    /// ```no_run
    /// use fileorg::undo::UndoManager;
    /// use std::path::Path;
    ///
    /// match UndoManager::undo(Path::new("/path/to/directory")) {
    ///     Ok(report) => println!("Restored {} files", report.restored_files),
    ///     Err(e) => eprintln!("Undo failed: {e}"),
    /// }
    /// ```
    pub fn undo(base_path: &Path) -> OrganizeResult<UndoReport> {
        if !base_path.is_dir() {
            return Err(OrganizeError::InvalidTarget {
                path: base_path.to_path_buf(),
                reason: "directory does not exist".to_string(),
            });
        }
        let base_path = fs::canonicalize(base_path).map_err(|e| OrganizeError::InvalidTarget {
            path: base_path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let mut manifest = BackupManifest::load(&base_path)?
            .ok_or_else(|| HistoryError::Missing(base_path.clone()))?;

        let mut report = UndoReport::default();
        let mut restored = Vec::new();
        for entry in manifest.completed().rev() {
            match Self::restore_file(entry) {
                Ok(Restored::InPlace) => {
                    debug!(file = %entry.original_path.display(), "restored");
                    report.restored_files += 1;
                    restored.push(entry.original_path.clone());
                }
                Ok(Restored::Renamed(path)) => {
                    debug!(file = %path.display(), "restored under a new name");
                    report.restored_files += 1;
                    report.renamed.push((path, entry.original_path.clone()));
                    restored.push(entry.original_path.clone());
                }
                Err(Failure::Missing(path, reason)) => report.skipped_files.push((path, reason)),
                Err(Failure::Io(path, reason)) => report.failed_restores.push((path, reason)),
            }
            if let Some(dir) = entry.new_path.parent() {
                Self::remove_empty_dirs(dir, &manifest.destination_root);
            }
        }

        if report.is_complete_success() {
            match BackupManifest::delete(&base_path) {
                Ok(()) => report.history_cleared = true,
                Err(e) => warn!(error = %e, "could not delete backup manifest"),
            }
        } else {
            // Keep only the entries still waiting to be undone.
            for original in &restored {
                manifest.mark_restored(original);
            }
            if let Err(e) = manifest.save() {
                warn!(error = %e, "could not update backup manifest");
            }
        }

        Ok(report)
    }

    fn restore_file(entry: &BackupEntry) -> Result<Restored, Failure> {
        if fs::symlink_metadata(&entry.new_path).is_err() {
            return Err(Failure::Missing(
                entry.new_path.clone(),
                "File not found at expected location".to_string(),
            ));
        }

        let parent = entry
            .original_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        fs::create_dir_all(&parent).map_err(|e| {
            Failure::Io(
                entry.new_path.clone(),
                format!("Could not recreate {}: {e}", parent.display()),
            )
        })?;

        let (target, restored) = if fs::symlink_metadata(&entry.original_path).is_ok() {
            let file_name = entry
                .original_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let taken: HashSet<String> = fs::read_dir(&parent)
                .map(|entries| {
                    entries
                        .flatten()
                        .map(|e| e.file_name().to_string_lossy().into_owned())
                        .collect()
                })
                .unwrap_or_default();
            let path = parent.join(resolve_name(&taken, &file_name));
            (path.clone(), Restored::Renamed(path))
        } else {
            (entry.original_path.clone(), Restored::InPlace)
        };

        move_file(&entry.new_path, &target).map_err(|e| {
            Failure::Io(
                entry.new_path.clone(),
                format!("Failed to restore file: {e}"),
            )
        })?;
        Ok(restored)
    }

    /// Removes `dir` and its parents while they are empty, stopping at `root`.
    fn remove_empty_dirs(dir: &Path, root: &Path) {
        let mut current = dir;
        while current != root && current.starts_with(root) {
            if fs::remove_dir(current).is_err() {
                break;
            }
            match current.parent() {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }
}

enum Failure {
    Missing(PathBuf, String),
    Io(PathBuf, String),
}
