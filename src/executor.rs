//! Plan execution strategies.
//!
//! The file manager hands every transfer entry to an [`Executor`]. Live runs
//! use [`FsExecutor`]; dry runs use [`DryRunExecutor`], which never touches
//! the filesystem.

use crate::error::FileError;
use crate::plan::PlanEntry;
use std::fs;
use std::io;
use std::path::Path;

/// How files reach their destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferMode {
    #[default]
    Move,
    Copy,
}

/// Carries out a single plan entry.
pub trait Executor {
    /// Performs the transfer described by `entry`.
    fn transfer(&mut self, entry: &PlanEntry) -> Result<(), FileError>;

    /// True for executors that never mutate the filesystem.
    fn is_dry_run(&self) -> bool {
        false
    }
}

/// Accepts every entry without performing it.
#[derive(Debug, Default)]
pub struct DryRunExecutor;

impl Executor for DryRunExecutor {
    fn transfer(&mut self, entry: &PlanEntry) -> Result<(), FileError> {
        tracing::debug!(
            source = %entry.source.display(),
            destination = %entry.destination.display(),
            "would transfer"
        );
        Ok(())
    }

    fn is_dry_run(&self) -> bool {
        true
    }
}

/// Moves or copies files on disk.
#[derive(Debug, Default)]
pub struct FsExecutor {
    mode: TransferMode,
}

impl FsExecutor {
    pub fn new(mode: TransferMode) -> Self {
        Self { mode }
    }
}

impl Executor for FsExecutor {
    fn transfer(&mut self, entry: &PlanEntry) -> Result<(), FileError> {
        let fail = |e: io::Error| FileError::new(entry.source.clone(), entry.destination.clone(), e);

        if let Some(parent) = entry.destination.parent() {
            fs::create_dir_all(parent).map_err(fail)?;
        }

        // The plan was computed against a snapshot; never replace anything
        // that appeared since.
        if fs::symlink_metadata(&entry.destination).is_ok() {
            return Err(fail(io::Error::new(
                io::ErrorKind::AlreadyExists,
                "destination already exists",
            )));
        }

        let result = match self.mode {
            TransferMode::Move => move_file(&entry.source, &entry.destination),
            TransferMode::Copy => copy_file(&entry.source, &entry.destination),
        };
        result.map_err(fail)
    }
}

/// Renames a file, falling back to copy and remove across filesystems.
pub fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!(
                source = %source.display(),
                "rename crosses devices, copying instead"
            );
            copy_then_remove(source, destination)
        }
        Err(e) => Err(e),
    }
}

/// Copies `source` to `destination`, then removes `source`.
///
/// If the source cannot be removed the copy is deleted again, so the file
/// exists in exactly one place either way.
pub fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    copy_file(source, destination)?;
    fs::remove_file(source).map_err(|e| discard_partial(destination, e))
}

/// Copies a file and carries over its modification time.
///
/// A destination left behind by a failed copy is removed.
pub fn copy_file(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination).map_err(|e| discard_partial(destination, e))?;
    let modified = fs::metadata(source).and_then(|meta| meta.modified());
    if let Ok(modified) = modified {
        let result = fs::File::options()
            .write(true)
            .open(destination)
            .and_then(|file| file.set_modified(modified));
        if let Err(e) = result {
            tracing::debug!(
                destination = %destination.display(),
                error = %e,
                "could not preserve modification time"
            );
        }
    }
    Ok(())
}

/// Removes a regular file written by a failed transfer and returns `error`.
fn discard_partial(destination: &Path, error: io::Error) -> io::Error {
    let is_file = fs::symlink_metadata(destination).is_ok_and(|meta| meta.is_file());
    if is_file && let Err(e) = fs::remove_file(destination) {
        tracing::warn!(
            destination = %destination.display(),
            error = %e,
            "could not remove partial file"
        );
    }
    error
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FileErrorKind;
    use crate::plan::Action;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn entry(source: PathBuf, destination: PathBuf) -> PlanEntry {
        PlanEntry {
            source,
            destination,
            bucket: "Documents".to_string(),
            action: Action::Move,
            size: 0,
        }
    }

    #[test]
    fn test_move_creates_parent_directories() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "content").unwrap();
        let destination = temp_dir.path().join("2024").join("03").join("notes.txt");

        let mut executor = FsExecutor::new(TransferMode::Move);
        executor
            .transfer(&entry(source.clone(), destination.clone()))
            .expect("move failed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }

    #[test]
    fn test_copy_keeps_source() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "content").unwrap();
        let destination = temp_dir.path().join("Documents").join("notes.txt");

        let mut executor = FsExecutor::new(TransferMode::Copy);
        executor
            .transfer(&entry(source.clone(), destination.clone()))
            .expect("copy failed");

        assert!(source.exists());
        assert!(destination.exists());
    }

    #[test]
    fn test_existing_destination_is_never_overwritten() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "new").unwrap();
        let dest_dir = temp_dir.path().join("Documents");
        fs::create_dir(&dest_dir).unwrap();
        let destination = dest_dir.join("notes.txt");
        fs::write(&destination, "old").unwrap();

        let mut executor = FsExecutor::default();
        let err = executor
            .transfer(&entry(source.clone(), destination.clone()))
            .unwrap_err();

        assert_eq!(err.kind, FileErrorKind::DestinationExists);
        assert_eq!(fs::read_to_string(&destination).unwrap(), "old");
        assert!(source.exists());
    }

    #[test]
    fn test_missing_source_is_file_error() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("gone.txt");
        let destination = temp_dir.path().join("Documents").join("gone.txt");

        let mut executor = FsExecutor::default();
        let err = executor.transfer(&entry(source, destination)).unwrap_err();
        assert_eq!(err.kind, FileErrorKind::NotFound);
    }

    #[test]
    fn test_dry_run_executor_touches_nothing() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "content").unwrap();
        let destination = temp_dir.path().join("Documents").join("notes.txt");

        let mut executor = DryRunExecutor;
        executor
            .transfer(&entry(source.clone(), destination.clone()))
            .unwrap();

        assert!(executor.is_dry_run());
        assert!(source.exists());
        assert!(!temp_dir.path().join("Documents").exists());
    }

    #[test]
    fn test_copy_then_remove() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("notes.txt");
        fs::write(&source, "content").unwrap();
        let destination = temp_dir.path().join("notes (moved).txt");

        copy_then_remove(&source, &destination).expect("move failed");

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "content");
    }

    #[test]
    fn test_failed_copy_leaves_no_destination() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let destination = temp_dir.path().join("copy.txt");

        let err = copy_file(&temp_dir.path().join("gone.txt"), &destination).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!destination.exists());
    }

    #[test]
    fn test_discard_partial_removes_only_regular_files() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let partial = temp_dir.path().join("partial.bin");
        fs::write(&partial, "trunc").unwrap();

        let err = discard_partial(&partial, io::Error::from(io::ErrorKind::StorageFull));
        assert_eq!(err.kind(), io::ErrorKind::StorageFull);
        assert!(!partial.exists());

        let dir = temp_dir.path().join("folder");
        fs::create_dir(&dir).unwrap();
        discard_partial(&dir, io::Error::other("boom"));
        assert!(dir.is_dir());
    }
}
