//! Error types shared across the organizer.
//!
//! Errors fall into two groups:
//! - Fatal errors ([`OrganizeError`]) abort a run before any file is touched.
//! - Per-file errors ([`FileError`]) are recorded in the run report and the
//!   run carries on with the remaining files.

use crate::config::ConfigError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal errors that stop a run.
#[derive(Debug, Error)]
pub enum OrganizeError {
    /// Configuration could not be loaded or validated.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The target directory is missing, not a directory, or unreadable.
    #[error("Invalid target directory {}: {reason}", .path.display())]
    InvalidTarget { path: PathBuf, reason: String },

    /// The destination override exists but is not a directory.
    #[error("Invalid destination {}: {reason}", .path.display())]
    InvalidDestination { path: PathBuf, reason: String },

    /// The backup manifest could not be written or read.
    #[error(transparent)]
    History(#[from] HistoryError),
}

/// Result type for fatal organizer operations.
pub type OrganizeResult<T> = Result<T, OrganizeError>;

/// Errors raised while reading or writing the backup manifest.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Failed to write backup manifest {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("Failed to read backup manifest {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("Invalid backup manifest format: {0}")]
    Format(#[from] serde_json::Error),

    #[error("No previous organization found to undo in {}", .0.display())]
    Missing(PathBuf),
}

/// Classification of a per-file failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileErrorKind {
    PermissionDenied,
    NameTooLong,
    StorageFull,
    DestinationExists,
    NotFound,
    Other,
}

impl FileErrorKind {
    /// Maps an IO error onto the per-file taxonomy.
    pub fn classify(error: &io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::PermissionDenied | io::ErrorKind::ReadOnlyFilesystem => {
                Self::PermissionDenied
            }
            io::ErrorKind::InvalidFilename => Self::NameTooLong,
            io::ErrorKind::StorageFull | io::ErrorKind::QuotaExceeded => Self::StorageFull,
            io::ErrorKind::AlreadyExists => Self::DestinationExists,
            io::ErrorKind::NotFound => Self::NotFound,
            _ => Self::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "permission denied",
            Self::NameTooLong => "name too long",
            Self::StorageFull => "destination full",
            Self::DestinationExists => "destination exists",
            Self::NotFound => "not found",
            Self::Other => "io error",
        }
    }
}

/// A failure to place one file. Recorded, never fatal.
#[derive(Debug, Error)]
#[error("{} -> {} ({}): {source}", .source_path.display(), .destination.display(), .kind.label())]
pub struct FileError {
    pub source_path: PathBuf,
    pub destination: PathBuf,
    pub kind: FileErrorKind,
    #[source]
    pub source: io::Error,
}

impl FileError {
    pub fn new(source_path: PathBuf, destination: PathBuf, source: io::Error) -> Self {
        Self {
            kind: FileErrorKind::classify(&source),
            source_path,
            destination,
            source,
        }
    }
}
