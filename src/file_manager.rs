//! Directory scanning, destination planning and plan execution.
//!
//! A run moves through [`RunState`]s: the target is scanned, a [`Plan`] is
//! computed against a snapshot of each destination directory, and the plan
//! is handed to an [`Executor`]. Dry runs use an executor that does nothing,
//! so the planning code is the same in both modes.

use crate::conflict::{ConflictPolicy, resolve_name};
use crate::config::CompiledConfig;
use crate::date_organizer::{DateFormat, DateOrganizer};
use crate::error::{FileError, OrganizeError, OrganizeResult};
use crate::executor::{Executor, TransferMode};
use crate::history::HISTORY_FILE;
use crate::plan::{Action, BucketStats, Plan, PlanEntry, SkipReason};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;
use tracing::{debug, warn};
use walkdir::WalkDir;

/// How destinations are derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrganizeMode {
    /// By extension category.
    #[default]
    Type,
    /// By modification date.
    Date,
}

impl fmt::Display for OrganizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Type => f.write_str("type"),
            Self::Date => f.write_str("date"),
        }
    }
}

impl FromStr for OrganizeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "type" => Ok(Self::Type),
            "date" => Ok(Self::Date),
            other => Err(format!("unknown mode '{other}', expected type or date")),
        }
    }
}

/// Lifecycle of a single run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Scanning,
    Planning,
    DryRunReport,
    Executing,
    Completed,
    CompletedWithErrors,
}

impl RunState {
    /// Whether `next` may follow `self`.
    pub fn can_advance_to(self, next: RunState) -> bool {
        use RunState::{
            Completed, CompletedWithErrors, DryRunReport, Executing, Planning, Scanning,
        };
        matches!(
            (self, next),
            (Scanning, Planning)
                | (Planning, DryRunReport)
                | (Planning, Executing)
                | (DryRunReport, Completed)
                | (Executing, Completed)
                | (Executing, CompletedWithErrors)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::CompletedWithErrors)
    }
}

/// A regular file found by the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScannedFile {
    pub path: PathBuf,
    /// Path relative to the scanned directory.
    pub relative: PathBuf,
    pub name: String,
    pub modified: Option<SystemTime>,
    pub size: u64,
}

/// Options controlling scanning and placement.
#[derive(Debug, Clone, Default)]
pub struct ManagerOptions {
    pub mode: OrganizeMode,
    pub date_format: DateFormat,
    pub recursive: bool,
    /// Root for category or date folders. Defaults to the target directory.
    pub destination: Option<PathBuf>,
    pub conflict: ConflictPolicy,
    pub transfer: TransferMode,
}

/// Outcome of executing a plan.
#[derive(Debug)]
pub struct RunReport {
    pub state: RunState,
    pub dry_run: bool,
    /// Files considered by the plan.
    pub planned: usize,
    /// Transfers that finished (or would, in a dry run).
    pub transferred: usize,
    /// Transfers placed under a disambiguated name.
    pub renamed: usize,
    pub skipped: usize,
    /// Destinations that were already taken.
    pub conflicts: usize,
    /// Sources of the transfers that finished.
    pub completed: Vec<PathBuf>,
    pub failures: Vec<FileError>,
    /// Completed transfers per bucket.
    pub buckets: BTreeMap<String, BucketStats>,
}

impl RunReport {
    pub fn has_errors(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 0 on full success, 1 if any file failed.
    pub fn exit_code(&self) -> u8 {
        if self.has_errors() { 1 } else { 0 }
    }
}

/// Validates that `target` is a readable directory and returns its canonical path.
pub fn validate_target(target: &Path) -> OrganizeResult<PathBuf> {
    let invalid = |reason: String| OrganizeError::InvalidTarget {
        path: target.to_path_buf(),
        reason,
    };

    let metadata = fs::metadata(target).map_err(|e| invalid(e.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }
    fs::read_dir(target).map_err(|e| invalid(format!("not readable: {e}")))?;
    fs::canonicalize(target).map_err(|e| invalid(e.to_string()))
}

/// Resolves the destination root, which need not exist yet.
pub fn resolve_destination(target: &Path, destination: Option<&Path>) -> OrganizeResult<PathBuf> {
    let Some(destination) = destination else {
        return Ok(target.to_path_buf());
    };
    let invalid = |reason: String| OrganizeError::InvalidDestination {
        path: destination.to_path_buf(),
        reason,
    };

    match fs::metadata(destination) {
        Ok(meta) if meta.is_dir() => fs::canonicalize(destination).map_err(|e| invalid(e.to_string())),
        Ok(_) => Err(invalid("not a directory".to_string())),
        Err(_) => std::path::absolute(destination).map_err(|e| invalid(e.to_string())),
    }
}

/// Names present in `dir`, or none if it does not exist yet.
fn list_names(dir: &Path) -> HashSet<String> {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .flatten()
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect(),
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(dir = %dir.display(), error = %e, "could not list destination directory");
            }
            HashSet::new()
        }
    }
}

/// The core organizer: scan, plan, execute.
pub struct FileManager<'a> {
    config: &'a CompiledConfig,
    options: ManagerOptions,
    date_organizer: DateOrganizer,
}

impl<'a> FileManager<'a> {
    pub fn new(config: &'a CompiledConfig, options: ManagerOptions) -> Self {
        let date_organizer = DateOrganizer::new(options.date_format);
        Self {
            config,
            options,
            date_organizer,
        }
    }

    /// Enumerates files under `target` in file-name order.
    ///
    /// Only regular files are returned; symlinks are not followed. Hidden
    /// directories are not descended into unless hidden files are enabled.
    /// `target` must already be validated.
    pub fn scan(&self, target: &Path) -> Vec<ScannedFile> {
        let max_depth = if self.options.recursive { usize::MAX } else { 1 };
        let hidden_enabled = self.config.filters.hidden_enabled();

        let walker = WalkDir::new(target)
            .min_depth(1)
            .max_depth(max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                hidden_enabled
                    || entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry.file_name().to_string_lossy().starts_with('.')
            });

        let mut files = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(error = %e, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if entry.depth() == 1 && name == HISTORY_FILE {
                continue;
            }

            let relative = entry
                .path()
                .strip_prefix(target)
                .unwrap_or(entry.path())
                .to_path_buf();
            if !self.config.filters.should_include(&relative) {
                debug!(file = %relative.display(), "excluded by filters");
                continue;
            }

            let metadata = entry.metadata().ok();
            files.push(ScannedFile {
                path: entry.path().to_path_buf(),
                relative,
                name,
                modified: metadata.as_ref().and_then(|m| m.modified().ok()),
                size: metadata.as_ref().map_or(0, |m| m.len()),
            });
        }

        debug!(count = files.len(), "scan finished");
        files
    }

    /// Category of a file, consulting file content when enabled and needed.
    pub fn category_of(&self, file: &ScannedFile) -> String {
        let mapper = &self.config.mapper;
        let category = mapper.category_for(&file.name);
        if category != mapper.default_category() || !self.config.detect_content {
            return category.to_string();
        }

        match infer::get_from_path(&file.path) {
            Ok(Some(kind)) => match mapper.category_for_extension(kind.extension()) {
                Some(sniffed) => {
                    debug!(
                        file = %file.name,
                        mime = kind.mime_type(),
                        category = sniffed,
                        "categorized by content"
                    );
                    sniffed.to_string()
                }
                None => category.to_string(),
            },
            Ok(None) => category.to_string(),
            Err(e) => {
                debug!(file = %file.name, error = %e, "could not read file header");
                category.to_string()
            }
        }
    }

    /// Bucket name and destination directory for a file.
    pub fn destination_for(&self, file: &ScannedFile, root: &Path) -> (String, PathBuf) {
        match self.options.mode {
            OrganizeMode::Type => {
                let category = self.category_of(file);
                let dir = root.join(&category);
                (category, dir)
            }
            OrganizeMode::Date => {
                let segment = self.date_organizer.segment_for(file.modified);
                let dir = root.join(DateOrganizer::relative_dir(&segment));
                (segment, dir)
            }
        }
    }

    /// Computes the plan for scanned files.
    ///
    /// Each destination directory is listed once; names claimed by earlier
    /// entries are added to that snapshot so two files never get the same
    /// destination. Nothing is written.
    pub fn plan(&self, files: &[ScannedFile], destination_root: &Path) -> Plan {
        let mut plan = Plan::new(destination_root.to_path_buf());
        let mut snapshots: HashMap<PathBuf, HashSet<String>> = HashMap::new();

        for file in files {
            let (bucket, dest_dir) = self.destination_for(file, destination_root);

            if file.path.parent() == Some(dest_dir.as_path()) {
                debug!(file = %file.relative.display(), "already organized");
                plan.push(PlanEntry {
                    source: file.path.clone(),
                    destination: file.path.clone(),
                    bucket,
                    action: Action::Skip(SkipReason::AlreadyOrganized),
                    size: file.size,
                });
                continue;
            }

            let taken = snapshots
                .entry(dest_dir.clone())
                .or_insert_with(|| list_names(&dest_dir));
            let resolved = resolve_name(taken, &file.name);

            let action = if resolved == file.name {
                Action::Move
            } else if self.options.conflict == ConflictPolicy::Skip {
                debug!(file = %file.relative.display(), "destination taken, skipping");
                plan.push(PlanEntry {
                    source: file.path.clone(),
                    destination: dest_dir.join(&file.name),
                    bucket,
                    action: Action::Skip(SkipReason::Conflict),
                    size: file.size,
                });
                continue;
            } else {
                debug!(file = %file.relative.display(), resolved = %resolved, "destination taken, renaming");
                Action::Rename {
                    original_name: file.name.clone(),
                }
            };

            taken.insert(resolved.clone());
            plan.push(PlanEntry {
                source: file.path.clone(),
                destination: dest_dir.join(resolved),
                bucket,
                action,
                size: file.size,
            });
        }

        plan
    }

    /// Runs every transfer in `plan` through `executor`.
    ///
    /// A failing entry is recorded and the remaining entries still run.
    /// `observe` is called once per entry, skips included.
    pub fn execute<E, F>(&self, plan: &Plan, executor: &mut E, mut observe: F) -> RunReport
    where
        E: Executor + ?Sized,
        F: FnMut(&PlanEntry, Option<&FileError>),
    {
        let dry_run = executor.is_dry_run();
        let mut completed = Vec::new();
        let mut failures = Vec::new();
        let mut buckets: BTreeMap<String, BucketStats> = BTreeMap::new();
        let mut renamed = 0;

        for entry in &plan.entries {
            if !entry.is_transfer() {
                observe(entry, None);
                continue;
            }

            match executor.transfer(entry) {
                Ok(()) => {
                    if matches!(entry.action, Action::Rename { .. }) {
                        renamed += 1;
                    }
                    buckets.entry(entry.bucket.clone()).or_default().add(entry.size);
                    completed.push(entry.source.clone());
                    observe(entry, None);
                }
                Err(e) => {
                    warn!(error = %e, "failed to organize file");
                    observe(entry, Some(&e));
                    failures.push(e);
                }
            }
        }

        let state = if failures.is_empty() {
            RunState::Completed
        } else {
            RunState::CompletedWithErrors
        };

        RunReport {
            state,
            dry_run,
            planned: plan.len(),
            transferred: completed.len(),
            renamed,
            skipped: plan.skip_count(),
            conflicts: plan.conflict_count(),
            completed,
            failures,
            buckets,
        }
    }
}
