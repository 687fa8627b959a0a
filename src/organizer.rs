//! Run orchestration.
//!
//! [`Organizer`] owns a compiled configuration and drives one run through
//! its states: validate, scan, plan, then either report (dry run) or execute.
//! Live move runs are bracketed by the backup manifest.

use crate::config::{CompiledConfig, OrganizerConfig};
use crate::error::{FileError, OrganizeResult};
use crate::executor::{DryRunExecutor, Executor, FsExecutor, TransferMode};
use crate::file_manager::{
    FileManager, ManagerOptions, RunReport, RunState, resolve_destination, validate_target,
};
use crate::history::BackupManifest;
use crate::plan::{Plan, PlanEntry};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Everything a run can be configured with besides the config file.
#[derive(Debug, Clone)]
pub struct OrganizeOptions {
    pub manager: ManagerOptions,
    pub dry_run: bool,
    /// Write a backup manifest before live moves.
    pub backup: bool,
}

impl Default for OrganizeOptions {
    fn default() -> Self {
        Self {
            manager: ManagerOptions::default(),
            dry_run: false,
            backup: true,
        }
    }
}

/// Receives progress while a run executes.
pub trait RunObserver {
    fn on_state(&mut self, _state: RunState) {}

    /// Called once the plan is known, before anything is executed.
    fn on_plan(&mut self, _plan: &Plan) {}

    /// Called once per plan entry, with the error if its transfer failed.
    fn on_entry(&mut self, _entry: &PlanEntry, _error: Option<&FileError>) {}
}

/// Observer that ignores everything.
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Result of a full run.
#[derive(Debug)]
pub struct RunOutcome {
    pub target: PathBuf,
    pub plan: Plan,
    pub report: RunReport,
    /// Where the backup manifest was written, if it was.
    pub manifest: Option<PathBuf>,
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        self.report.exit_code()
    }
}

pub struct Organizer {
    config: CompiledConfig,
    options: OrganizeOptions,
}

impl Organizer {
    /// Compiles `config`. Invalid configuration is fatal.
    pub fn new(config: OrganizerConfig, options: OrganizeOptions) -> OrganizeResult<Self> {
        Ok(Self {
            config: config.compile()?,
            options,
        })
    }

    fn manager(&self) -> FileManager<'_> {
        FileManager::new(&self.config, self.options.manager.clone())
    }

    /// Validates `target` and computes its plan without touching anything.
    pub fn plan(&self, target: &Path) -> OrganizeResult<(PathBuf, Plan)> {
        let target = validate_target(target)?;
        let destination =
            resolve_destination(&target, self.options.manager.destination.as_deref())?;
        let manager = self.manager();
        let files = manager.scan(&target);
        Ok((target, manager.plan(&files, &destination)))
    }

    /// Runs a complete organization of `target`.
    pub fn run(&self, target: &Path, observer: &mut dyn RunObserver) -> OrganizeResult<RunOutcome> {
        let manager = self.manager();

        observer.on_state(RunState::Scanning);
        let target = validate_target(target)?;
        let destination =
            resolve_destination(&target, self.options.manager.destination.as_deref())?;
        info!(
            target = %target.display(),
            destination = %destination.display(),
            mode = %self.options.manager.mode,
            "organizing"
        );
        let files = manager.scan(&target);

        observer.on_state(RunState::Planning);
        let plan = manager.plan(&files, &destination);
        debug!(
            entries = plan.len(),
            transfers = plan.transfer_count(),
            conflicts = plan.conflict_count(),
            "plan computed"
        );
        observer.on_plan(&plan);

        if self.options.dry_run {
            observer.on_state(RunState::DryRunReport);
            let mut executor = DryRunExecutor::default();
            let report = Self::execute_with(&manager, &plan, &mut executor, observer);
            observer.on_state(report.state);
            return Ok(RunOutcome {
                target,
                plan,
                report,
                manifest: None,
            });
        }

        let mut manifest = self.begin_backup(&target, &plan);

        observer.on_state(RunState::Executing);
        let mut executor = FsExecutor::new(self.options.manager.transfer);
        let report = Self::execute_with(&manager, &plan, &mut executor, observer);

        let manifest_path = match manifest.as_mut() {
            Some(manifest) => {
                for source in &report.completed {
                    manifest.mark_completed(source);
                }
                Self::save_manifest(manifest)
            }
            None => None,
        };

        observer.on_state(report.state);
        Ok(RunOutcome {
            target,
            plan,
            report,
            manifest: manifest_path,
        })
    }

    fn execute_with(
        manager: &FileManager<'_>,
        plan: &Plan,
        executor: &mut dyn Executor,
        observer: &mut dyn RunObserver,
    ) -> RunReport {
        manager.execute(plan, executor, |entry, error| observer.on_entry(entry, error))
    }

    /// Writes the pre-run manifest for a live move batch with transfers.
    fn begin_backup(&self, target: &Path, plan: &Plan) -> Option<BackupManifest> {
        if !self.options.backup
            || self.options.manager.transfer != TransferMode::Move
            || plan.transfer_count() == 0
        {
            return None;
        }
        let manifest = BackupManifest::snapshot(target, plan);
        Self::save_manifest(&manifest)?;
        Some(manifest)
    }

    fn save_manifest(manifest: &BackupManifest) -> Option<PathBuf> {
        match manifest.save() {
            Ok(path) => {
                debug!(path = %path.display(), "backup manifest written");
                Some(path)
            }
            Err(e) => {
                warn!(error = %e, "could not write backup manifest, continuing without undo");
                None
            }
        }
    }
}
