//! fileorg - organize a directory into category or date folders
//!
//! This library scans a directory, plans where every file should go (by
//! extension category or by modification date), resolves name conflicts
//! against a snapshot of each destination, and executes the plan either for
//! real or as a dry run. Live runs record a backup manifest that undo reverts.

pub mod category_mapper;
pub mod cli;
pub mod config;
pub mod conflict;
pub mod date_organizer;
pub mod error;
pub mod executor;
pub mod file_manager;
pub mod history;
pub mod organizer;
pub mod output;
pub mod plan;
pub mod undo;

pub use category_mapper::CategoryMapper;
pub use config::{CompiledConfig, ConfigError, OrganizerConfig};
pub use conflict::ConflictPolicy;
pub use date_organizer::{DateFormat, DateOrganizer};
pub use error::{FileError, FileErrorKind, HistoryError, OrganizeError, OrganizeResult};
pub use executor::{DryRunExecutor, Executor, FsExecutor, TransferMode};
pub use file_manager::{FileManager, ManagerOptions, OrganizeMode, RunReport, RunState};
pub use organizer::{NoopObserver, OrganizeOptions, Organizer, RunObserver, RunOutcome};
pub use plan::{Action, BucketStats, Plan, PlanEntry, SkipReason};
pub use undo::{UndoManager, UndoReport};
