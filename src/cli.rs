//! Command-line interface for fileorg.
//!
//! Handles argument parsing, configuration loading, and rendering of run and
//! undo reports. Exit codes: 0 on success, 1 when some files failed, 2 on a
//! fatal error.

use crate::config::OrganizerConfig;
use crate::conflict::ConflictPolicy;
use crate::date_organizer::DateFormat;
use crate::error::{FileError, OrganizeError};
use crate::executor::TransferMode;
use crate::file_manager::{ManagerOptions, OrganizeMode, RunState};
use crate::organizer::{OrganizeOptions, Organizer, RunObserver, RunOutcome};
use crate::output::OutputFormatter;
use crate::plan::{Plan, PlanEntry};
use crate::undo::UndoManager;
use clap::Parser;
use indicatif::ProgressBar;
use std::path::{Path, PathBuf};

/// Exit code for a run that could not start or was aborted.
pub const EXIT_FATAL: u8 = 2;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    name = "fileorg",
    about = "Organize files into category or date folders"
)]
pub struct Args {
    /// Directory to organize
    #[arg(
        value_hint = clap::ValueHint::DirPath,
        required_unless_present_any = ["list_categories", "list_formats"]
    )]
    pub directory: Option<PathBuf>,

    /// Organize by file type or by modification date
    #[arg(short, long, default_value = "type")]
    pub mode: OrganizeMode,

    /// Show what would happen without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Enable debug logging and print files without a progress bar
    #[arg(short, long)]
    pub verbose: bool,

    /// Root for category or date folders, defaults to DIRECTORY
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub destination: Option<PathBuf>,

    /// Configuration file to use instead of the default search
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Include files in subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Folder layout for date mode
    #[arg(long, default_value = "YYYY/MM/DD")]
    pub date_format: DateFormat,

    /// What to do when a destination name is taken
    #[arg(long, default_value = "rename")]
    pub conflict: ConflictPolicy,

    /// Copy files instead of moving them
    #[arg(long)]
    pub copy: bool,

    /// Do not write the undo manifest
    #[arg(long)]
    pub no_backup: bool,

    /// Revert the last organization of DIRECTORY
    #[arg(long, conflicts_with_all = ["dry_run", "copy"])]
    pub undo: bool,

    /// Print the category table in effect and exit
    #[arg(long)]
    pub list_categories: bool,

    /// Print the accepted date formats and exit
    #[arg(long)]
    pub list_formats: bool,
}

impl Args {
    pub fn organize_options(&self) -> OrganizeOptions {
        OrganizeOptions {
            manager: ManagerOptions {
                mode: self.mode,
                date_format: self.date_format,
                recursive: self.recursive,
                destination: self.destination.clone(),
                conflict: self.conflict,
                transfer: if self.copy {
                    TransferMode::Copy
                } else {
                    TransferMode::Move
                },
            },
            dry_run: self.dry_run,
            backup: !self.no_backup,
        }
    }
}

/// Renders run progress to the terminal.
struct CliObserver {
    verbose: bool,
    dry_run: bool,
    root: PathBuf,
    progress: Option<ProgressBar>,
}

impl CliObserver {
    fn new(verbose: bool, dry_run: bool) -> Self {
        Self {
            verbose,
            dry_run,
            root: PathBuf::new(),
            progress: None,
        }
    }

    /// Line printed for an entry. Skips are listed too, at any verbosity.
    fn entry_line(&self, entry: &PlanEntry, error: Option<&FileError>) -> String {
        match error {
            Some(error) => format!("   ✗ {error}"),
            None => format!(" - {}", OutputFormatter::describe_entry(entry, &self.root)),
        }
    }

    fn print(&self, line: &str) {
        match &self.progress {
            Some(pb) => pb.println(line),
            None => OutputFormatter::plain(line),
        }
    }
}

impl RunObserver for CliObserver {
    fn on_state(&mut self, state: RunState) {
        if state.is_terminal()
            && let Some(pb) = self.progress.take()
        {
            pb.finish_and_clear();
        }
    }

    fn on_plan(&mut self, plan: &Plan) {
        self.root = plan.destination_root.clone();
        if plan.is_empty() {
            OutputFormatter::info("No files found to organize.");
            return;
        }
        if self.dry_run {
            OutputFormatter::header("Files would be organized as follows:");
        } else if plan.transfer_count() > 0 && !self.verbose {
            self.progress = Some(OutputFormatter::create_progress_bar(
                plan.transfer_count() as u64,
            ));
        }
    }

    fn on_entry(&mut self, entry: &PlanEntry, error: Option<&FileError>) {
        self.print(&self.entry_line(entry, error));
        if entry.is_transfer()
            && let Some(pb) = &self.progress
        {
            pb.inc(1);
        }
    }
}

/// Runs the CLI with parsed arguments and returns the process exit code.
pub fn run_cli(args: &Args) -> u8 {
    if args.list_formats {
        list_formats();
        return 0;
    }
    if args.list_categories {
        return list_categories(args.config.as_deref());
    }
    let Some(directory) = args.directory.as_deref() else {
        OutputFormatter::error("Error: no directory given");
        return EXIT_FATAL;
    };
    if args.undo {
        return undo_organization(directory);
    }

    let outcome = OrganizerConfig::load(args.config.as_deref())
        .map_err(OrganizeError::from)
        .and_then(|config| Organizer::new(config, args.organize_options()))
        .and_then(|organizer| {
            let mut observer = CliObserver::new(args.verbose, args.dry_run);
            if args.dry_run {
                OutputFormatter::dry_run_notice(&format!(
                    "Analyzing contents of: {}",
                    directory.display()
                ));
            } else {
                OutputFormatter::info(&format!(
                    "Organizing contents of: {}",
                    directory.display()
                ));
            }
            organizer.run(directory, &mut observer)
        });

    match outcome {
        Ok(outcome) => {
            print_outcome(&outcome, args);
            outcome.exit_code()
        }
        Err(e) => {
            OutputFormatter::error(&format!("Error: {e}"));
            EXIT_FATAL
        }
    }
}

fn print_outcome(outcome: &RunOutcome, args: &Args) {
    let report = &outcome.report;
    if outcome.plan.is_empty() {
        return;
    }
    OutputFormatter::run_summary(report);

    if report.dry_run {
        OutputFormatter::success("Dry run complete. No files were modified.");
        OutputFormatter::plain(&format!(
            "Run 'fileorg {}' without --dry-run to execute the organization.",
            outcome.target.display()
        ));
        return;
    }

    if report.has_errors() {
        OutputFormatter::warning("Organization finished with errors.");
    } else {
        OutputFormatter::success("Organization complete!");
    }
    if outcome.manifest.is_some() {
        OutputFormatter::plain(&format!(
            "History saved. Use 'fileorg {} --undo' to revert changes.",
            outcome.target.display()
        ));
    } else if !args.no_backup && !args.copy && report.transferred > 0 {
        OutputFormatter::warning("History could not be saved. Undo will not be available.");
    }
}

fn list_formats() {
    OutputFormatter::header("Date formats");
    for format in DateFormat::ALL {
        let marker = if format == DateFormat::default() { " (default)" } else { "" };
        OutputFormatter::plain(&format!("  {format}{marker}"));
    }
}

fn list_categories(config_path: Option<&Path>) -> u8 {
    let compiled = match OrganizerConfig::load(config_path).and_then(OrganizerConfig::compile) {
        Ok(compiled) => compiled,
        Err(e) => {
            OutputFormatter::error(&format!("Error: {e}"));
            return EXIT_FATAL;
        }
    };
    let mapper = &compiled.mapper;

    OutputFormatter::header(&format!("Categories ({} extensions)", mapper.len()));
    for (category, extensions) in mapper.categories() {
        OutputFormatter::plain(&format!("  {category}: {}", extensions.join(", ")));
    }
    OutputFormatter::plain(&format!(
        "  {}: everything else",
        mapper.default_category()
    ));
    0
}

fn undo_organization(base_path: &Path) -> u8 {
    OutputFormatter::info("Undoing previous organization...");

    match UndoManager::undo(base_path) {
        Ok(report) => {
            OutputFormatter::undo_summary(&report);
            if report.failed_restores.is_empty() { 0 } else { 1 }
        }
        Err(e) => {
            OutputFormatter::error(&format!("Error: {e}"));
            EXIT_FATAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::{Action, SkipReason};

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["fileorg", "/tmp/inbox"]).unwrap();
        assert_eq!(args.mode, OrganizeMode::Type);
        assert_eq!(args.date_format, DateFormat::YearMonthDayNested);
        assert_eq!(args.conflict, ConflictPolicy::Rename);
        assert!(!args.dry_run);

        let options = args.organize_options();
        assert!(options.backup);
        assert_eq!(options.manager.transfer, TransferMode::Move);
        assert!(options.manager.destination.is_none());
    }

    #[test]
    fn test_all_flags() {
        let args = Args::try_parse_from([
            "fileorg",
            "/tmp/inbox",
            "--mode",
            "date",
            "-n",
            "-v",
            "-r",
            "-d",
            "/tmp/out",
            "--date-format",
            "YYYY-MM",
            "--conflict",
            "skip",
            "--copy",
            "--no-backup",
        ])
        .unwrap();

        let options = args.organize_options();
        assert!(options.dry_run);
        assert!(!options.backup);
        assert_eq!(options.manager.mode, OrganizeMode::Date);
        assert_eq!(options.manager.date_format, DateFormat::YearMonth);
        assert_eq!(options.manager.conflict, ConflictPolicy::Skip);
        assert_eq!(options.manager.transfer, TransferMode::Copy);
        assert!(options.manager.recursive);
        assert_eq!(options.manager.destination, Some(PathBuf::from("/tmp/out")));
    }

    #[test]
    fn test_rejects_unknown_values() {
        assert!(Args::try_parse_from(["fileorg", "/tmp", "--mode", "size"]).is_err());
        assert!(Args::try_parse_from(["fileorg", "/tmp", "--conflict", "overwrite"]).is_err());
        assert!(Args::try_parse_from(["fileorg", "/tmp", "--undo", "--dry-run"]).is_err());
        assert!(Args::try_parse_from(["fileorg"]).is_err());
    }

    #[test]
    fn test_skipped_entries_are_listed_without_verbose() {
        colored::control::set_override(false);
        let mut observer = CliObserver::new(false, false);
        observer.root = PathBuf::from("/t");
        let entry = PlanEntry {
            source: PathBuf::from("/t/Documents/a.txt"),
            destination: PathBuf::from("/t/Documents/a.txt"),
            bucket: "Documents".to_string(),
            action: Action::Skip(SkipReason::AlreadyOrganized),
            size: 1,
        };

        let line = observer.entry_line(&entry, None);
        assert!(line.starts_with(" - a.txt"), "{line}");
        assert!(line.contains("skipped"), "{line}");
    }

    #[test]
    fn test_listing_flags_need_no_directory() {
        let args = Args::try_parse_from(["fileorg", "--list-formats"]).unwrap();
        assert!(args.directory.is_none());
        assert_eq!(run_cli(&args), 0);

        let args = Args::try_parse_from(["fileorg", "--list-categories"]).unwrap();
        assert!(args.list_categories);
        assert!(args.directory.is_none());
    }

    #[test]
    fn test_list_categories_with_missing_config_is_fatal() {
        let args = Args::try_parse_from([
            "fileorg",
            "--list-categories",
            "-c",
            "/no/such/config.toml",
        ])
        .unwrap();
        assert_eq!(run_cli(&args), EXIT_FATAL);
    }
}
