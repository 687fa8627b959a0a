//! Output formatting and styling module.
//!
//! Provides a centralized interface for all user-facing CLI output, including
//! colored messages, progress tracking and the run summary. Diagnostics go
//! through `tracing` instead.

use crate::file_manager::RunReport;
use crate::plan::{Action, BucketStats, PlanEntry};
use crate::undo::UndoReport;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::BTreeMap;
use std::path::Path;

/// Manages all CLI output with consistent styling and formatting.
///
/// This struct provides methods for:
/// - Success messages (green with ✓)
/// - Error messages (red with ✗)
/// - Warning messages (yellow with ⚠)
/// - Info messages (cyan)
/// - Progress bars for live runs
/// - Summary tables with statistics
pub struct OutputFormatter;

impl OutputFormatter {
    /// Prints a success message in green with a checkmark.
    ///
    /// ```no_run
    /// use fileorg::output::OutputFormatter;
    /// OutputFormatter::success("Files organized successfully!");
    /// ```
    pub fn success(message: &str) {
        println!("{} {}", "✓".green(), message);
    }

    /// Prints an error message in red with an X mark.
    pub fn error(message: &str) {
        eprintln!("{} {}", "✗".red(), message);
    }

    /// Prints a warning message in yellow with a warning symbol.
    pub fn warning(message: &str) {
        println!("{} {}", "⚠".yellow(), message);
    }

    /// Prints an info message in cyan.
    pub fn info(message: &str) {
        println!("{}", message.cyan());
    }

    pub fn plain(message: &str) {
        println!("{message}");
    }

    /// Prints a section header.
    pub fn header(header: &str) {
        println!("\n{}", header.bold());
    }

    /// Creates a progress bar for `total` transfers.
    ///
    /// ```no_run
    /// use fileorg::output::OutputFormatter;
    /// let pb = OutputFormatter::create_progress_bar(100);
    /// pb.inc(1);
    /// pb.finish_with_message("Completed!");
    /// ```
    pub fn create_progress_bar(total: u64) -> ProgressBar {
        let pb = ProgressBar::new(total);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.cyan} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓░");
        pb.set_style(style);
        pb
    }

    /// One line describing a plan entry, destination relative to `root`.
    pub fn describe_entry(entry: &PlanEntry, root: &Path) -> String {
        let name = entry
            .source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let destination = entry.relative_destination(root).display().to_string();

        match &entry.action {
            Action::Move => format!("{name} → {destination}"),
            Action::Rename { .. } => {
                format!("{name} → {destination} {}", "(renamed)".yellow())
            }
            Action::Skip(reason) => {
                format!("{name} {}", format!("(skipped: {})", reason.describe()).dimmed())
            }
        }
    }

    /// Prints a summary table with file statistics by category or date.
    ///
    /// ```no_run
    /// use fileorg::output::OutputFormatter;
    /// use fileorg::plan::BucketStats;
    /// use std::collections::BTreeMap;
    ///
    /// let mut buckets = BTreeMap::new();
    /// buckets.insert("Documents".to_string(), BucketStats { files: 15, bytes: 48_000 });
    /// buckets.insert("Images".to_string(), BucketStats { files: 8, bytes: 3_200_000 });
    /// OutputFormatter::summary_table(&buckets);
    /// ```
    pub fn summary_table(buckets: &BTreeMap<String, BucketStats>) {
        Self::header("SUMMARY");

        let max_bucket_len = buckets
            .keys()
            .map(|name| name.len())
            .max()
            .unwrap_or(0)
            .max(8); // At least "Category" width

        println!(
            "{:<width$} | {:<9} | {}",
            "Category".bold(),
            "Files".bold(),
            "Size".bold(),
            width = max_bucket_len
        );
        println!("{}", "-".repeat(max_bucket_len + 24));

        let mut total = BucketStats::default();
        for (bucket, stats) in buckets {
            total.files += stats.files;
            total.bytes += stats.bytes;
            println!(
                "{:<width$} | {:<9} | {}",
                bucket,
                format!("{} {}", stats.files, Self::file_word(stats.files)).green(),
                Self::format_size(stats.bytes),
                width = max_bucket_len
            );
        }

        println!("{}", "-".repeat(max_bucket_len + 24));
        println!(
            "{:<width$} | {:<9} | {}",
            "Total".bold(),
            format!("{} {}", total.files, Self::file_word(total.files)).green().bold(),
            Self::format_size(total.bytes),
            width = max_bucket_len
        );
    }

    /// Human-readable byte count, e.g. `1.5 MB`.
    pub fn format_size(bytes: u64) -> String {
        const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
        if bytes < 1024 {
            return format!("{bytes} B");
        }
        let mut value = bytes as f64 / 1024.0;
        let mut unit = 0;
        while value >= 1024.0 && unit < UNITS.len() - 1 {
            value /= 1024.0;
            unit += 1;
        }
        format!("{value:.1} {}", UNITS[unit])
    }

    /// Prints the end-of-run report: counts, conflicts and failures.
    pub fn run_summary(report: &RunReport) {
        if report.transferred > 0 {
            Self::summary_table(&report.buckets);
        }

        println!();
        if report.conflicts > 0 {
            Self::warning(&format!(
                "{} name {} ({} renamed)",
                report.conflicts,
                if report.conflicts == 1 { "conflict" } else { "conflicts" },
                report.renamed
            ));
        }
        if report.skipped > 0 {
            Self::plain(&format!(
                "{} {} left in place",
                report.skipped,
                Self::file_word(report.skipped)
            ));
        }

        if report.has_errors() {
            Self::error(&format!(
                "{} {} could not be organized:",
                report.failures.len(),
                Self::file_word(report.failures.len())
            ));
            for failure in &report.failures {
                eprintln!("    - {failure}");
            }
        }
    }

    /// Prints the result of an undo.
    pub fn undo_summary(report: &UndoReport) {
        if report.total_processed() == 0 {
            Self::info("Nothing left to undo.");
        }
        Self::success(&format!(
            "Restored {} {}",
            report.restored_files,
            Self::file_word(report.restored_files)
        ));

        for (restored, original) in &report.renamed {
            Self::warning(&format!(
                "{} was occupied, restored as {}",
                original.display(),
                restored.display()
            ));
        }

        if !report.skipped_files.is_empty() {
            Self::warning(&format!("Skipped: {}", report.skipped_files.len()));
            for (path, reason) in &report.skipped_files {
                println!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.failed_restores.is_empty() {
            Self::error(&format!("Failed: {}", report.failed_restores.len()));
            for (path, reason) in &report.failed_restores {
                eprintln!("    - {}: {}", path.display(), reason);
            }
        }

        if !report.history_cleared {
            Self::warning("History file was kept. Fix the issues above and run undo again.");
        }
    }

    /// Prints a dry-run notice message.
    pub fn dry_run_notice(message: &str) {
        println!("{}", format!("[DRY RUN] {message}").yellow());
    }

    fn file_word(count: usize) -> &'static str {
        if count == 1 { "file" } else { "files" }
    }
}
