//! The organization plan: one immutable entry per discovered file.

use std::path::{Path, PathBuf};

/// Why a file is left in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The file already sits in its category or date folder.
    AlreadyOrganized,
    /// The destination name is taken and the policy is to skip.
    Conflict,
}

impl SkipReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::AlreadyOrganized => "already organized",
            Self::Conflict => "name conflict",
        }
    }
}

/// What the executor does with an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Transfer under the original name.
    Move,
    /// Transfer under a disambiguated name.
    Rename { original_name: String },
    /// Leave the file alone.
    Skip(SkipReason),
}

/// A planned source to destination action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanEntry {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Category name or date segment the file belongs to.
    pub bucket: String,
    pub action: Action,
    /// Size of the source in bytes when it was scanned.
    pub size: u64,
}

impl PlanEntry {
    /// True for entries the executor must act on.
    pub fn is_transfer(&self) -> bool {
        matches!(self.action, Action::Move | Action::Rename { .. })
    }

    /// Destination relative to `root`, for display.
    pub fn relative_destination<'a>(&'a self, root: &Path) -> &'a Path {
        self.destination
            .strip_prefix(root)
            .unwrap_or(&self.destination)
    }
}

/// Files and bytes placed in one bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BucketStats {
    pub files: usize,
    pub bytes: u64,
}

impl BucketStats {
    pub fn add(&mut self, size: u64) {
        self.files += 1;
        self.bytes += size;
    }
}

/// Ordered list of actions computed by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan {
    /// Directory the destinations are relative to.
    pub destination_root: PathBuf,
    pub entries: Vec<PlanEntry>,
}

impl Plan {
    pub fn new(destination_root: PathBuf) -> Self {
        Self {
            destination_root,
            entries: Vec::new(),
        }
    }

    pub fn push(&mut self, entry: PlanEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries that will be moved or copied.
    pub fn transfers(&self) -> impl Iterator<Item = &PlanEntry> {
        self.entries.iter().filter(|entry| entry.is_transfer())
    }

    pub fn transfer_count(&self) -> usize {
        self.transfers().count()
    }

    pub fn skip_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| matches!(entry.action, Action::Skip(_)))
            .count()
    }

    /// Destinations that were already taken, whether renamed or skipped.
    pub fn conflict_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| {
                matches!(
                    entry.action,
                    Action::Rename { .. } | Action::Skip(SkipReason::Conflict)
                )
            })
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str, bucket: &str, action: Action) -> PlanEntry {
        PlanEntry {
            source: PathBuf::from("/t").join(name),
            destination: PathBuf::from("/t").join(bucket).join(name),
            bucket: bucket.to_string(),
            action,
            size: 10,
        }
    }

    #[test]
    fn test_counts() {
        let mut plan = Plan::new(PathBuf::from("/t"));
        plan.push(entry("a.txt", "Documents", Action::Move));
        plan.push(entry(
            "b (1).txt",
            "Documents",
            Action::Rename {
                original_name: "b.txt".to_string(),
            },
        ));
        plan.push(entry("c.png", "Images", Action::Skip(SkipReason::Conflict)));
        plan.push(entry(
            "d.png",
            "Images",
            Action::Skip(SkipReason::AlreadyOrganized),
        ));

        assert_eq!(plan.len(), 4);
        assert_eq!(plan.transfer_count(), 2);
        assert_eq!(plan.skip_count(), 2);
        assert_eq!(plan.conflict_count(), 2);
    }

    #[test]
    fn test_bucket_stats_accumulate() {
        let mut stats = BucketStats::default();
        stats.add(10);
        stats.add(32);
        assert_eq!(stats, BucketStats { files: 2, bytes: 42 });
    }

    #[test]
    fn test_relative_destination() {
        let e = entry("a.txt", "Documents", Action::Move);
        assert_eq!(
            e.relative_destination(Path::new("/t")),
            Path::new("Documents/a.txt")
        );
    }
}
