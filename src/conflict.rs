//! Conflict-free name generation.
//!
//! Resolution is a pure function of a snapshot of the names already present
//! in a destination directory and the candidate name, so the same inputs
//! always produce the same proposal.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// What to do when a destination name is already taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictPolicy {
    /// Place the file under a disambiguated name, e.g. `report (1).pdf`.
    #[default]
    Rename,
    /// Leave the file where it is.
    Skip,
}

impl fmt::Display for ConflictPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rename => f.write_str("rename"),
            Self::Skip => f.write_str("skip"),
        }
    }
}

impl FromStr for ConflictPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "rename" => Ok(Self::Rename),
            "skip" => Ok(Self::Skip),
            other => Err(format!(
                "unknown conflict policy '{other}', expected rename or skip"
            )),
        }
    }
}

/// Splits a file name into stem and extension for suffixing.
///
/// The extension keeps its dot. A leading dot belongs to the stem, so
/// `.env` has no extension.
pub fn split_name(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// Builds the `n`-th disambiguated variant of a name.
///
/// ```
/// use fileorg::conflict::numbered_name;
///
/// assert_eq!(numbered_name("report.pdf", 1), "report (1).pdf");
/// assert_eq!(numbered_name("Makefile", 2), "Makefile (2)");
/// ```
pub fn numbered_name(file_name: &str, n: usize) -> String {
    let (stem, ext) = split_name(file_name);
    format!("{stem} ({n}){ext}")
}

/// Returns the first name not present in `taken`.
///
/// The candidate itself is returned when free. Otherwise ` (1)`, ` (2)`, ...
/// is appended before the extension. A free name always exists because
/// `taken` is finite.
///
/// ```
/// use std::collections::HashSet;
/// use fileorg::conflict::resolve_name;
///
/// let taken: HashSet<String> = ["report.pdf", "report (1).pdf"]
///     .into_iter()
///     .map(String::from)
///     .collect();
/// assert_eq!(resolve_name(&taken, "report.pdf"), "report (2).pdf");
/// assert_eq!(resolve_name(&taken, "notes.txt"), "notes.txt");
/// ```
pub fn resolve_name(taken: &HashSet<String>, candidate: &str) -> String {
    if !taken.contains(candidate) {
        return candidate.to_string();
    }
    (1..)
        .map(|n| numbered_name(candidate, n))
        .find(|name| !taken.contains(name))
        .unwrap_or_else(|| candidate.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taken(names: &[&str]) -> HashSet<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_free_name_is_unchanged() {
        assert_eq!(resolve_name(&taken(&[]), "report.pdf"), "report.pdf");
        assert_eq!(resolve_name(&taken(&["other.pdf"]), "report.pdf"), "report.pdf");
    }

    #[test]
    fn test_first_conflict_gets_one() {
        assert_eq!(
            resolve_name(&taken(&["report.txt"]), "report.txt"),
            "report (1).txt"
        );
    }

    #[test]
    fn test_skips_taken_suffixes() {
        let names = taken(&["a.txt", "a (1).txt", "a (2).txt", "a (4).txt"]);
        assert_eq!(resolve_name(&names, "a.txt"), "a (3).txt");
    }

    #[test]
    fn test_suffix_goes_before_last_extension_only() {
        assert_eq!(
            resolve_name(&taken(&["backup.tar.gz"]), "backup.tar.gz"),
            "backup.tar (1).gz"
        );
    }

    #[test]
    fn test_names_without_extension_and_dotfiles() {
        assert_eq!(resolve_name(&taken(&["README"]), "README"), "README (1)");
        assert_eq!(resolve_name(&taken(&[".env"]), ".env"), ".env (1)");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let names = taken(&["x.md", "x (1).md"]);
        let first = resolve_name(&names, "x.md");
        let second = resolve_name(&names, "x.md");
        assert_eq!(first, second);
    }

    #[test]
    fn test_successive_claims_are_distinct() {
        let mut names = taken(&["photo.jpg"]);
        let mut proposed = Vec::new();
        for _ in 0..5 {
            let name = resolve_name(&names, "photo.jpg");
            names.insert(name.clone());
            proposed.push(name);
        }
        let unique: HashSet<_> = proposed.iter().collect();
        assert_eq!(unique.len(), proposed.len());
        assert_eq!(proposed[0], "photo (1).jpg");
        assert_eq!(proposed[4], "photo (5).jpg");
    }

    #[test]
    fn test_split_name() {
        assert_eq!(split_name("a.pdf"), ("a", ".pdf"));
        assert_eq!(split_name(".bashrc"), (".bashrc", ""));
        assert_eq!(split_name("plain"), ("plain", ""));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("rename".parse::<ConflictPolicy>(), Ok(ConflictPolicy::Rename));
        assert_eq!("SKIP".parse::<ConflictPolicy>(), Ok(ConflictPolicy::Skip));
        assert!("overwrite".parse::<ConflictPolicy>().is_err());
    }
}
