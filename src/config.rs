//! Configuration loading: category table, default bucket and file filters.
//!
//! Configuration is stored in TOML and loaded once per run. A malformed
//! document is a fatal [`ConfigError`]; nothing is touched on disk before the
//! configuration has been validated.
//!
//! # Configuration File Format
//!
//! ```toml
//! default_category = "Other"
//! detect_content = true
//!
//! [categories]
//! Documents = [".pdf", ".txt"]
//! Images = ["png", ".JPG"]
//!
//! [filters]
//! enable_hidden_files = false
//!
//! [filters.exclude]
//! filenames = [".DS_Store", "Thumbs.db"]
//! patterns = ["*.tmp", "node_modules/**"]
//! extensions = ["bak", "tmp"]
//! regex = []
//!
//! [filters.include]
//! patterns = []
//! ```
//!
//! A `[categories]` table replaces the built-in table entirely. Extensions are
//! normalized to lowercase with a leading dot.

use crate::category_mapper::CategoryMapper;
use glob::Pattern;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the per-directory configuration file.
pub const LOCAL_CONFIG_FILE: &str = ".fileorgrc.toml";

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    #[error("Configuration file not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    /// Invalid TOML syntax or structure.
    #[error("Invalid configuration {}: {reason}", .path.display())]
    ConfigInvalid { path: PathBuf, reason: String },

    /// IO error while reading configuration.
    #[error("IO error reading configuration {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The same extension is listed under two categories.
    #[error("Extension '{extension}' is mapped to both '{first}' and '{second}'")]
    DuplicateExtension {
        extension: String,
        first: String,
        second: String,
    },

    /// A category lists an empty extension.
    #[error("Category '{0}' contains an empty extension")]
    EmptyExtension(String),

    /// A category or the default bucket has an empty name.
    #[error("Category names must not be empty")]
    EmptyCategoryName,

    /// A category name is not a single folder name (absolute, `.`, `..`, or
    /// containing a path separator).
    #[error("Invalid category name '{0}': must be a single folder name")]
    InvalidCategoryName(String),

    /// Invalid glob pattern provided.
    #[error("Invalid glob pattern '{0}': expected *.ext or dir/**")]
    InvalidGlobPattern(String),

    /// Invalid regex pattern provided with the actual error reason.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidRegexPattern { pattern: String, reason: String },
}

/// Built-in category table. No extension appears in more than one category.
pub const DEFAULT_CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Documents",
        &[
            ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".pages", ".md", ".tex",
        ],
    ),
    (
        "Images",
        &[
            ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp", ".ico",
            ".raw", ".cr2", ".nef", ".arw", ".heic", ".heif", ".avif",
        ],
    ),
    (
        "Videos",
        &[
            ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".3gp", ".mpg",
            ".mpeg", ".m2v", ".asf",
        ],
    ),
    (
        "Audio",
        &[
            ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".opus", ".aiff", ".au",
            ".ra", ".ape",
        ],
    ),
    (
        "Archives",
        &[
            ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".iso",
        ],
    ),
    (
        "Code",
        &[
            ".py", ".js", ".html", ".css", ".cpp", ".c", ".h", ".hpp", ".java", ".php", ".rb",
            ".go", ".rs", ".swift", ".kt", ".ts", ".jsx", ".tsx", ".vue", ".sql", ".json",
            ".xml", ".yaml", ".yml", ".toml", ".ini", ".cfg", ".conf", ".sh",
        ],
    ),
    (
        "Spreadsheets",
        &[".xls", ".xlsx", ".csv", ".ods", ".numbers", ".tsv"],
    ),
    ("Presentations", &[".ppt", ".pptx", ".odp", ".key"]),
    (
        "eBooks",
        &[".epub", ".mobi", ".azw", ".azw3", ".fb2", ".lit"],
    ),
    (
        "Executables",
        &[
            ".exe", ".msi", ".app", ".deb", ".rpm", ".dmg", ".pkg", ".appimage",
        ],
    ),
    (
        "Fonts",
        &[".ttf", ".otf", ".woff", ".woff2", ".eot", ".pfb", ".pfm"],
    ),
];

fn default_category_name() -> String {
    "Other".to_string()
}

fn default_detect_content() -> bool {
    true
}

/// Top-level configuration document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrganizerConfig {
    /// Bucket for files whose extension matches no category.
    #[serde(default = "default_category_name")]
    pub default_category: String,

    /// Sniff file headers when the extension is unmapped.
    #[serde(default = "default_detect_content")]
    pub detect_content: bool,

    /// Category name to extensions. `None` means the built-in table.
    #[serde(default)]
    pub categories: Option<BTreeMap<String, Vec<String>>>,

    /// File filtering rules.
    #[serde(default)]
    pub filters: FilterRules,
}

/// Root-level filter rules configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to include hidden files (starting with "."). Defaults to false.
    #[serde(default)]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,

    /// Rules for including files (whitelist, overrides exclude rules).
    #[serde(default)]
    pub include: IncludeRules,
}

/// Rules for excluding files from organization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., ".DS_Store", "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns to exclude (e.g., "*.tmp", "node_modules/**").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// File extensions to exclude, with or without the leading dot.
    #[serde(default)]
    pub extensions: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

/// Rules for including files, overriding exclude rules (whitelist).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IncludeRules {
    /// Glob patterns that override exclude rules.
    #[serde(default)]
    pub patterns: Vec<String>,
}

impl Default for OrganizerConfig {
    fn default() -> Self {
        Self {
            default_category: default_category_name(),
            detect_content: default_detect_content(),
            categories: None,
            filters: FilterRules::default(),
        }
    }
}

impl OrganizerConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.fileorgrc.toml` in the current directory
    /// 3. Look for `~/.config/fileorg/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly provided file is missing, or if any
    /// discovered file cannot be read or parsed.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("fileorg")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        tracing::debug!("no configuration file found, using built-in defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ConfigInvalid { reason, .. } => ConfigError::ConfigInvalid {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse a configuration document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid {
            path: PathBuf::new(),
            reason: e.to_string(),
        })
    }

    /// Returns the category table in effect, built-in or configured.
    pub fn category_table(&self) -> BTreeMap<String, Vec<String>> {
        match &self.categories {
            Some(table) => table.clone(),
            None => DEFAULT_CATEGORIES
                .iter()
                .map(|(name, exts)| {
                    (
                        (*name).to_string(),
                        exts.iter().map(|e| (*e).to_string()).collect(),
                    )
                })
                .collect(),
        }
    }

    /// Validate and compile the configuration into lookup structures.
    ///
    /// # Errors
    ///
    /// Returns an error for duplicate or empty extensions, empty category
    /// names, and invalid glob or regex patterns.
    pub fn compile(self) -> Result<CompiledConfig, ConfigError> {
        let mapper = CategoryMapper::from_table(&self.category_table(), &self.default_category)?;
        let filters = CompiledFilters::new(self.filters)?;
        Ok(CompiledConfig {
            mapper,
            filters,
            detect_content: self.detect_content,
        })
    }
}

/// Validated configuration, ready for a run.
#[derive(Debug)]
pub struct CompiledConfig {
    pub mapper: CategoryMapper,
    pub filters: CompiledFilters,
    pub detect_content: bool,
}

/// Compiled filter structures for efficient file matching.
///
/// All glob and regex rules are parsed once up front so matching does not
/// reparse patterns per file.
#[derive(Debug)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_extensions: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
    include_patterns: Vec<Pattern>,
}

impl CompiledFilters {
    fn new(rules: FilterRules) -> Result<Self, ConfigError> {
        let compile_globs = |patterns: &[String]| {
            patterns
                .iter()
                .map(|pattern| {
                    Pattern::new(pattern)
                        .map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
                })
                .collect::<Result<Vec<_>, _>>()
        };

        let exclude_patterns = compile_globs(&rules.exclude.patterns)?;
        let include_patterns = compile_globs(&rules.include.patterns)?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.into_iter().collect(),
            exclude_extensions: rules
                .exclude
                .extensions
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_patterns,
            exclude_regexes,
            include_patterns,
        })
    }

    /// Whether hidden directories and files are considered at all.
    pub fn hidden_enabled(&self) -> bool {
        self.enable_hidden_files
    }

    /// Check if a file should be included in organization.
    ///
    /// `relative_path` is the path relative to the scanned directory.
    /// Checks run in this order, with early termination:
    /// 1. Include patterns (whitelist) - if matched, always include
    /// 2. Hidden file filter - if hidden and disabled, exclude
    /// 3. Exact filename match - if matched, exclude
    /// 4. File extension match - if matched, exclude
    /// 5. Glob pattern match - if matched, exclude
    /// 6. Regex pattern match - if matched, exclude
    /// 7. Default: include
    pub fn should_include(&self, relative_path: &Path) -> bool {
        let file_name = relative_path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if self
            .include_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return true;
        }

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if let Some(ext) = relative_path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            if self.exclude_extensions.contains(&ext_lower) {
                return false;
            }
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches_path(relative_path))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
