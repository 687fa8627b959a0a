//! Extension-based file categorization.
//!
//! This module maps file extensions to configurable category names
//! (e.g., "Documents", "Images"), falling back to a default bucket.
//!
//! # Examples
//!
//! ```
//! use fileorg::category_mapper::CategoryMapper;
//!
//! let mapper = CategoryMapper::default();
//! assert_eq!(mapper.category_for("report.PDF"), "Documents");
//! assert_eq!(mapper.category_for("photo.jpeg"), "Images");
//! assert_eq!(mapper.category_for("mystery.xyz"), "Other");
//! ```

use crate::config::{ConfigError, OrganizerConfig};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;

/// Extracts the lowercase extension of a file name, including the leading dot.
///
/// Only the last dot segment counts. Names without an extension, names whose
/// only dot is the leading one, and names ending in a dot yield `""`.
///
/// # Examples
///
/// ```
/// use fileorg::category_mapper::extension_of;
///
/// assert_eq!(extension_of("Report.PDF"), ".pdf");
/// assert_eq!(extension_of("archive.tar.gz"), ".gz");
/// assert_eq!(extension_of(".bashrc"), "");
/// assert_eq!(extension_of("README"), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(0) | None => String::new(),
        Some(idx) if idx + 1 == file_name.len() => String::new(),
        Some(idx) => file_name[idx..].to_lowercase(),
    }
}

/// Normalizes a configured extension to lowercase with a leading dot.
fn normalize_extension(ext: &str) -> String {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!(".{}", trimmed.to_lowercase())
    }
}

/// Category names become folders under the destination root, so each must be
/// exactly one normal path component.
fn validate_category_name(name: &str) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::EmptyCategoryName);
    }
    let invalid = name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || Path::new(name).is_absolute()
        || Path::new(name).components().count() != 1;
    if invalid {
        return Err(ConfigError::InvalidCategoryName(name.to_string()));
    }
    Ok(())
}

/// Maps file extensions to category names.
#[derive(Debug, Clone)]
pub struct CategoryMapper {
    extension_map: HashMap<String, String>,
    default_category: String,
}

impl CategoryMapper {
    /// Builds a mapper from a category table.
    ///
    /// # Errors
    ///
    /// Fails if an extension is listed under two categories, if an extension
    /// is empty, or if a category name (or the default) is not a usable
    /// folder name.
    pub fn from_table(
        table: &BTreeMap<String, Vec<String>>,
        default_category: &str,
    ) -> Result<Self, ConfigError> {
        validate_category_name(default_category)?;

        let mut extension_map: HashMap<String, String> = HashMap::new();
        for (category, exts) in table {
            validate_category_name(category)?;
            for ext in exts {
                let normalized = normalize_extension(ext);
                if normalized.is_empty() {
                    return Err(ConfigError::EmptyExtension(category.clone()));
                }
                match extension_map.get(&normalized) {
                    // Listing the same extension twice under one category is harmless.
                    Some(existing) if existing == category => {}
                    Some(existing) => {
                        return Err(ConfigError::DuplicateExtension {
                            extension: normalized,
                            first: existing.clone(),
                            second: category.clone(),
                        });
                    }
                    None => {
                        extension_map.insert(normalized, category.clone());
                    }
                }
            }
        }

        Ok(Self {
            extension_map,
            default_category: default_category.to_string(),
        })
    }

    /// Returns the category for a file name, or the default category.
    pub fn category_for(&self, file_name: &str) -> &str {
        self.category_for_extension(&extension_of(file_name))
            .unwrap_or(&self.default_category)
    }

    /// Looks up a single extension. Accepts `pdf`, `.pdf` or `.PDF`.
    pub fn category_for_extension(&self, ext: &str) -> Option<&str> {
        self.extension_map
            .get(&normalize_extension(ext))
            .map(String::as_str)
    }

    /// The bucket used for unmapped extensions.
    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    /// Number of mapped extensions.
    pub fn len(&self) -> usize {
        self.extension_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extension_map.is_empty()
    }

    /// Category names with their extensions, sorted for display.
    pub fn categories(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for (ext, category) in &self.extension_map {
            grouped.entry(category.as_str()).or_default().push(ext.as_str());
        }
        for exts in grouped.values_mut() {
            exts.sort_unstable();
        }
        grouped
    }
}

impl Default for CategoryMapper {
    fn default() -> Self {
        let config = OrganizerConfig::default();
        Self::from_table(&config.category_table(), &config.default_category)
            .unwrap_or_else(|_| Self {
                extension_map: HashMap::new(),
                default_category: config.default_category,
            })
    }
}
