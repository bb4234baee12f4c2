use crate::config::ScanConfig;
use crate::error::{FileReportError, Result};
use regex::Regex;
use std::path::Path;

/// Decides which directories are descended into and which files are listed.
///
/// With a default [`ScanConfig`] nothing is filtered out.
pub struct FileFilter {
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_patterns: Vec<Regex>,
    include_hidden: bool,
}

impl FileFilter {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        let exclude_patterns = config
            .exclude_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| FileReportError::Config {
                    message: format!("Invalid exclude pattern '{}': {}", pattern, e),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            extensions: config
                .extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            exclude_dirs: config
                .exclude_dirs
                .iter()
                .map(|d| d.to_lowercase())
                .collect(),
            exclude_patterns,
            include_hidden: config.include_hidden,
        })
    }

    /// `path` is relative to the scan root, so exclude patterns never see the root itself.
    pub fn should_list_file(&self, path: &Path) -> bool {
        if !self.include_hidden && is_hidden(path) {
            return false;
        }

        if self.matches_any_pattern(&path.to_string_lossy()) {
            return false;
        }

        if self.extensions.is_empty() {
            return true;
        }

        path.extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_lowercase()))
    }

    pub fn should_traverse_directory(&self, path: &Path) -> bool {
        if let Some(dir_name) = path.file_name().and_then(|s| s.to_str()) {
            let dir_name_lower = dir_name.to_lowercase();

            if self.exclude_dirs.iter().any(|d| *d == dir_name_lower) {
                return false;
            }

            if !self.include_hidden && is_hidden(path) {
                return false;
            }
        }

        !self.matches_any_pattern(&path.to_string_lossy())
    }

    pub fn matches_any_pattern(&self, text: &str) -> bool {
        self.exclude_patterns.iter().any(|p| p.is_match(text))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|s| s.to_str())
        .is_some_and(|name| name.starts_with('.') && name != "." && name != "..")
}
