use crate::error::{FileReportError, Result};
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_DESTINATION: &str = "output.txt";
pub const DEFAULT_LABEL: &str = "Código:";
pub const DEFAULT_SEPARATOR_WIDTH: usize = 50;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub scan: ScanConfig,
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names that are never descended into (case-insensitive).
    pub exclude_dirs: Vec<String>,
    /// Regexes matched against full paths; matching files and directories are skipped.
    pub exclude_patterns: Vec<String>,
    /// When non-empty, only files with one of these extensions are listed.
    pub extensions: Vec<String>,
    pub max_depth: Option<usize>,
    pub include_hidden: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReportConfig {
    pub destination: PathBuf,
    pub label: String,
    pub separator_width: usize,
    pub error_policy: ErrorPolicy,
    pub binary_policy: BinaryPolicy,
}

/// What to do when a selected file cannot be read at generation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Stop at the first unreadable file and leave the destination untouched.
    Abort,
    /// Skip unreadable files and report them after writing the rest.
    #[default]
    Continue,
}

/// How to treat file content that is not valid UTF-8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BinaryPolicy {
    /// Treat it as a read failure.
    #[default]
    Fail,
    /// Write a placeholder line instead of the content.
    Skip,
    /// Decode lossily, replacing invalid sequences with U+FFFD.
    Lossy,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            exclude_dirs: Vec::new(),
            exclude_patterns: Vec::new(),
            extensions: Vec::new(),
            max_depth: None,
            include_hidden: true,
        }
    }
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            destination: PathBuf::from(DEFAULT_DESTINATION),
            label: DEFAULT_LABEL.to_string(),
            separator_width: DEFAULT_SEPARATOR_WIDTH,
            error_policy: ErrorPolicy::default(),
            binary_policy: BinaryPolicy::default(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(FileReportError::Config {
                message: format!("Configuration file not found: {}", path.display()),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| FileReportError::Config {
            message: format!("Failed to read config file {}: {}", path.display(), e),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| FileReportError::Config {
            message: format!("Failed to parse config file {}: {}", path.display(), e),
        })?;

        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    pub fn load_with_defaults<P: AsRef<Path>>(config_path: Option<P>) -> Result<Self> {
        match config_path {
            Some(path) => Self::load_from_file(path),
            None => {
                let default_paths = ["filereport.toml", ".filereport.toml"];

                for default_path in &default_paths {
                    if Path::new(default_path).exists() {
                        return Self::load_from_file(default_path);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    pub fn merge_with_cli_args(&mut self, cli_args: &CliOverrides) {
        if let Some(ref exclude) = cli_args.exclude {
            self.scan.exclude_dirs.extend(exclude.iter().cloned());
        }

        if let Some(ref extensions) = cli_args.extensions {
            self.scan.extensions = extensions
                .split(',')
                .map(|s| s.trim().trim_start_matches('.').to_lowercase())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Some(max_depth) = cli_args.max_depth {
            self.scan.max_depth = Some(max_depth);
        }

        if let Some(ref destination) = cli_args.destination {
            self.report.destination = destination.clone();
        }

        if let Some(ref label) = cli_args.label {
            self.report.label = label.clone();
        }

        if let Some(policy) = cli_args.error_policy {
            self.report.error_policy = policy;
        }

        if let Some(policy) = cli_args.binary_policy {
            self.report.binary_policy = policy;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.report.separator_width == 0 {
            return Err(FileReportError::Config {
                message: "Separator width must be greater than 0".to_string(),
            });
        }

        if self.report.label.contains('\n') {
            return Err(FileReportError::Config {
                message: "Report label must fit on a single line".to_string(),
            });
        }

        if self.report.destination.as_os_str().is_empty() {
            return Err(FileReportError::Config {
                message: "Report destination must not be empty".to_string(),
            });
        }

        if self.scan.max_depth == Some(0) {
            return Err(FileReportError::Config {
                message: "Maximum directory depth must be greater than 0".to_string(),
            });
        }

        for pattern in &self.scan.exclude_patterns {
            Regex::new(pattern).map_err(|e| FileReportError::Config {
                message: format!("Invalid exclude pattern '{}': {}", pattern, e),
            })?;
        }

        Ok(())
    }

    pub fn create_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config).unwrap_or_else(|_| String::new())
    }
}

#[derive(Debug, Default)]
pub struct CliOverrides {
    pub exclude: Option<Vec<String>>,
    pub extensions: Option<String>,
    pub max_depth: Option<usize>,
    pub destination: Option<PathBuf>,
    pub label: Option<String>,
    pub error_policy: Option<ErrorPolicy>,
    pub binary_policy: Option<BinaryPolicy>,
}

impl CliOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exclude(mut self, exclude: Option<Vec<String>>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_extensions(mut self, extensions: Option<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_max_depth(mut self, max_depth: Option<usize>) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_destination(mut self, destination: Option<PathBuf>) -> Self {
        self.destination = destination;
        self
    }

    pub fn with_label(mut self, label: Option<String>) -> Self {
        self.label = label;
        self
    }

    pub fn with_error_policy(mut self, policy: Option<ErrorPolicy>) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_binary_policy(mut self, policy: Option<BinaryPolicy>) -> Self {
        self.binary_policy = policy;
        self
    }
}
