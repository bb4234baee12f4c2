use crate::config::{BinaryPolicy, CliOverrides, Config, ErrorPolicy};
use crate::error::{FileReportError, Result};
use clap::{Parser, ValueEnum};
use regex::Regex;
use std::ops::RangeInclusive;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "filereport")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Bundle selected files of a directory into one annotated text report")]
#[command(
    long_about = "FileReport scans a directory, lists every file it contains and writes the \
                  contents of the files you pick into a single text report, each section headed \
                  by the file's full path."
)]
#[command(after_help = "EXAMPLES:\n  \
    filereport ./project --list\n  \
    filereport ./project --all\n  \
    filereport ./project --pick 1,3-5 --output bundle.txt\n  \
    filereport ./project --match '\\.rs$' --exclude target,.git --on-error abort\n  \
    filereport --generate-config --config filereport.toml")]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Directory to scan
    #[arg(required_unless_present = "generate_config")]
    pub root: Option<PathBuf>,

    /// Report file to write (defaults to output.txt)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the numbered listing and exit
    #[arg(short, long)]
    pub list: bool,

    /// Select entries by 1-based number, e.g. 1,3-5
    #[arg(short, long, conflicts_with = "all")]
    pub pick: Option<String>,

    /// Select entries whose full path matches the regular expression (repeatable)
    #[arg(short = 'm', long = "match", value_name = "REGEX", conflicts_with = "all")]
    pub patterns: Vec<String>,

    /// Select every listed entry
    #[arg(short, long)]
    pub all: bool,

    /// Directory names to skip while scanning
    #[arg(short, long, value_delimiter = ',')]
    pub exclude: Option<Vec<String>>,

    /// Only list files with these extensions (comma-separated)
    #[arg(long, value_name = "EXTS")]
    pub ext: Option<String>,

    /// Maximum directory depth to descend
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// Label line written between a file's path and its content
    #[arg(long)]
    pub label: Option<String>,

    /// What to do when a selected file cannot be read
    #[arg(long, value_enum)]
    pub on_error: Option<ErrorPolicy>,

    /// How to handle files that are not valid UTF-8
    #[arg(long, value_enum)]
    pub binary: Option<BinaryPolicy>,

    /// Configuration file path
    #[arg(short, long, help = "Path to TOML configuration file")]
    pub config: Option<PathBuf>,

    /// Output format for messages and results
    #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
    pub output_format: OutputFormat,

    /// Verbose output level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (suppress non-essential output)
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Show what would be written without writing it
    #[arg(long)]
    pub dry_run: bool,

    /// Generate sample configuration file
    #[arg(long, help = "Generate a sample configuration file")]
    pub generate_config: bool,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored output
    Human,
    /// JSON formatted output
    Json,
    /// Plain text output
    Plain,
}

/// How the user chose entries from the listing.
#[derive(Debug, Clone, Default)]
pub enum SelectionRequest {
    /// Nothing chosen yet.
    #[default]
    Nothing,
    All,
    Chosen {
        /// Zero-based inclusive ranges of listing positions.
        ranges: Vec<RangeInclusive<usize>>,
        patterns: Vec<Regex>,
    },
}

impl Cli {
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load_with_defaults(self.config.as_ref())?;

        let overrides = self.create_cli_overrides();
        config.merge_with_cli_args(&overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn create_cli_overrides(&self) -> CliOverrides {
        CliOverrides::new()
            .with_exclude(self.exclude.clone())
            .with_extensions(self.ext.clone())
            .with_max_depth(self.max_depth)
            .with_destination(self.output.clone())
            .with_label(self.label.clone())
            .with_error_policy(self.on_error)
            .with_binary_policy(self.binary)
    }

    pub fn selection_request(&self) -> Result<SelectionRequest> {
        if self.all {
            return Ok(SelectionRequest::All);
        }

        let ranges = match self.pick {
            Some(ref list) => parse_index_ranges(list)
                .map_err(|message| FileReportError::InvalidSelection { message })?,
            None => Vec::new(),
        };

        let patterns = self
            .patterns
            .iter()
            .map(|p| Regex::new(p))
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if self.pick.is_none() && patterns.is_empty() {
            return Ok(SelectionRequest::Nothing);
        }

        Ok(SelectionRequest::Chosen { ranges, patterns })
    }

    pub fn verbosity_level(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose
        }
    }
}

/// Parses a 1-based list such as `1,3-5` into zero-based inclusive ranges, in the order given.
///
/// Ranges are not expanded here; bounds are checked against the listing.
pub fn parse_index_ranges(s: &str) -> std::result::Result<Vec<RangeInclusive<usize>>, String> {
    let mut ranges = Vec::new();

    for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let (start, end) = match part.split_once('-') {
            Some((start, end)) => (parse_position(start)?, parse_position(end)?),
            None => {
                let position = parse_position(part)?;
                (position, position)
            }
        };

        if start > end {
            return Err(format!("Range {} is reversed", part));
        }

        ranges.push(start - 1..=end - 1);
    }

    if ranges.is_empty() {
        return Err("No entry numbers given".to_string());
    }

    Ok(ranges)
}

fn parse_position(s: &str) -> std::result::Result<usize, String> {
    let n: usize = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid entry number: {}", s.trim()))?;

    if n == 0 {
        return Err("Entry numbers start at 1".to_string());
    }

    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_index_ranges() {
        assert_eq!(parse_index_ranges("1").unwrap(), vec![0..=0]);
        assert_eq!(parse_index_ranges("3,1").unwrap(), vec![2..=2, 0..=0]);
        assert_eq!(parse_index_ranges("2-4, 7").unwrap(), vec![1..=3, 6..=6]);
        assert_eq!(parse_index_ranges("5-5").unwrap(), vec![4..=4]);

        assert!(parse_index_ranges("0").is_err());
        assert!(parse_index_ranges("4-2").is_err());
        assert!(parse_index_ranges("a,b").is_err());
        assert!(parse_index_ranges(" , ").is_err());
        assert!(parse_index_ranges("1-18446744073709551616").is_err());
    }

    #[test]
    fn test_huge_range_is_not_expanded() {
        let ranges = parse_index_ranges("1-18446744073709551615").unwrap();
        assert_eq!(ranges, vec![0..=usize::MAX - 1]);
    }

    #[test]
    fn test_selection_request() {
        let cli = Cli::parse_from(["filereport", "src"]);
        assert!(matches!(cli.selection_request().unwrap(), SelectionRequest::Nothing));

        let cli = Cli::parse_from(["filereport", "src", "--all"]);
        assert!(matches!(cli.selection_request().unwrap(), SelectionRequest::All));

        let cli = Cli::parse_from(["filereport", "src", "-p", "2,1", "-m", r"\.rs$"]);
        match cli.selection_request().unwrap() {
            SelectionRequest::Chosen { ranges, patterns } => {
                assert_eq!(ranges, vec![1..=1, 0..=0]);
                assert_eq!(patterns.len(), 1);
            }
            other => panic!("unexpected request: {:?}", other),
        }

        let cli = Cli::parse_from(["filereport", "src", "-m", "("]);
        assert!(matches!(
            cli.selection_request(),
            Err(FileReportError::InvalidSelection { .. })
        ));
    }

    #[test]
    fn test_cli_overrides_reach_config() {
        let cli = Cli::parse_from([
            "filereport",
            "src",
            "--output",
            "bundle.txt",
            "--on-error",
            "abort",
            "--binary",
            "skip",
            "--exclude",
            "target,.git",
        ]);

        let mut config = Config::default();
        config.merge_with_cli_args(&cli.create_cli_overrides());

        assert_eq!(config.report.destination, PathBuf::from("bundle.txt"));
        assert_eq!(config.report.error_policy, ErrorPolicy::Abort);
        assert_eq!(config.report.binary_policy, BinaryPolicy::Skip);
        assert_eq!(config.scan.exclude_dirs, vec!["target", ".git"]);
    }

    #[test]
    fn test_root_required_unless_generating_config() {
        assert!(Cli::try_parse_from(["filereport", "--all"]).is_err());
        assert!(Cli::try_parse_from(["filereport", "--generate-config"]).is_ok());
    }

    #[test]
    fn test_all_conflicts_with_pick() {
        assert!(Cli::try_parse_from(["filereport", "src", "--all", "--pick", "1"]).is_err());
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::parse_from(["filereport", "src", "-vv"]);
        assert_eq!(cli.verbosity_level(), 2);

        let cli = Cli::parse_from(["filereport", "src", "-q"]);
        assert_eq!(cli.verbosity_level(), 0);
    }
}
