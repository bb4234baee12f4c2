use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileReportError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid root directory: {path} ({reason})")]
    InvalidRoot { path: String, reason: String },

    #[error("No files selected")]
    EmptySelection,

    #[error("No root directory has been scanned")]
    NoRootSelected,

    #[error("Selection belongs to scan #{selection_scan}, current scan is #{current_scan}")]
    StaleSelection {
        selection_scan: u64,
        current_scan: u64,
    },

    #[error("Failed to read {path}: {reason}")]
    FileReadFailure { path: String, reason: String },

    #[error("Invalid selection: {message}")]
    InvalidSelection { message: String },

    #[error("Invalid destination: {path} ({reason})")]
    InvalidDestination { path: String, reason: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for FileReportError {
    fn user_message(&self) -> String {
        match self {
            FileReportError::InvalidRoot { path, reason } => {
                format!("Cannot scan '{}': {}", path, reason)
            }
            FileReportError::EmptySelection => {
                "No file selected. Please select at least one file.".to_string()
            }
            FileReportError::NoRootSelected => {
                "No folder selected. Please select a folder first.".to_string()
            }
            FileReportError::StaleSelection { .. } => {
                "The selection refers to an outdated listing of the folder".to_string()
            }
            FileReportError::FileReadFailure { path, reason } => {
                format!("Could not read {}: {}", path, reason)
            }
            FileReportError::InvalidSelection { message } => {
                format!("Invalid selection: {}", message)
            }
            FileReportError::InvalidDestination { path, reason } => {
                format!("Cannot write report to {}: {}", path, reason)
            }
            FileReportError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            FileReportError::Cancelled => "Operation was cancelled by user".to_string(),
            FileReportError::Io(_) => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            FileReportError::InvalidRoot { .. } => Some(
                "Check that the path exists, is a directory and that you are allowed to list it.".to_string()
            ),
            FileReportError::EmptySelection => Some(
                "Use --all, --pick 1,3-5 or --match <REGEX> to choose files. Run with --list to see the numbered listing.".to_string()
            ),
            FileReportError::NoRootSelected | FileReportError::StaleSelection { .. } => Some(
                "Scan the folder again and select files from the new listing.".to_string()
            ),
            FileReportError::FileReadFailure { .. } => Some(
                "Use --on-error continue to skip unreadable files, or --binary skip|lossy for non-text files.".to_string()
            ),
            FileReportError::InvalidSelection { .. } => Some(
                "Indices are 1-based and may be ranges, e.g. --pick 1,4-6. Patterns are regular expressions.".to_string()
            ),
            FileReportError::InvalidDestination { .. } => Some(
                "Choose an output file path whose parent directory exists, e.g. --output report.txt".to_string()
            ),
            FileReportError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all values are valid.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for FileReportError {
    fn from(error: toml::de::Error) -> Self {
        FileReportError::Config {
            message: error.to_string(),
        }
    }
}

impl From<regex::Error> for FileReportError {
    fn from(error: regex::Error) -> Self {
        FileReportError::InvalidSelection {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, FileReportError>;

pub(crate) fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    if unit_index == 0 {
        format!("{} {}", bytes, UNITS[unit_index])
    } else {
        format!("{:.1} {}", size, UNITS[unit_index])
    }
}
