pub mod directory_scanner;
pub mod file_filter;

pub use directory_scanner::{DirectoryScanner, FileEntry, ScanResult, ScanStatistics};
pub use file_filter::FileFilter;
