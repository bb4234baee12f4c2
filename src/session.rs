use crate::error::{FileReportError, Result};
use crate::report::{GenerationProgress, GenerationReport, ReportGenerator};
use crate::scanner::{DirectoryScanner, FileEntry, ScanResult};
use crate::ui::GracefulShutdown;
use regex::Regex;
use std::collections::HashSet;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

/// Scan ids are unique across every session in the process.
static NEXT_SCAN_ID: AtomicU64 = AtomicU64::new(1);

/// Owns the most recent [`ScanResult`].
///
/// Every successful scan replaces the previous one wholesale and gets a new
/// scan id. A [`Selection`] made against any other scan is rejected.
#[derive(Debug, Default)]
pub struct Session {
    current: Option<ScanResult>,
    scan_id: u64,
}

/// Entries picked from one scan, in the order they were chosen.
#[derive(Debug, Clone)]
pub struct Selection {
    scan_id: u64,
    entries: Vec<FileEntry>,
}

impl Selection {
    pub fn scan_id(&self) -> u64 {
        self.scan_id
    }

    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn from_entries<'a, I>(scan_id: u64, entries: I) -> Self
    where
        I: IntoIterator<Item = &'a FileEntry>,
    {
        let mut seen = HashSet::new();
        let entries = entries
            .into_iter()
            .filter(|e| seen.insert(e.path.clone()))
            .cloned()
            .collect();

        Self { scan_id, entries }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans `root` and makes the result current. A failed scan leaves the
    /// previous result in place.
    pub fn scan<P: AsRef<Path>>(&mut self, scanner: &DirectoryScanner, root: P) -> Result<&ScanResult> {
        let result = scanner.scan(root)?;
        Ok(self.install(result))
    }

    /// Makes a scan produced elsewhere (e.g. on a worker thread) current.
    pub fn install(&mut self, result: ScanResult) -> &ScanResult {
        self.scan_id = NEXT_SCAN_ID.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(scan_id = self.scan_id, files = result.len(), "scan installed");
        self.current.insert(result)
    }

    pub fn current(&self) -> Option<&ScanResult> {
        self.current.as_ref()
    }

    pub fn root(&self) -> Option<&PathBuf> {
        self.current.as_ref().map(|scan| &scan.root)
    }

    pub fn scan_id(&self) -> u64 {
        self.scan_id
    }

    fn require_scan(&self) -> Result<&ScanResult> {
        self.current.as_ref().ok_or(FileReportError::NoRootSelected)
    }

    pub fn select_all(&self) -> Result<Selection> {
        let scan = self.require_scan()?;
        Ok(Selection::from_entries(self.scan_id, scan.iter()))
    }

    /// Selects entries by zero-based position in the current listing.
    pub fn select_indices(&self, indices: &[usize]) -> Result<Selection> {
        let scan = self.require_scan()?;

        let entries = indices
            .iter()
            .map(|&index| scan.get(index).ok_or_else(|| out_of_range(index, scan.len())))
            .collect::<Result<Vec<_>>>()?;

        Ok(Selection::from_entries(self.scan_id, entries))
    }

    /// Selects zero-based inclusive ranges of the current listing, in the order given.
    ///
    /// Every range is bounds-checked before any of them is expanded.
    pub fn select_ranges(&self, ranges: &[RangeInclusive<usize>]) -> Result<Selection> {
        let scan = self.require_scan()?;

        for range in ranges {
            if range.start() > range.end() {
                return Err(FileReportError::InvalidSelection {
                    message: format!(
                        "range {}-{} is reversed",
                        range.start().saturating_add(1),
                        range.end().saturating_add(1)
                    ),
                });
            }
            if *range.end() >= scan.len() {
                return Err(out_of_range(*range.end(), scan.len()));
            }
        }

        let entries = ranges
            .iter()
            .flat_map(|range| scan.entries[range.clone()].iter());

        Ok(Selection::from_entries(self.scan_id, entries))
    }

    /// Selects, in listing order, every entry whose full path matches one of `patterns`.
    pub fn select_matching(&self, patterns: &[Regex]) -> Result<Selection> {
        let scan = self.require_scan()?;
        let entries = scan.iter().filter(|entry| {
            let path = entry.path.to_string_lossy();
            patterns.iter().any(|p| p.is_match(&path))
        });

        Ok(Selection::from_entries(self.scan_id, entries))
    }

    /// Combines several selections of the current scan, keeping first occurrences.
    pub fn merge(&self, selections: &[Selection]) -> Result<Selection> {
        for selection in selections {
            self.check_current(selection)?;
        }

        Ok(Selection::from_entries(
            self.scan_id,
            selections.iter().flat_map(|s| s.entries.iter()),
        ))
    }

    fn check_current(&self, selection: &Selection) -> Result<()> {
        self.require_scan()?;

        if selection.scan_id != self.scan_id {
            return Err(FileReportError::StaleSelection {
                selection_scan: selection.scan_id,
                current_scan: self.scan_id,
            });
        }

        Ok(())
    }

    /// Validates `selection` against the current scan and returns its entries.
    pub fn checked_entries<'a>(&self, selection: &'a Selection) -> Result<&'a [FileEntry]> {
        self.check_current(selection)?;

        if selection.is_empty() {
            return Err(FileReportError::EmptySelection);
        }

        Ok(selection.entries())
    }

    pub fn generate(
        &self,
        generator: &ReportGenerator,
        selection: &Selection,
        destination: &Path,
    ) -> Result<GenerationReport> {
        self.generate_with(generator, selection, destination, None, None)
    }

    pub fn generate_with(
        &self,
        generator: &ReportGenerator,
        selection: &Selection,
        destination: &Path,
        progress_callback: Option<&dyn Fn(&GenerationProgress)>,
        shutdown: Option<&GracefulShutdown>,
    ) -> Result<GenerationReport> {
        let entries = self.checked_entries(selection)?;
        generator.generate_with(entries, destination, progress_callback, shutdown)
    }
}

fn out_of_range(index: usize, len: usize) -> FileReportError {
    FileReportError::InvalidSelection {
        message: format!(
            "entry {} does not exist (listing has {} entries)",
            index.saturating_add(1),
            len
        ),
    }
}
