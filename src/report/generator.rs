use crate::config::{BinaryPolicy, ErrorPolicy, ReportConfig};
use crate::error::{FileReportError, Result};
use crate::report::destination::ReportDestination;
use crate::scanner::FileEntry;
use crate::ui::GracefulShutdown;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const WRITE_BUFFER_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone)]
pub struct GenerationProgress {
    pub files_processed: usize,
    pub total_files: usize,
    pub bytes_processed: u64,
    pub current_file: Option<String>,
    pub start_time: Instant,
    pub errors: Vec<String>,
}

impl GenerationProgress {
    pub fn new(total_files: usize) -> Self {
        Self {
            files_processed: 0,
            total_files,
            bytes_processed: 0,
            current_file: None,
            start_time: Instant::now(),
            errors: Vec::new(),
        }
    }

    pub fn update_file(&mut self, filename: String, bytes: u64) {
        self.files_processed += 1;
        self.bytes_processed += bytes;
        self.current_file = Some(filename);
    }

    pub fn add_error<S: Into<String>>(&mut self, error: S) {
        self.files_processed += 1;
        self.errors.push(error.into());
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn estimated_remaining(&self) -> Duration {
        if self.files_processed == 0 {
            return Duration::from_secs(0);
        }

        let rate = self.files_processed as f64 / self.elapsed().as_secs_f64();
        let remaining_files = self.total_files.saturating_sub(self.files_processed);

        if rate > 0.0 && rate.is_finite() {
            Duration::from_secs_f64(remaining_files as f64 / rate)
        } else {
            Duration::from_secs(0)
        }
    }
}

/// A selected file that could not be included in the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

impl FileFailure {
    fn into_error(self) -> FileReportError {
        FileReportError::FileReadFailure {
            path: self.path.display().to_string(),
            reason: self.reason,
        }
    }
}

/// Outcome of a successful generation.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationReport {
    pub destination: PathBuf,
    pub sections_written: usize,
    pub bytes_written: u64,
    /// Files left out under [`ErrorPolicy::Continue`].
    pub failures: Vec<FileFailure>,
    /// Files written as a placeholder under [`BinaryPolicy::Skip`].
    pub binary_skipped: Vec<PathBuf>,
    /// Files decoded with replacement characters under [`BinaryPolicy::Lossy`].
    pub lossy: Vec<PathBuf>,
    pub generated_at: DateTime<Utc>,
    pub duration: Duration,
}

impl GenerationReport {
    pub fn has_warnings(&self) -> bool {
        !self.failures.is_empty()
    }
}

enum SectionBody {
    Text(String),
    Lossy(String),
    Omitted(usize),
}

pub struct ReportGenerator {
    label: String,
    separator_width: usize,
    error_policy: ErrorPolicy,
    binary_policy: BinaryPolicy,
}

impl ReportGenerator {
    pub fn new(config: &ReportConfig) -> Self {
        Self {
            label: config.label.clone(),
            separator_width: config.separator_width,
            error_policy: config.error_policy,
            binary_policy: config.binary_policy,
        }
    }

    pub fn with_label<S: Into<String>>(mut self, label: S) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_binary_policy(mut self, policy: BinaryPolicy) -> Self {
        self.binary_policy = policy;
        self
    }

    pub fn separator(&self) -> String {
        "=".repeat(self.separator_width)
    }

    pub fn generate(&self, entries: &[FileEntry], destination: &Path) -> Result<GenerationReport> {
        self.generate_with(entries, destination, None, None)
    }

    /// Writes one section per entry, in the given order, to `destination`.
    ///
    /// An empty `entries` slice fails before anything is touched. The
    /// destination is replaced only once every section has been written; on
    /// any error it keeps its previous content.
    pub fn generate_with(
        &self,
        entries: &[FileEntry],
        destination: &Path,
        progress_callback: Option<&dyn Fn(&GenerationProgress)>,
        shutdown: Option<&GracefulShutdown>,
    ) -> Result<GenerationReport> {
        if entries.is_empty() {
            return Err(FileReportError::EmptySelection);
        }

        let output = ReportDestination::prepare(destination)?;
        let mut progress = GenerationProgress::new(entries.len());
        let mut failures = Vec::new();
        let mut binary_skipped = Vec::new();
        let mut lossy = Vec::new();
        let mut sections_written = 0;

        {
            let mut writer = BufWriter::with_capacity(WRITE_BUFFER_SIZE, output.file());

            for entry in entries {
                if let Some(shutdown) = shutdown {
                    shutdown.check_shutdown()?;
                }
                if let Some(callback) = progress_callback {
                    callback(&progress);
                }

                let body = match self.read_entry(entry) {
                    Ok(body) => body,
                    Err(failure) => {
                        tracing::warn!(path = %failure.path.display(), "{}", failure.reason);
                        match self.error_policy {
                            ErrorPolicy::Abort => return Err(failure.into_error()),
                            ErrorPolicy::Continue => {
                                progress.add_error(format!(
                                    "{}: {}",
                                    failure.path.display(),
                                    failure.reason
                                ));
                                failures.push(failure);
                                continue;
                            }
                        }
                    }
                };

                let written = match body {
                    SectionBody::Text(content) => self.write_section(&mut writer, entry, &content)?,
                    SectionBody::Lossy(content) => {
                        lossy.push(entry.path.clone());
                        self.write_section(&mut writer, entry, &content)?
                    }
                    SectionBody::Omitted(len) => {
                        binary_skipped.push(entry.path.clone());
                        let note = format!("[binary content omitted: {} bytes]", len);
                        self.write_section(&mut writer, entry, &note)?
                    }
                };

                sections_written += 1;
                progress.update_file(entry.name.clone(), written);
            }

            if let Some(callback) = progress_callback {
                callback(&progress);
            }

            if sections_written == 0 {
                if let Some(first) = failures.into_iter().next() {
                    return Err(first.into_error());
                }
                return Err(FileReportError::EmptySelection);
            }

            writer.flush()?;
        }

        let destination = output.commit()?;

        tracing::info!(
            destination = %destination.display(),
            sections = sections_written,
            failures = failures.len(),
            "report written"
        );

        Ok(GenerationReport {
            destination,
            sections_written,
            bytes_written: progress.bytes_processed,
            failures,
            binary_skipped,
            lossy,
            generated_at: Utc::now(),
            duration: progress.elapsed(),
        })
    }

    fn read_entry(&self, entry: &FileEntry) -> std::result::Result<SectionBody, FileFailure> {
        let failure = |reason: String| FileFailure {
            path: entry.path.clone(),
            reason,
        };

        let bytes = fs::read(&entry.path).map_err(|e| failure(e.to_string()))?;

        match String::from_utf8(bytes) {
            Ok(content) => Ok(SectionBody::Text(content)),
            Err(err) => match self.binary_policy {
                BinaryPolicy::Fail => Err(failure(format!(
                    "content is not valid UTF-8 text ({})",
                    err.utf8_error()
                ))),
                BinaryPolicy::Skip => Ok(SectionBody::Omitted(err.as_bytes().len())),
                BinaryPolicy::Lossy => Ok(SectionBody::Lossy(
                    String::from_utf8_lossy(err.as_bytes()).into_owned(),
                )),
            },
        }
    }

    fn write_section<W: Write>(&self, writer: &mut W, entry: &FileEntry, content: &str) -> Result<u64> {
        writeln!(writer, "{}", entry.path.display())?;
        writeln!(writer, "{}", self.label)?;
        writer.write_all(content.as_bytes())?;
        writeln!(writer)?;
        writeln!(writer, "{}", self.separator())?;
        Ok(content.len() as u64)
    }
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self::new(&ReportConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use crate::scanner::DirectoryScanner;
    use std::time::SystemTime;
    use tempfile::TempDir;

    fn create_entry(dir: &Path, name: &str, content: &[u8]) -> FileEntry {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        FileEntry::new(path, PathBuf::from(name), content.len() as u64, SystemTime::UNIX_EPOCH)
    }

    #[test]
    fn test_reference_layout() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("b.txt"), "world").unwrap();

        let scan = DirectoryScanner::new(&ScanConfig::default())
            .unwrap()
            .scan(&root)
            .unwrap();
        let output = temp_dir.path().join("output.txt");

        let report = ReportGenerator::default().generate(&scan.entries, &output).unwrap();

        let expected = format!(
            "{}\nCódigo:\nhello\n{sep}\n{}\nCódigo:\nworld\n{sep}\n",
            root.join("a.txt").display(),
            root.join("sub").join("b.txt").display(),
            sep = "=".repeat(50),
        );
        assert_eq!(fs::read_to_string(&output).unwrap(), expected);
        assert_eq!(report.sections_written, 2);
        assert_eq!(report.bytes_written, 10);
        assert!(!report.has_warnings());
    }

    #[test]
    fn test_selection_order_is_preserved() {
        let temp_dir = TempDir::new().unwrap();
        let first = create_entry(temp_dir.path(), "first.txt", b"1");
        let second = create_entry(temp_dir.path(), "second.txt", b"2");
        let output = temp_dir.path().join("out.txt");

        ReportGenerator::default()
            .generate(&[second.clone(), first.clone()], &output)
            .unwrap();

        let content = fs::read_to_string(&output).unwrap();
        let second_at = content.find(&second.display_path()).unwrap();
        let first_at = content.find(&first.display_path()).unwrap();
        assert!(second_at < first_at);
    }

    #[test]
    fn test_empty_selection_touches_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("output.txt");
        fs::write(&output, b"previous\x00bytes").unwrap();

        let result = ReportGenerator::default().generate(&[], &output);

        assert!(matches!(result, Err(FileReportError::EmptySelection)));
        assert_eq!(fs::read(&output).unwrap(), b"previous\x00bytes");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_generation_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let entries = vec![
            create_entry(temp_dir.path(), "x.rs", b"fn main() {}\n"),
            create_entry(temp_dir.path(), "y.rs", b""),
        ];
        let output = temp_dir.path().join("out.txt");
        let generator = ReportGenerator::default();

        generator.generate(&entries, &output).unwrap();
        let first = fs::read(&output).unwrap();
        generator.generate(&entries, &output).unwrap();
        let second = fs::read(&output).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_abort_policy_keeps_previous_report() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_entry(temp_dir.path(), "good.txt", b"fine");
        let missing = create_entry(temp_dir.path(), "gone.txt", b"soon gone");
        fs::remove_file(&missing.path).unwrap();
        let output = temp_dir.path().join("output.txt");
        fs::write(&output, "old report").unwrap();

        let result = ReportGenerator::default()
            .with_error_policy(ErrorPolicy::Abort)
            .generate(&[good, missing.clone()], &output);

        match result {
            Err(FileReportError::FileReadFailure { path, .. }) => {
                assert_eq!(path, missing.display_path());
            }
            other => panic!("expected FileReadFailure, got {:?}", other),
        }
        assert_eq!(fs::read_to_string(&output).unwrap(), "old report");
    }

    #[test]
    fn test_continue_policy_skips_unreadable_files() {
        let temp_dir = TempDir::new().unwrap();
        let good = create_entry(temp_dir.path(), "good.txt", b"fine");
        let missing = create_entry(temp_dir.path(), "gone.txt", b"x");
        fs::remove_file(&missing.path).unwrap();
        let output = temp_dir.path().join("output.txt");

        let report = ReportGenerator::default()
            .with_error_policy(ErrorPolicy::Continue)
            .generate(&[missing.clone(), good.clone()], &output)
            .unwrap();

        assert_eq!(report.sections_written, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].path, missing.path);
        assert!(report.has_warnings());

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.starts_with(&good.display_path()));
        assert!(!content.contains("gone.txt"));
    }

    #[test]
    fn test_continue_policy_with_nothing_readable_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = create_entry(temp_dir.path(), "gone.txt", b"x");
        fs::remove_file(&missing.path).unwrap();
        let output = temp_dir.path().join("output.txt");

        let result = ReportGenerator::default().generate(&[missing], &output);

        assert!(matches!(result, Err(FileReportError::FileReadFailure { .. })));
        assert!(!output.exists());
    }

    #[test]
    fn test_binary_policies() {
        let temp_dir = TempDir::new().unwrap();
        let binary = create_entry(temp_dir.path(), "blob.bin", &[0x66, 0x6f, 0xff, 0x6f]);
        let output = temp_dir.path().join("output.txt");

        let result = ReportGenerator::default()
            .with_error_policy(ErrorPolicy::Abort)
            .with_binary_policy(BinaryPolicy::Fail)
            .generate(std::slice::from_ref(&binary), &output);
        assert!(matches!(result, Err(FileReportError::FileReadFailure { .. })));

        let report = ReportGenerator::default()
            .with_binary_policy(BinaryPolicy::Skip)
            .generate(std::slice::from_ref(&binary), &output)
            .unwrap();
        assert_eq!(report.binary_skipped, vec![binary.path.clone()]);
        assert!(fs::read_to_string(&output)
            .unwrap()
            .contains("[binary content omitted: 4 bytes]"));

        let report = ReportGenerator::default()
            .with_binary_policy(BinaryPolicy::Lossy)
            .generate(std::slice::from_ref(&binary), &output)
            .unwrap();
        assert_eq!(report.lossy.len(), 1);
        assert!(fs::read_to_string(&output).unwrap().contains("fo\u{FFFD}o"));
    }

    #[test]
    fn test_content_read_at_generation_time() {
        let temp_dir = TempDir::new().unwrap();
        let entry = create_entry(temp_dir.path(), "live.txt", b"before");
        fs::write(&entry.path, "after").unwrap();
        let output = temp_dir.path().join("output.txt");

        ReportGenerator::default().generate(&[entry], &output).unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("\nafter\n"));
        assert!(!content.contains("before"));
    }

    #[test]
    fn test_custom_label() {
        let temp_dir = TempDir::new().unwrap();
        let entry = create_entry(temp_dir.path(), "a.txt", b"x");
        let output = temp_dir.path().join("output.txt");

        ReportGenerator::default()
            .with_label("Code:")
            .generate(&[entry.clone()], &output)
            .unwrap();

        let content = fs::read_to_string(&output).unwrap();
        assert_eq!(
            content,
            format!("{}\nCode:\nx\n{}\n", entry.display_path(), "=".repeat(50))
        );
    }

    #[test]
    fn test_cancellation_leaves_destination() {
        let temp_dir = TempDir::new().unwrap();
        let entry = create_entry(temp_dir.path(), "a.txt", b"x");
        let output = temp_dir.path().join("output.txt");
        let shutdown = GracefulShutdown::new_for_test();
        shutdown.request_shutdown();

        let result = ReportGenerator::default().generate_with(&[entry], &output, None, Some(&shutdown));

        assert!(matches!(result, Err(FileReportError::Cancelled)));
        assert!(!output.exists());
    }

    #[test]
    fn test_progress_tracking() {
        let mut progress = GenerationProgress::new(10);

        assert_eq!(progress.estimated_remaining(), Duration::from_secs(0));

        progress.update_file("file1.txt".to_string(), 100);
        assert_eq!(progress.files_processed, 1);
        assert_eq!(progress.bytes_processed, 100);

        progress.add_error("Test error");
        assert_eq!(progress.errors.len(), 1);
        assert_eq!(progress.files_processed, 2);
    }
}
