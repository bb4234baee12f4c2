pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod report;
pub mod scanner;
pub mod session;
pub mod ui;

// Public API re-exports
pub use cli::{Cli, OutputFormat, SelectionRequest};
pub use config::{BinaryPolicy, CliOverrides, Config, ErrorPolicy, ReportConfig, ScanConfig};
pub use error::{FileReportError, Result, UserFriendlyError};

// Core functionality re-exports
pub use report::{FileFailure, GenerationProgress, GenerationReport, ReportGenerator};
pub use scanner::{DirectoryScanner, FileEntry, FileFilter, ScanResult, ScanStatistics};
pub use session::{Selection, Session};
pub use ui::{GracefulShutdown, NotificationKind, Notifier, OutputFormatter, OutputMode, ProgressManager};

use std::path::Path;
use tokio::task;

/// Main library interface: scan a folder, pick files, write the report.
pub struct FileReport {
    config: Config,
    output_formatter: OutputFormatter,
    progress_manager: ProgressManager,
    shutdown: GracefulShutdown,
    session: Session,
}

impl FileReport {
    pub fn new(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Result<Self> {
        let shutdown = GracefulShutdown::new()?;
        Ok(Self::with_shutdown(config, output_mode, verbose, quiet, shutdown))
    }

    /// Create a FileReport instance for testing (no signal handler conflicts)
    pub fn new_for_test(config: Config, output_mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        Self::with_shutdown(config, output_mode, verbose, quiet, GracefulShutdown::new_for_test())
    }

    fn with_shutdown(
        config: Config,
        output_mode: OutputMode,
        verbose: u8,
        quiet: bool,
        shutdown: GracefulShutdown,
    ) -> Self {
        let output_formatter = OutputFormatter::new(output_mode, verbose, quiet);
        let progress_manager = ProgressManager::new(!quiet && output_mode == OutputMode::Human);

        Self {
            config,
            output_formatter,
            progress_manager,
            shutdown,
            session: Session::new(),
        }
    }

    /// Create FileReport instance from CLI arguments
    pub fn from_cli(cli_args: &Cli) -> Result<Self> {
        let config = cli_args.load_config()?;
        let output_mode = match cli_args.output_format {
            OutputFormat::Human => OutputMode::Human,
            OutputFormat::Json => OutputMode::Json,
            OutputFormat::Plain => OutputMode::Plain,
        };

        Self::new(config, output_mode, cli_args.verbosity_level(), cli_args.quiet)
    }

    /// Scan `root` and list it, then write the report for the requested entries.
    ///
    /// Returns `Ok(None)` when nothing is written (`list_only` or `dry_run`).
    pub async fn run(
        &mut self,
        root: &Path,
        request: &SelectionRequest,
        list_only: bool,
        dry_run: bool,
    ) -> Result<Option<GenerationReport>> {
        self.shutdown.check_shutdown()?;

        self.scan(root).await?;
        if let Some(scan) = self.session.current() {
            if list_only || matches!(request, SelectionRequest::Nothing) {
                self.output_formatter.print_listing(scan);
            } else {
                for warning in &scan.warnings {
                    self.output_formatter.notify(NotificationKind::Warning, warning);
                }
            }
        }
        if list_only {
            return Ok(None);
        }
        self.shutdown.check_shutdown()?;

        let selection = self.select(request)?;
        if selection.is_empty() {
            return Err(FileReportError::EmptySelection);
        }

        if dry_run {
            self.print_dry_run(&selection);
            return Ok(None);
        }

        let report = self.generate(&selection).await?;
        self.output_formatter.notify(
            NotificationKind::Success,
            &format!("Report {} written successfully!", report.destination.display()),
        );
        if report.has_warnings() {
            self.output_formatter.notify(
                NotificationKind::Warning,
                &format!("{} selected file(s) could not be read and were left out", report.failures.len()),
            );
        }

        Ok(Some(report))
    }

    /// Scan a directory on the blocking pool and make the result the current listing.
    pub async fn scan(&mut self, root: &Path) -> Result<&ScanResult> {
        self.output_formatter
            .start_operation(&format!("Scanning {}", root.display()));

        let spinner = self.progress_manager.create_spinner("Scanning...");
        let worker_spinner = spinner.clone();
        let scan_config = self.config.scan.clone();
        let root_path = root.to_path_buf();

        let result = task::spawn_blocking(move || {
            let scanner = DirectoryScanner::new(&scan_config)?;
            let callback = |count: usize, _: &Path| {
                ui::progress::update_scan_progress(&worker_spinner, count);
            };
            scanner.scan_with_progress(&root_path, Some(&callback))
        })
        .await
        .map_err(|e| FileReportError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())));

        let result = match result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) | Err(e) => {
                spinner.finish_and_clear();
                return Err(e);
            }
        };

        ui::progress::finish_progress_with_summary(
            &spinner,
            &format!("Found {} files", result.len()),
            spinner.elapsed(),
        );
        self.output_formatter
            .debug(&ScanStatistics::from_entries(&result.entries).display_summary());

        Ok(self.session.install(result))
    }

    pub fn select(&self, request: &SelectionRequest) -> Result<Selection> {
        match request {
            SelectionRequest::Nothing => self.session.select_indices(&[]),
            SelectionRequest::All => self.session.select_all(),
            SelectionRequest::Chosen { ranges, patterns } => {
                let by_index = self.session.select_ranges(ranges)?;
                let by_pattern = self.session.select_matching(patterns)?;
                self.session.merge(&[by_index, by_pattern])
            }
        }
    }

    /// Write the report for `selection` on the blocking pool.
    pub async fn generate(&self, selection: &Selection) -> Result<GenerationReport> {
        let entries = self.session.checked_entries(selection)?.to_vec();
        let destination = self.config.report.destination.clone();

        self.output_formatter.start_operation(&format!(
            "Writing {} file(s) to {}",
            entries.len(),
            destination.display()
        ));

        let progress_bar = self.progress_manager.create_file_progress(entries.len() as u64);
        let worker_bar = progress_bar.clone();
        let generator = ReportGenerator::new(&self.config.report);
        let shutdown = self.shutdown.clone();

        let result = task::spawn_blocking(move || {
            let callback = |progress: &GenerationProgress| {
                ui::progress::update_file_progress(&worker_bar, progress);
            };
            generator.generate_with(&entries, &destination, Some(&callback), Some(&shutdown))
        })
        .await
        .map_err(|e| FileReportError::Io(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())));

        match result {
            Ok(Ok(report)) => {
                ui::progress::finish_progress_with_summary(
                    &progress_bar,
                    &format!("Wrote {} sections", report.sections_written),
                    report.duration,
                );
                Ok(report)
            }
            Ok(Err(e)) | Err(e) => {
                progress_bar.abandon();
                Err(e)
            }
        }
    }

    fn print_dry_run(&self, selection: &Selection) {
        let formatter = &self.output_formatter;

        formatter.print_header("Dry run - nothing will be written");
        self.progress_manager.suspend(|| {
            println!("  Destination:  {}", self.config.report.destination.display());
            println!("  On error:     {:?}", self.config.report.error_policy);
            println!("  Binary files: {:?}", self.config.report.binary_policy);
            println!("  Selected files:");
            for entry in selection.entries() {
                println!("    {}", entry.display_path());
            }
        });
        formatter.print_separator();
    }

    /// Generate sample configuration file
    pub fn generate_sample_config<P: AsRef<Path>>(output_path: P) -> Result<()> {
        let sample_config = Config::create_sample_config();
        std::fs::write(output_path.as_ref(), sample_config)?;
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output_formatter(&self) -> &OutputFormatter {
        &self.output_formatter
    }

    pub fn is_running(&self) -> bool {
        self.shutdown.is_running()
    }

    pub fn request_shutdown(&self) {
        self.shutdown.request_shutdown();
    }

    /// Handle error with user-friendly output
    pub fn handle_error(&self, error: &FileReportError) {
        self.output_formatter.print_user_friendly_error(error);
    }
}

/// Get version information
pub fn version_info() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
