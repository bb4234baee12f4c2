use crate::error::{format_bytes, FileReportError, UserFriendlyError};
use crate::report::GenerationReport;
use crate::scanner::ScanResult;
use crate::ui::progress::format_duration;
use console::{style, Emoji, Term};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputMode {
    Human,
    Json,
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Warning,
    Error,
    Info,
}

/// Receives user-facing outcomes of scans and report generation.
pub trait Notifier {
    fn notify(&self, kind: NotificationKind, message: &str);
}

// Emojis with text fallbacks
static CHECKMARK: Emoji = Emoji("✅ ", "✓ ");
static CROSS: Emoji = Emoji("❌ ", "✗ ");
static INFO: Emoji = Emoji("ℹ️  ", "i ");
static WARNING: Emoji = Emoji("⚠️  ", "! ");
static ROCKET: Emoji = Emoji("🚀 ", "> ");
static SPARKLES: Emoji = Emoji("✨ ", "* ");

pub struct OutputFormatter {
    mode: OutputMode,
    use_colors: bool,
    verbose_level: u8,
    quiet: bool,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode, verbose: u8, quiet: bool) -> Self {
        let use_colors = match mode {
            OutputMode::Human => Term::stdout().features().colors_supported() && !quiet,
            _ => false,
        };

        Self {
            mode,
            use_colors,
            verbose_level: if quiet { 0 } else { verbose },
            quiet,
        }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    // Core messaging methods
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(NotificationKind::Success, message),
            OutputMode::Json => self.print_json_message("success", message),
            OutputMode::Plain => println!("SUCCESS: {}", message),
        }
    }

    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(NotificationKind::Error, message),
            OutputMode::Json => self.print_json_message("error", message),
            OutputMode::Plain => eprintln!("ERROR: {}", message),
        }
    }

    /// Shown even in quiet mode, like errors.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => self.print_human_message(NotificationKind::Warning, message),
            OutputMode::Json => self.print_json_message("warning", message),
            OutputMode::Plain => eprintln!("WARNING: {}", message),
        }
    }

    pub fn info(&self, message: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => self.print_human_message(NotificationKind::Info, message),
                OutputMode::Json => self.print_json_message("info", message),
                OutputMode::Plain => println!("INFO: {}", message),
            }
        }
    }

    pub fn debug(&self, message: &str) {
        if self.should_show_message(2) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("  {}", style(message).dim());
                    } else {
                        println!("  DEBUG: {}", message);
                    }
                }
                OutputMode::Json => self.print_json_message("debug", message),
                OutputMode::Plain => println!("DEBUG: {}", message),
            }
        }
    }

    pub fn start_operation(&self, operation: &str) {
        if self.should_show_message(1) {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        println!("{}{}", ROCKET, style(operation).bold());
                    } else {
                        println!("> {}", operation);
                    }
                }
                OutputMode::Json => self.print_json_message("operation_start", operation),
                OutputMode::Plain => println!("STARTING: {}", operation),
            }
        }
    }

    pub fn print_user_friendly_error(&self, error: &FileReportError) {
        let kind = match error {
            FileReportError::EmptySelection | FileReportError::NoRootSelected => {
                NotificationKind::Warning
            }
            _ => NotificationKind::Error,
        };
        self.notify(kind, &error.user_message());

        if let Some(suggestion) = error.suggestion() {
            match self.mode {
                OutputMode::Human => {
                    if self.use_colors {
                        eprintln!(
                            "{}{}",
                            INFO,
                            style(&format!("Suggestion: {}", suggestion)).cyan()
                        );
                    } else {
                        eprintln!("Suggestion: {}", suggestion);
                    }
                }
                OutputMode::Json => {
                    self.print_json_object(&serde_json::json!({
                        "type": "suggestion",
                        "message": suggestion
                    }));
                }
                OutputMode::Plain => {
                    eprintln!("SUGGESTION: {}", suggestion);
                }
            }
        }
    }

    /// Prints the numbered listing. Numbers are 1-based, matching `--pick`.
    pub fn print_listing(&self, scan: &ScanResult) {
        match self.mode {
            OutputMode::Json => {
                let entries: Vec<serde_json::Value> = scan
                    .iter()
                    .enumerate()
                    .map(|(i, e)| {
                        serde_json::json!({
                            "index": i + 1,
                            "name": e.name,
                            "path": e.path,
                            "size": e.size,
                        })
                    })
                    .collect();

                self.print_json_object(&serde_json::json!({
                    "type": "listing",
                    "root": scan.root,
                    "entries": entries,
                    "warnings": scan.warnings,
                }));
            }
            OutputMode::Plain => {
                for (i, entry) in scan.iter().enumerate() {
                    println!("{}\t{}\t{}", i + 1, entry.name, entry.path.display());
                }
            }
            OutputMode::Human => {
                self.print_header(&format!("Files in {}", scan.root.display()));
                let width = scan.len().to_string().len();
                for (i, entry) in scan.iter().enumerate() {
                    let index = format!("{:>width$}", i + 1, width = width);
                    if self.use_colors {
                        println!(
                            "  {}  {:<30} {}",
                            style(index).cyan(),
                            style(&entry.name).bold(),
                            style(entry.path.display()).dim()
                        );
                    } else {
                        println!("  {}  {:<30} {}", index, entry.name, entry.path.display());
                    }
                }
                if scan.is_empty() {
                    println!("  (no files)");
                }
                println!();
            }
        }

        if self.mode != OutputMode::Json {
            for warning in &scan.warnings {
                self.warning(warning);
            }
        }
    }

    pub fn print_generation_report(&self, report: &GenerationReport) {
        match self.mode {
            OutputMode::Json => {
                let mut value = serde_json::to_value(report).unwrap_or_default();
                if let Some(object) = value.as_object_mut() {
                    object.insert("type".to_string(), serde_json::json!("report"));
                    object.insert(
                        "generated_at".to_string(),
                        serde_json::json!(report.generated_at.to_rfc3339()),
                    );
                }
                self.print_json_object(&value);
            }
            OutputMode::Plain => {
                println!("REPORT: {}", report.destination.display());
                println!("Sections: {}", report.sections_written);
                println!("Bytes: {}", report.bytes_written);
                for failure in &report.failures {
                    println!("FAILED: {}: {}", failure.path.display(), failure.reason);
                }
            }
            OutputMode::Human => {
                for failure in &report.failures {
                    self.warning(&format!(
                        "Left out {}: {}",
                        failure.path.display(),
                        failure.reason
                    ));
                }
                if self.quiet {
                    return;
                }
                println!(
                    "  Sections written: {}",
                    self.highlight(report.sections_written.to_string())
                );
                println!(
                    "  Content size:     {}",
                    self.highlight(format_bytes(report.bytes_written))
                );
                println!(
                    "  Time taken:       {}",
                    self.highlight(format_duration(report.duration))
                );
                for path in &report.binary_skipped {
                    println!("  Binary, omitted:  {}", path.display());
                }
                for path in &report.lossy {
                    println!("  Lossy decoded:    {}", path.display());
                }
            }
        }
    }

    pub fn print_header(&self, title: &str) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                println!();
                if self.use_colors {
                    println!("{} {}", SPARKLES, style(title).bold().cyan());
                } else {
                    println!("=== {} ===", title);
                }
                println!();
            }
            OutputMode::Json => {
                self.print_json_object(&serde_json::json!({
                    "type": "header",
                    "title": title
                }));
            }
            OutputMode::Plain => {
                println!("=== {} ===", title);
            }
        }
    }

    pub fn print_separator(&self) {
        if self.quiet {
            return;
        }

        match self.mode {
            OutputMode::Human => {
                if self.use_colors {
                    println!("{}", style("─".repeat(60)).dim());
                } else {
                    println!("{}", "-".repeat(60));
                }
            }
            OutputMode::Plain => {
                println!("{}", "-".repeat(60));
            }
            OutputMode::Json => {}
        }
    }

    fn highlight(&self, text: String) -> String {
        if self.use_colors {
            style(text).cyan().bold().to_string()
        } else {
            text
        }
    }

    fn should_show_message(&self, min_verbose_level: u8) -> bool {
        !self.quiet && self.verbose_level >= min_verbose_level
    }

    fn print_human_message(&self, kind: NotificationKind, message: &str) {
        let (emoji, prefix) = match kind {
            NotificationKind::Success => (&CHECKMARK, "✓"),
            NotificationKind::Error => (&CROSS, "✗"),
            NotificationKind::Warning => (&WARNING, "!"),
            NotificationKind::Info => (&INFO, "i"),
        };

        let line = if self.use_colors {
            let styled = match kind {
                NotificationKind::Success => style(message).green().bold(),
                NotificationKind::Error => style(message).red().bold(),
                NotificationKind::Warning => style(message).yellow().bold(),
                NotificationKind::Info => style(message).cyan(),
            };
            format!("{}{}", emoji, styled)
        } else {
            format!("{} {}", prefix, message)
        };

        match kind {
            NotificationKind::Error | NotificationKind::Warning => eprintln!("{}", line),
            _ => println!("{}", line),
        }
    }

    fn print_json_message(&self, level: &str, message: &str) {
        self.print_json_object(&serde_json::json!({
            "type": "message",
            "level": level,
            "message": message,
            "timestamp": chrono::Utc::now().to_rfc3339()
        }));
    }

    fn print_json_object(&self, obj: &serde_json::Value) {
        println!(
            "{}",
            serde_json::to_string(obj).unwrap_or_else(|_| "{}".to_string())
        );
    }
}

impl Notifier for OutputFormatter {
    fn notify(&self, kind: NotificationKind, message: &str) {
        match kind {
            NotificationKind::Success => self.success(message),
            NotificationKind::Warning => self.warning(message),
            NotificationKind::Error => self.error(message),
            NotificationKind::Info => self.info(message),
        }
    }
}
