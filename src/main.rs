use clap::Parser;
use filereport::{
    logging, Cli, FileReport, FileReportError, OutputFormatter, OutputMode, UserFriendlyError,
};
use std::process;

const DEFAULT_CONFIG_FILE: &str = "filereport.toml";

#[tokio::main]
async fn main() {
    let exit_code = run().await;
    process::exit(exit_code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logging(cli.verbosity_level(), cli.quiet) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    if cli.generate_config {
        return handle_generate_config(&cli);
    }

    let mut app = match FileReport::from_cli(&cli) {
        Ok(app) => app,
        Err(e) => {
            print_startup_error(&e);
            return exit_code_for(&e);
        }
    };

    let request = match cli.selection_request() {
        Ok(request) => request,
        Err(e) => {
            app.handle_error(&e);
            return exit_code_for(&e);
        }
    };

    // clap guarantees a root unless --generate-config was given
    let Some(root) = cli.root.as_deref() else {
        return 1;
    };

    match app.run(root, &request, cli.list, cli.dry_run).await {
        Ok(Some(report)) => {
            app.output_formatter().print_generation_report(&report);
            if report.has_warnings() {
                2
            } else {
                0
            }
        }
        Ok(None) => 0,
        Err(e) => {
            tracing::debug!(error = %e, "run failed");
            app.handle_error(&e);
            exit_code_for(&e)
        }
    }
}

fn exit_code_for(error: &FileReportError) -> i32 {
    match error {
        FileReportError::Cancelled => 130, // Interrupted (SIGINT)
        FileReportError::InvalidSelection { .. } => 2,
        FileReportError::InvalidRoot { .. } => 3,
        FileReportError::EmptySelection => 4,
        FileReportError::NoRootSelected | FileReportError::StaleSelection { .. } => 5,
        FileReportError::FileReadFailure { .. } => 6,
        FileReportError::InvalidDestination { .. } => 7,
        _ => 1,
    }
}

fn handle_generate_config(cli: &Cli) -> i32 {
    let config_path = cli
        .config
        .as_ref()
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

    match FileReport::generate_sample_config(&config_path) {
        Ok(()) => {
            println!("Generated sample configuration file: {}", config_path);
            println!("\nTo use this configuration:");
            println!("  filereport <directory> --config {}", config_path);
            0
        }
        Err(e) => {
            eprintln!("Failed to generate configuration file: {}", e.user_message());
            if let Some(suggestion) = e.suggestion() {
                eprintln!("Suggestion: {}", suggestion);
            }
            1
        }
    }
}

fn print_startup_error(error: &FileReportError) {
    let formatter = OutputFormatter::new(OutputMode::Human, 0, false);
    formatter.print_user_friendly_error(error);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_generate_config_command() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("test.toml");

        let cli = Cli::parse_from([
            "filereport",
            "--generate-config",
            "--config",
            config_path.to_str().unwrap(),
        ]);

        assert_eq!(handle_generate_config(&cli), 0);
        let content = fs::read_to_string(&config_path).unwrap();
        assert!(content.contains("[report]"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(exit_code_for(&FileReportError::Cancelled), 130);
        assert_eq!(exit_code_for(&FileReportError::EmptySelection), 4);
        assert_eq!(exit_code_for(&FileReportError::NoRootSelected), 5);
        assert_eq!(
            exit_code_for(&FileReportError::InvalidRoot {
                path: "x".to_string(),
                reason: "missing".to_string(),
            }),
            3
        );
        assert_eq!(
            exit_code_for(&FileReportError::Config {
                message: "bad".to_string(),
            }),
            1
        );
    }
}
