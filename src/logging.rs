use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "filereport=warn";

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: u8, quiet: bool) -> String {
    if quiet {
        return "filereport=error".to_string();
    }

    match verbose {
        0 => DEFAULT_LOG_FILTER.to_string(),
        1 => "filereport=info".to_string(),
        _ => "filereport=debug".to_string(),
    }
}

/// Installs the `tracing` subscriber for diagnostics on stderr.
///
/// `RUST_LOG` takes precedence over the verbosity flags. User-facing messages
/// go through [`crate::ui::OutputFormatter`] instead.
pub fn init_logging(verbose: u8, quiet: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter(verbose, quiet)))
        .context("Failed to build log filter")?;

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e.to_string()))
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
