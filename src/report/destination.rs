use crate::error::{FileReportError, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// The output file of a generation.
///
/// Content is written to a temporary file next to the destination and only
/// renamed over it by [`ReportDestination::commit`]. Dropping an uncommitted
/// destination removes the temporary file and leaves any existing report as
/// it was.
pub struct ReportDestination {
    path: PathBuf,
    temp: NamedTempFile,
}

impl ReportDestination {
    pub fn prepare(path: &Path) -> Result<Self> {
        validate_destination_path(path)?;

        let parent = parent_dir(path);
        let temp = tempfile::Builder::new()
            .prefix(".filereport-")
            .suffix(".tmp")
            .tempfile_in(&parent)
            .map_err(|e| FileReportError::InvalidDestination {
                path: path.display().to_string(),
                reason: format!("cannot create a file in {}: {}", parent.display(), e),
            })?;

        match_permissions(path, temp.as_file());

        Ok(Self {
            path: path.to_path_buf(),
            temp,
        })
    }

    pub fn file(&self) -> &File {
        self.temp.as_file()
    }

    pub fn commit(self) -> Result<PathBuf> {
        self.temp.as_file().sync_all()?;
        self.temp
            .persist(&self.path)
            .map_err(|e| FileReportError::Io(e.error))?;

        tracing::debug!(destination = %self.path.display(), "report committed");
        Ok(self.path)
    }
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn validate_destination_path(path: &Path) -> Result<()> {
    let invalid = |reason: &str| FileReportError::InvalidDestination {
        path: path.display().to_string(),
        reason: reason.to_string(),
    };

    if path.as_os_str().is_empty() {
        return Err(invalid("no destination given"));
    }

    if path.is_dir() {
        return Err(invalid("destination is a directory"));
    }

    if path.file_name().is_none() {
        return Err(invalid("destination has no file name"));
    }

    if !parent_dir(path).is_dir() {
        return Err(invalid("parent directory does not exist"));
    }

    Ok(())
}

// Temporary files are created owner-only; the committed report should look
// like any other file the user creates.
#[cfg(unix)]
fn match_permissions(destination: &Path, file: &File) {
    use std::os::unix::fs::PermissionsExt;

    let permissions = std::fs::metadata(destination)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| std::fs::Permissions::from_mode(0o644));

    if let Err(e) = file.set_permissions(permissions) {
        tracing::debug!("could not adjust report permissions: {}", e);
    }
}

#[cfg(not(unix))]
fn match_permissions(_destination: &Path, _file: &File) {}
