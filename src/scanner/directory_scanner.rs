use crate::config::ScanConfig;
use crate::error::{format_bytes, FileReportError, Result};
use crate::scanner::file_filter::FileFilter;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use walkdir::{DirEntry, WalkDir};

/// A regular file discovered during a scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry {
    /// Base file name. Not unique across the tree.
    pub name: String,
    /// Containing directory joined with `name`. Unique within one scan.
    pub path: PathBuf,
    pub relative_path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl FileEntry {
    pub fn new(path: PathBuf, relative_path: PathBuf, size: u64, modified: SystemTime) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            name,
            path,
            relative_path,
            size,
            modified,
        }
    }

    pub fn extension(&self) -> String {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }

    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }

    pub fn format_size(&self) -> String {
        format_bytes(self.size)
    }
}

/// The listing produced by one scan, in discovery order.
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub root: PathBuf,
    pub entries: Vec<FileEntry>,
    /// Subtrees that could not be listed. They do not fail the scan.
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FileEntry> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FileEntry> {
        self.entries.iter()
    }
}

pub struct DirectoryScanner {
    filter: FileFilter,
    max_depth: Option<usize>,
}

impl DirectoryScanner {
    pub fn new(config: &ScanConfig) -> Result<Self> {
        Ok(Self {
            filter: FileFilter::new(config)?,
            max_depth: config.max_depth,
        })
    }

    pub fn scan<P: AsRef<Path>>(&self, root: P) -> Result<ScanResult> {
        self.scan_with_progress(root, None)
    }

    /// Walks `root` recursively. Within each directory, files come first and
    /// subdirectories are descended afterwards, both in file name order.
    pub fn scan_with_progress<P: AsRef<Path>>(
        &self,
        root: P,
        progress_callback: Option<&dyn Fn(usize, &Path)>,
    ) -> Result<ScanResult> {
        let root_path = root.as_ref();
        validate_root(root_path)?;

        let mut entries = Vec::new();
        let mut warnings = Vec::new();

        let mut walker = WalkDir::new(root_path)
            .follow_links(false)
            .sort_by(files_then_directories);

        if let Some(depth) = self.max_depth {
            walker = walker.max_depth(depth);
        }

        let walker = walker
            .into_iter()
            .filter_entry(|e| self.should_traverse(e, root_path));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| root_path.display().to_string());
                    let warning = if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        format!("Permission denied: {}", path)
                    } else {
                        format!("Scan error at {}: {}", path, err)
                    };
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
            };

            if !self.filter.should_list_file(relative_to(entry.path(), root_path)) {
                continue;
            }

            match resolves_to_file(&entry) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(err) => {
                    let warning = format!("Broken symlink {}: {}", entry.path().display(), err);
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                    continue;
                }
            }

            match self.process_file(&entry, root_path) {
                Ok(file_entry) => {
                    entries.push(file_entry);
                    if let Some(callback) = progress_callback {
                        callback(entries.len(), entry.path());
                    }
                }
                Err(err) => {
                    let warning = format!("Error processing {}: {}", entry.path().display(), err);
                    tracing::warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        tracing::info!(
            root = %root_path.display(),
            files = entries.len(),
            warnings = warnings.len(),
            "scan finished"
        );

        Ok(ScanResult {
            root: root_path.to_path_buf(),
            entries,
            warnings,
        })
    }

    fn should_traverse(&self, entry: &DirEntry, root_path: &Path) -> bool {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }

        self.filter
            .should_traverse_directory(relative_to(entry.path(), root_path))
    }

    fn process_file(&self, entry: &DirEntry, root_path: &Path) -> Result<FileEntry> {
        let path = entry.path();
        // Follows symlinks, so a linked file reports its target's size.
        let metadata = fs::metadata(path)?;

        let relative_path = path
            .strip_prefix(root_path)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(entry.file_name()));

        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

        Ok(FileEntry::new(
            path.to_path_buf(),
            relative_path,
            metadata.len(),
            modified,
        ))
    }
}

fn validate_root(root: &Path) -> Result<()> {
    let invalid = |reason: String| FileReportError::InvalidRoot {
        path: root.display().to_string(),
        reason,
    };

    if root.as_os_str().is_empty() {
        return Err(invalid("no directory given".to_string()));
    }

    if !root.exists() {
        return Err(invalid("path does not exist".to_string()));
    }

    if !root.is_dir() {
        return Err(invalid("not a directory".to_string()));
    }

    fs::read_dir(root).map_err(|e| invalid(e.to_string()))?;

    Ok(())
}

/// Regular files, and symlinks whose target is a regular file.
fn resolves_to_file(entry: &DirEntry) -> std::io::Result<bool> {
    let file_type = entry.file_type();
    if file_type.is_symlink() {
        return Ok(fs::metadata(entry.path())?.is_file());
    }
    Ok(file_type.is_file())
}

fn relative_to<'a>(path: &'a Path, root: &Path) -> &'a Path {
    path.strip_prefix(root).unwrap_or(path)
}

fn files_then_directories(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

#[derive(Debug, Default)]
pub struct ScanStatistics {
    pub total_files: usize,
    pub total_size: u64,
    pub files_by_extension: HashMap<String, usize>,
    pub largest_file_size: u64,
    pub largest_file_path: PathBuf,
}

impl ScanStatistics {
    pub fn from_entries(entries: &[FileEntry]) -> Self {
        let mut files_by_extension = HashMap::new();
        for entry in entries {
            let ext = entry.extension();
            let ext = if ext.is_empty() {
                "no_extension".to_string()
            } else {
                ext
            };
            *files_by_extension.entry(ext).or_insert(0) += 1;
        }

        let (largest_file_size, largest_file_path) = entries
            .iter()
            .max_by_key(|e| e.size)
            .map(|e| (e.size, e.relative_path.clone()))
            .unwrap_or((0, PathBuf::new()));

        Self {
            total_files: entries.len(),
            total_size: entries.iter().map(|e| e.size).sum(),
            files_by_extension,
            largest_file_size,
            largest_file_path,
        }
    }

    pub fn display_summary(&self) -> String {
        let mut summary = format!(
            "Scan Results:\n  Total files: {}\n  Total size: {}\n",
            self.total_files,
            format_bytes(self.total_size)
        );

        if !self.files_by_extension.is_empty() {
            summary.push_str("  Files by type:\n");
            let mut extensions: Vec<_> = self.files_by_extension.iter().collect();
            extensions.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

            for (ext, count) in extensions {
                summary.push_str(&format!("    {}: {} files\n", ext, count));
            }
        }

        if self.largest_file_size > 0 {
            summary.push_str(&format!(
                "  Largest file: {} ({})\n",
                self.largest_file_path.display(),
                format_bytes(self.largest_file_size)
            ));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scanner() -> DirectoryScanner {
        DirectoryScanner::new(&ScanConfig::default()).unwrap()
    }

    #[test]
    fn test_file_entry_creation() {
        let entry = FileEntry::new(
            PathBuf::from("/root/docs/Test.MD"),
            PathBuf::from("docs/Test.MD"),
            100,
            SystemTime::UNIX_EPOCH,
        );

        assert_eq!(entry.name, "Test.MD");
        assert_eq!(entry.extension(), "md");
        assert_eq!(entry.format_size(), "100 B");
    }

    #[test]
    fn test_scan_finds_nested_files() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::create_dir_all(root.join("sub").join("deeper")).unwrap();
        fs::write(root.join("sub").join("b.txt"), "world").unwrap();
        fs::write(root.join("sub").join("deeper").join("c.bin"), [0u8, 159]).unwrap();
        fs::create_dir(root.join("empty")).unwrap();

        let result = scanner().scan(root).unwrap();

        assert_eq!(result.len(), 3);
        assert!(result.warnings.is_empty());
        for entry in result.iter() {
            assert!(entry.path.is_file());
            assert_eq!(
                entry.name,
                entry.path.file_name().unwrap().to_string_lossy()
            );
        }
    }

    #[test]
    fn test_scan_order_and_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("sub")).unwrap();
        fs::write(root.join("sub").join("b.txt"), "world").unwrap();
        fs::write(root.join("a.txt"), "hello").unwrap();
        fs::write(root.join("z.txt"), "last").unwrap();

        let result = scanner().scan(root).unwrap();
        let paths: Vec<PathBuf> = result.iter().map(|e| e.path.clone()).collect();

        assert_eq!(
            paths,
            vec![
                root.join("a.txt"),
                root.join("z.txt"),
                root.join("sub").join("b.txt"),
            ]
        );
        assert_eq!(result.entries[2].relative_path, Path::new("sub").join("b.txt"));

        let again = scanner().scan(root).unwrap();
        assert_eq!(result.entries, again.entries);
    }

    #[test]
    fn test_invalid_roots() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("file.txt");
        fs::write(&file, "x").unwrap();

        for root in [
            temp_dir.path().join("missing"),
            file,
            PathBuf::new(),
        ] {
            let result = scanner().scan(&root);
            assert!(
                matches!(result, Err(FileReportError::InvalidRoot { .. })),
                "expected InvalidRoot for {:?}",
                root
            );
        }
    }

    #[test]
    fn test_empty_directory_is_valid() {
        let temp_dir = TempDir::new().unwrap();
        let result = scanner().scan(temp_dir.path()).unwrap();
        assert!(result.is_empty());
        assert_eq!(result.root, temp_dir.path());
    }

    #[test]
    fn test_filters_and_depth() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src").join("nested")).unwrap();
        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("Cargo.toml"), "").unwrap();
        fs::write(root.join("src").join("main.rs"), "").unwrap();
        fs::write(root.join("src").join("notes.md"), "").unwrap();
        fs::write(root.join("src").join("nested").join("deep.rs"), "").unwrap();
        fs::write(root.join("target").join("built.rs"), "").unwrap();

        let config = ScanConfig {
            extensions: vec!["rs".to_string()],
            exclude_dirs: vec!["target".to_string()],
            ..ScanConfig::default()
        };
        let result = DirectoryScanner::new(&config).unwrap().scan(root).unwrap();
        let names: Vec<&str> = result.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["main.rs", "deep.rs"]);

        let config = ScanConfig {
            max_depth: Some(2),
            ..ScanConfig::default()
        };
        let result = DirectoryScanner::new(&config).unwrap().scan(root).unwrap();
        assert!(result.iter().all(|e| e.name != "deep.rs"));
        assert!(result.iter().any(|e| e.name == "main.rs"));
    }

    #[cfg(unix)]
    #[test]
    fn test_file_symlinks_are_listed() {
        let temp_dir = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(elsewhere.path().join("real.txt"), "target").unwrap();
        fs::create_dir(elsewhere.path().join("dir")).unwrap();
        fs::write(elsewhere.path().join("dir").join("inside.txt"), "x").unwrap();

        std::os::unix::fs::symlink(elsewhere.path().join("real.txt"), root.join("link.txt")).unwrap();
        std::os::unix::fs::symlink(elsewhere.path().join("dir"), root.join("linked_dir")).unwrap();
        std::os::unix::fs::symlink(root.join("gone.txt"), root.join("dangling.txt")).unwrap();

        let result = scanner().scan(root).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result.entries[0].name, "link.txt");
        assert_eq!(result.entries[0].path, root.join("link.txt"));
        assert_eq!(result.entries[0].size, 6);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("dangling.txt"));
    }

    #[test]
    fn test_exclude_patterns_ignore_root_path() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("tmp_project");
        fs::create_dir_all(root.join("cache")).unwrap();
        fs::write(root.join("keep.txt"), "k").unwrap();
        fs::write(root.join("cache").join("dropped.txt"), "d").unwrap();

        let config = ScanConfig {
            exclude_patterns: vec!["tmp".to_string(), "^cache".to_string()],
            ..ScanConfig::default()
        };
        let result = DirectoryScanner::new(&config).unwrap().scan(&root).unwrap();
        let names: Vec<&str> = result.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["keep.txt"]);
    }

    #[cfg(unix)]
    fn lock(path: &Path, mode: u32) {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(mode)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_subdirectory_becomes_warning() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.txt"), "a").unwrap();
        fs::create_dir(root.join("locked")).unwrap();
        fs::write(root.join("locked").join("hidden.txt"), "h").unwrap();

        lock(&root.join("locked"), 0o000);
        if fs::read_dir(root.join("locked")).is_ok() {
            // Running with privileges that ignore permission bits.
            lock(&root.join("locked"), 0o755);
            return;
        }

        let result = scanner().scan(root);
        lock(&root.join("locked"), 0o755);

        let result = result.unwrap();
        let names: Vec<&str> = result.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["a.txt"]);
        assert_eq!(result.warnings.len(), 1);
        assert!(result.warnings[0].contains("locked"));
    }

    #[cfg(unix)]
    #[test]
    fn test_unlistable_root_is_invalid() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("locked_root");
        fs::create_dir(&root).unwrap();
        fs::write(root.join("a.txt"), "a").unwrap();

        lock(&root, 0o000);
        if fs::read_dir(&root).is_ok() {
            lock(&root, 0o755);
            return;
        }

        let result = scanner().scan(&root);
        lock(&root, 0o755);

        assert!(matches!(result, Err(FileReportError::InvalidRoot { .. })));
    }

    #[test]
    fn test_progress_callback() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("one"), "1").unwrap();
        fs::write(temp_dir.path().join("two"), "2").unwrap();

        let seen = std::cell::Cell::new(0);
        let callback = |count: usize, _: &Path| seen.set(count);
        scanner()
            .scan_with_progress(temp_dir.path(), Some(&callback))
            .unwrap();
        assert_eq!(seen.get(), 2);
    }

    #[test]
    fn test_scan_statistics() {
        let entries = vec![
            FileEntry::new(
                PathBuf::from("test.md"),
                PathBuf::from("test.md"),
                100,
                SystemTime::UNIX_EPOCH,
            ),
            FileEntry::new(
                PathBuf::from("README"),
                PathBuf::from("README"),
                200,
                SystemTime::UNIX_EPOCH,
            ),
        ];

        let stats = ScanStatistics::from_entries(&entries);
        assert_eq!(stats.total_files, 2);
        assert_eq!(stats.total_size, 300);
        assert_eq!(stats.largest_file_size, 200);
        assert_eq!(stats.files_by_extension.get("no_extension"), Some(&1));
        assert!(stats.display_summary().contains("Largest file: README"));
    }
}
