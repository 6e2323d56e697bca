//! Segment discovery.

use crate::config::ScanOptions;
use crate::error::{CoreError, CoreResult};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Lists the segment files of one directory.
///
/// Every call reads the directory again; nothing is cached, because
/// segments come and go between planning and execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCatalog {
    directory: PathBuf,
    suffix: String,
    max_files: usize,
}

impl FileCatalog {
    /// Creates a catalog from scan options.
    #[must_use]
    pub fn new(options: &ScanOptions) -> Self {
        Self {
            directory: options.directory.clone(),
            suffix: options.suffix.clone(),
            max_files: options.max_files,
        }
    }

    /// The directory being listed.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Returns at most `max_files` segment paths, sorted by file name.
    ///
    /// Only regular files whose name ends with the suffix (and is longer
    /// than it) count. A directory that does not exist holds no segments.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FileRead`] if the directory cannot be read.
    pub fn list(&self) -> CoreResult<Vec<PathBuf>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(dir = %self.directory.display(), "segment directory does not exist");
                return Ok(Vec::new());
            }
            Err(e) => return Err(CoreError::file_read(&self.directory, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| CoreError::file_read(&self.directory, e))?;
            let is_file = entry
                .file_type()
                .map_err(|e| CoreError::file_read(entry.path(), e))?
                .is_file();
            if !is_file {
                continue;
            }

            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if name.len() > self.suffix.len() && name.ends_with(&self.suffix) {
                names.push(name);
            }
        }

        names.sort_unstable();
        if names.len() > self.max_files {
            debug!(
                found = names.len(),
                limit = self.max_files,
                "ignoring segments beyond the limit"
            );
            names.truncate(self.max_files);
        }

        debug!(dir = %self.directory.display(), count = names.len(), "listed segments");
        Ok(names
            .into_iter()
            .map(|name| self.directory.join(name))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").unwrap();
    }

    #[test]
    fn lists_only_segments() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "pglog-2021-01-02_000000.dat");
        touch(dir.path(), "pglog-2021-01-01_000000.dat");
        touch(dir.path(), "notes.txt");
        touch(dir.path(), ".dat");
        fs::create_dir(dir.path().join("nested.dat")).unwrap();

        let catalog = FileCatalog::new(&ScanOptions::new(dir.path()));
        let files = catalog.list().unwrap();

        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_owned())
            .collect();
        assert_eq!(
            names,
            vec!["pglog-2021-01-01_000000.dat", "pglog-2021-01-02_000000.dat"]
        );
    }

    #[test]
    fn bounded_by_max_files() {
        let dir = tempdir().unwrap();
        for i in 0..20 {
            touch(dir.path(), &format!("seg-{i:02}.dat"));
        }

        let catalog = FileCatalog::new(&ScanOptions::new(dir.path()));
        assert_eq!(catalog.list().unwrap().len(), 16);

        let catalog = FileCatalog::new(&ScanOptions::new(dir.path()).max_files(3));
        let files = catalog.list().unwrap();
        assert_eq!(files.len(), 3);
        assert!(files[0].ends_with("seg-00.dat"));
    }

    #[test]
    fn custom_suffix() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "a.csv");
        touch(dir.path(), "b.dat");

        let catalog = FileCatalog::new(&ScanOptions::new(dir.path()).suffix(".csv"));
        let files = catalog.list().unwrap();
        assert_eq!(files, vec![dir.path().join("a.csv")]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let catalog = FileCatalog::new(&ScanOptions::new(dir.path().join("absent")));
        assert!(catalog.list().unwrap().is_empty());
    }

    #[test]
    fn not_cached_between_calls() {
        let dir = tempdir().unwrap();
        let catalog = FileCatalog::new(&ScanOptions::new(dir.path()));
        assert!(catalog.list().unwrap().is_empty());

        touch(dir.path(), "late.dat");
        assert_eq!(catalog.list().unwrap().len(), 1);
    }

    #[test]
    fn file_as_directory_is_an_error() {
        let dir = tempdir().unwrap();
        touch(dir.path(), "plain");
        let catalog = FileCatalog::new(&ScanOptions::new(dir.path().join("plain")));
        assert!(matches!(catalog.list(), Err(CoreError::FileRead { .. })));
    }
}
