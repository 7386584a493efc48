//! Depth-first walk of the sweep root.
//!
//! # Design
//! - Entries are visited in file-name order so cycles are reproducible.
//! - Each non-directory entry is re-stat'ed (following symlinks) at visit time; the
//!   walk never caches metadata across entries.
//! - Anything that is not a regular file is reported as `Visit::Irregular` and
//!   left to the caller to skip.
//! - The first walk or stat error is yielded as an `Err`; the caller decides to stop.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use walkdir::{DirEntry, WalkDir};

use crate::error::{FsOpsError, FsOpsResult};
use crate::model::FileCandidate;

/// Entry reported by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Visit {
    /// Regular file with its stat snapshot.
    File(FileCandidate),
    /// Socket, FIFO, device node, or other non-regular entry.
    Irregular(PathBuf),
}

/// Iterator over the entries below a sweep root.
pub struct Scanner {
    root: PathBuf,
    walker: walkdir::IntoIter,
}

impl Scanner {
    /// Start a walk rooted at `root`.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let walker = WalkDir::new(&root).sort_by_file_name().into_iter();
        Self { root, walker }
    }

    /// Root directory of this walk.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn visit(&self, entry: &DirEntry) -> FsOpsResult<Visit> {
        let path = entry.path();
        let metadata =
            fs::metadata(path).map_err(|source| FsOpsError::io("scan.stat", path, source))?;

        if !metadata.is_file() {
            return Ok(Visit::Irregular(path.to_path_buf()));
        }

        let modified = metadata
            .modified()
            .map_err(|source| FsOpsError::io("scan.mtime", path, source))?;

        Ok(Visit::File(FileCandidate {
            path: path.to_path_buf(),
            relative: relative_to(&self.root, path),
            modified: DateTime::<Utc>::from(modified),
            size: metadata.len(),
        }))
    }
}

impl Iterator for Scanner {
    type Item = FsOpsResult<Visit>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walker.next()? {
                Ok(entry) => entry,
                Err(source) => {
                    let path = source
                        .path()
                        .map_or_else(|| self.root.clone(), Path::to_path_buf);
                    return Some(Err(FsOpsError::walkdir("scan.walk", path, source)));
                }
            };
            if entry.file_type().is_dir() {
                continue;
            }
            return Some(self.visit(&entry));
        }
    }
}

fn relative_to(root: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(relative) if !relative.as_os_str().is_empty() => relative.to_path_buf(),
        _ => path
            .file_name()
            .map_or_else(|| path.to_path_buf(), PathBuf::from),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    fn files(scanner: Scanner) -> Result<Vec<FileCandidate>, FsOpsError> {
        let mut out = Vec::new();
        for visit in scanner {
            if let Visit::File(candidate) = visit? {
                out.push(candidate);
            }
        }
        Ok(out)
    }

    #[test]
    fn walks_nested_files_in_name_order() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        fs::create_dir_all(temp.path().join("crash/app"))?;
        fs::create_dir_all(temp.path().join("crash/empty"))?;
        fs::write(temp.path().join("crash/app/dump2"), b"22")?;
        fs::write(temp.path().join("crash/app/dump1"), b"1")?;
        fs::write(temp.path().join("top"), b"333")?;

        let found = files(Scanner::new(temp.path()))?;
        let relative: Vec<_> = found.iter().map(|c| c.relative.clone()).collect();
        assert_eq!(
            relative,
            vec![
                PathBuf::from("crash/app/dump1"),
                PathBuf::from("crash/app/dump2"),
                PathBuf::from("top"),
            ]
        );
        assert_eq!(found[0].size, 1);
        assert_eq!(found[2].size, 3);
        assert_eq!(found[0].path, temp.path().join("crash/app/dump1"));
        Ok(())
    }

    #[test]
    fn empty_root_yields_nothing() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        assert!(files(Scanner::new(temp.path()))?.is_empty());
        Ok(())
    }

    #[test]
    fn missing_root_is_a_walk_error() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let mut scanner = Scanner::new(temp.path().join("absent"));
        match scanner.next() {
            Some(Err(FsOpsError::Walkdir { operation, .. })) => assert_eq!(operation, "scan.walk"),
            other => panic!("unexpected scan result {other:?}"),
        }
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn non_regular_entries_are_reported_as_irregular() -> Result<(), Box<dyn Error>> {
        use std::os::unix::net::UnixListener;

        let temp = tempfile::tempdir()?;
        let socket = temp.path().join("agent.sock");
        let _listener = UnixListener::bind(&socket)?;
        fs::write(temp.path().join("core"), b"x")?;

        let visits: Vec<Visit> = Scanner::new(temp.path()).collect::<Result<_, _>>()?;
        assert_eq!(visits.len(), 2);
        assert!(matches!(&visits[0], Visit::Irregular(path) if path == &socket));
        assert!(matches!(&visits[1], Visit::File(c) if c.relative == Path::new("core")));
        Ok(())
    }

    #[cfg(unix)]
    #[test]
    fn dangling_symlink_is_a_stat_error() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        std::os::unix::fs::symlink(temp.path().join("gone"), temp.path().join("link"))?;

        let mut scanner = Scanner::new(temp.path());
        match scanner.next() {
            Some(Err(FsOpsError::Io { operation, .. })) => assert_eq!(operation, "scan.stat"),
            other => panic!("unexpected scan result {other:?}"),
        }
        Ok(())
    }

    #[test]
    fn root_that_is_a_file_uses_its_name() -> Result<(), Box<dyn Error>> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("single");
        fs::write(&path, b"x")?;
        let found = files(Scanner::new(&path))?;
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].relative, PathBuf::from("single"));
        Ok(())
    }
}
