use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use super::platform;
use super::progress::ProgressReporter;

#[derive(Debug, Error)]
pub enum CleanupError {
    #[error("scratch directory {0} does not exist")]
    ScratchMissing(PathBuf),
    #[error("scratch directory {path} cannot be read")]
    ScratchUnreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CleanupOutcome {
    Deleted,
    SkippedAccessDenied,
    SkippedInUse,
}

impl CleanupOutcome {
    /// Permission problems are access-denied; anything else (locked, busy,
    /// vanished mid-run) counts as in use.
    pub fn from_error(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::PermissionDenied => CleanupOutcome::SkippedAccessDenied,
            _ => CleanupOutcome::SkippedInUse,
        }
    }

    pub fn is_deleted(self) -> bool {
        self == CleanupOutcome::Deleted
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CleanupEntry {
    pub path: PathBuf,
    pub kind: EntryKind,
    pub outcome: CleanupOutcome,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub entries: Vec<CleanupEntry>,
}

impl CleanupReport {
    pub fn skipped(&self) -> usize {
        self.attempted - self.succeeded
    }

    pub fn count(&self, outcome: CleanupOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    fn push(&mut self, entry: CleanupEntry) {
        self.attempted += 1;
        if entry.outcome.is_deleted() {
            self.succeeded += 1;
        }
        self.entries.push(entry);
    }
}

/// Delete everything directly under `dir`: files first, then directories
/// (recursively). Per-item failures are recorded and the run continues;
/// only a missing or unreadable `dir` is an error, and then no progress is
/// reported at all.
pub fn clean_directory(
    dir: &Path,
    progress: impl FnMut(u8),
) -> Result<CleanupReport, CleanupError> {
    let (files, directories) = list_entries(dir)?;
    let total = files.len() + directories.len();
    tracing::info!(dir = %dir.display(), total, "cleaning scratch directory");

    let mut progress = ProgressReporter::new(progress);
    let mut report = CleanupReport::default();

    let items = files
        .into_iter()
        .map(|path| (path, EntryKind::File))
        .chain(directories.into_iter().map(|path| (path, EntryKind::Directory)));

    for (processed, (path, kind)) in items.enumerate() {
        let result = match kind {
            EntryKind::File => delete_file(&path),
            EntryKind::Directory => fs::remove_dir_all(&path),
        };
        let entry = match result {
            Ok(()) => CleanupEntry {
                path,
                kind,
                outcome: CleanupOutcome::Deleted,
                detail: None,
            },
            Err(err) => CleanupEntry {
                path,
                kind,
                outcome: CleanupOutcome::from_error(&err),
                detail: Some(err.to_string()),
            },
        };
        tracing::debug!(
            path = %entry.path.display(),
            outcome = ?entry.outcome,
            "cleanup item"
        );
        report.push(entry);
        progress.step(processed + 1, total);
    }

    progress.finish();
    tracing::info!(
        attempted = report.attempted,
        succeeded = report.succeeded,
        "cleanup finished"
    );
    Ok(report)
}

fn list_entries(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>), CleanupError> {
    if !dir.is_dir() {
        return Err(CleanupError::ScratchMissing(dir.to_path_buf()));
    }
    let read_dir = fs::read_dir(dir).map_err(|source| CleanupError::ScratchUnreadable {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    let mut directories = Vec::new();
    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(dir = %dir.display(), error = %err, "unreadable scratch entry");
                continue;
            }
        };
        // DirEntry::file_type does not follow symlinks, so a link to a
        // directory is removed as a link rather than walked.
        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_dir {
            directories.push(entry.path());
        } else {
            files.push(entry.path());
        }
    }
    files.sort();
    directories.sort();
    Ok((files, directories))
}

fn delete_file(path: &Path) -> io::Result<()> {
    if fs::symlink_metadata(path).is_ok_and(|m| m.file_type().is_symlink()) {
        return platform::remove_link(path);
    }
    if let Err(err) = platform::clear_file_attributes(path) {
        tracing::debug!(path = %path.display(), error = %err, "could not clear attributes");
    }
    fs::remove_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dir: &Path) -> (Result<CleanupReport, CleanupError>, Vec<u8>) {
        let mut seen = Vec::new();
        let result = clean_directory(dir, |p| seen.push(p));
        (result, seen)
    }

    #[test]
    fn deletes_files_and_nested_directories() {
        let scratch = tempfile::tempdir().unwrap();
        fs::write(scratch.path().join("a.tmp"), b"a").unwrap();
        fs::write(scratch.path().join("b.log"), b"b").unwrap();
        let nested = scratch.path().join("cache").join("deep");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("c.bin"), b"c").unwrap();

        let (result, seen) = run(scratch.path());
        let report = result.unwrap();

        assert_eq!(report.attempted, 3);
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.skipped(), 0);
        assert_eq!(seen, vec![33, 66, 100, 100]);
        assert_eq!(report.entries[0].kind, EntryKind::File);
        assert_eq!(report.entries[2].kind, EntryKind::Directory);
        assert!(fs::read_dir(scratch.path()).unwrap().next().is_none());
    }

    #[test]
    fn read_only_file_is_deleted() {
        let scratch = tempfile::tempdir().unwrap();
        let path = scratch.path().join("ro.tmp");
        fs::write(&path, b"x").unwrap();
        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();

        let (result, _) = run(scratch.path());
        let report = result.unwrap();
        assert_eq!(report.succeeded, 1);
        assert!(!path.exists());
    }

    #[test]
    fn empty_directory_reports_only_completion() {
        let scratch = tempfile::tempdir().unwrap();
        let (result, seen) = run(scratch.path());
        let report = result.unwrap();
        assert_eq!(report.attempted, 0);
        assert!(report.entries.is_empty());
        assert_eq!(seen, vec![100]);
    }

    #[test]
    fn missing_directory_is_fatal_and_silent() {
        let scratch = tempfile::tempdir().unwrap();
        let missing = scratch.path().join("gone");
        let (result, seen) = run(&missing);
        assert!(matches!(result, Err(CleanupError::ScratchMissing(p)) if p == missing));
        assert!(seen.is_empty());
    }

    #[test]
    fn file_path_is_not_a_scratch_directory() {
        let scratch = tempfile::tempdir().unwrap();
        let file = scratch.path().join("plain.txt");
        fs::write(&file, b"x").unwrap();
        let (result, seen) = run(&file);
        assert!(matches!(result, Err(CleanupError::ScratchMissing(_))));
        assert!(seen.is_empty());
    }

    #[test]
    fn outcome_classification() {
        let denied = io::Error::from(io::ErrorKind::PermissionDenied);
        let busy = io::Error::other("sharing violation");
        let gone = io::Error::from(io::ErrorKind::NotFound);
        assert_eq!(
            CleanupOutcome::from_error(&denied),
            CleanupOutcome::SkippedAccessDenied
        );
        assert_eq!(
            CleanupOutcome::from_error(&busy),
            CleanupOutcome::SkippedInUse
        );
        assert_eq!(
            CleanupOutcome::from_error(&gone),
            CleanupOutcome::SkippedInUse
        );
    }

    #[test]
    fn report_counts_by_outcome() {
        let mut report = CleanupReport::default();
        for outcome in [
            CleanupOutcome::Deleted,
            CleanupOutcome::SkippedAccessDenied,
            CleanupOutcome::SkippedInUse,
            CleanupOutcome::Deleted,
        ] {
            report.push(CleanupEntry {
                path: PathBuf::from("x"),
                kind: EntryKind::File,
                outcome,
                detail: None,
            });
        }
        assert_eq!(report.attempted, 4);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.skipped(), 2);
        assert_eq!(report.count(CleanupOutcome::SkippedAccessDenied), 1);
    }

    #[cfg(unix)]
    #[test]
    fn protected_directory_is_skipped_not_fatal() {
        use std::os::unix::fs::PermissionsExt;

        // Root ignores directory permissions, so there is nothing to observe.
        if crate::system::platform::is_elevated() {
            return;
        }
        let scratch = tempfile::tempdir().unwrap();
        let locked = scratch.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("inner.tmp"), b"x").unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o500)).unwrap();
        fs::write(scratch.path().join("free.tmp"), b"x").unwrap();

        let (result, seen) = run(scratch.path());
        let report = result.unwrap();
        assert_eq!(report.attempted, 2);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.count(CleanupOutcome::SkippedAccessDenied), 1);
        assert_eq!(seen.last(), Some(&100));

        fs::set_permissions(&locked, fs::Permissions::from_mode(0o700)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn link_to_directory_is_removed_without_touching_target() {
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("keep.txt"), b"x").unwrap();
        let scratch = tempfile::tempdir().unwrap();
        let link = scratch.path().join("linked");
        std::os::unix::fs::symlink(outside.path(), &link).unwrap();

        let (result, _) = run(scratch.path());
        let report = result.unwrap();
        assert_eq!(report.attempted, 1);
        assert_eq!(report.succeeded, 1);
        assert_eq!(report.entries[0].kind, EntryKind::File);
        assert_eq!(report.entries[0].outcome, CleanupOutcome::Deleted);
        assert!(fs::symlink_metadata(&link).is_err());
        assert!(outside.path().join("keep.txt").exists());
    }
}
