//! Append-only line file with size-based rotation.
//!
//! When the live file would grow past its limit it is renamed to `<name>.1`,
//! older backups shift up by one (`.1` → `.2`, …) and the oldest beyond the
//! retention count is dropped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Default size limit of the live file (5 MB).
pub const DEFAULT_MAX_BYTES: u64 = 5 * 1024 * 1024;

/// Default number of numbered backups kept.
pub const DEFAULT_BACKUPS: usize = 3;

/// Thread-safe rotating line writer.
pub struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    backups: usize,
    state: Mutex<Option<Open>>,
}

struct Open {
    file: File,
    written: u64,
}

impl RotatingFile {
    /// Creates a writer for `path`; nothing is opened until the first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backups: usize) -> Self {
        Self {
            path: path.into(),
            max_bytes: max_bytes.max(1),
            backups,
            state: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `line` plus a newline, rotating first if it would not fit.
    ///
    /// A line longer than the limit is still written, alone, to a fresh file.
    ///
    /// # Errors
    ///
    /// Any I/O failure while rotating, opening or writing, or a poisoned lock.
    pub fn write_line(&self, line: &str) -> io::Result<()> {
        let mut state = self
            .state
            .lock()
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("lock poisoned: {e}")))?;

        let incoming = line.len() as u64 + 1;

        if state.is_none() {
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            let written = file.metadata()?.len();
            *state = Some(Open { file, written });
        }

        let needs_rotation = state
            .as_ref()
            .is_some_and(|open| open.written > 0 && open.written + incoming > self.max_bytes);
        if needs_rotation {
            *state = None;
            self.rotate()?;
            let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
            *state = Some(Open { file, written: 0 });
        }

        let open = state
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "trace file not open"))?;
        writeln!(open.file, "{line}")?;
        open.file.flush()?;
        open.written += incoming;

        Ok(())
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&self) -> io::Result<()> {
        if self.backups == 0 {
            return fs::remove_file(&self.path).or_else(ignore_missing);
        }

        fs::remove_file(self.backup_path(self.backups)).or_else(ignore_missing)?;
        for index in (1..self.backups).rev() {
            let from = self.backup_path(index);
            if from.exists() {
                fs::rename(&from, self.backup_path(index + 1))?;
            }
        }
        fs::rename(&self.path, self.backup_path(1)).or_else(ignore_missing)
    }
}

fn ignore_missing(e: io::Error) -> io::Result<()> {
    if e.kind() == io::ErrorKind::NotFound {
        Ok(())
    } else {
        Err(e)
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("max_bytes", &self.max_bytes)
            .field("backups", &self.backups)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(path: &Path) -> String {
        fs::read_to_string(path).unwrap_or_default()
    }

    #[test]
    fn rotates_into_numbered_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces.jsonl");
        let writer = RotatingFile::new(&path, 10, 2);

        writer.write_line("aaaa").unwrap();
        writer.write_line("bbbb").unwrap();
        writer.write_line("cccc").unwrap();
        writer.write_line("dddd").unwrap();
        writer.write_line("eeee").unwrap();

        assert_eq!(read(&path), "eeee\n");
        assert_eq!(read(&writer.backup_path(1)), "cccc\ndddd\n");
        assert_eq!(read(&writer.backup_path(2)), "aaaa\nbbbb\n");
    }

    #[test]
    fn oldest_backup_is_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces.jsonl");
        let writer = RotatingFile::new(&path, 5, 1);

        for line in ["one", "two", "three"] {
            writer.write_line(line).unwrap();
        }

        assert_eq!(read(&path), "three\n");
        assert_eq!(read(&writer.backup_path(1)), "two\n");
        assert!(!writer.backup_path(2).exists());
    }

    #[test]
    fn existing_file_size_counts_toward_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("traces.jsonl");
        fs::write(&path, "previous-run\n").unwrap();

        let writer = RotatingFile::new(&path, 16, 3);
        writer.write_line("new").unwrap();

        assert_eq!(read(&path), "new\n");
        assert_eq!(read(&writer.backup_path(1)), "previous-run\n");
    }
}
