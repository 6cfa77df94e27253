//! Size-based rotating log file
//!
//! When a write would push the active file past `max_bytes`, the file is
//! renamed to `<name>.1`, older backups shift up by one (`.1` -> `.2`, ...),
//! the oldest beyond `max_backups` is dropped and a fresh file is started.
//! Rotation happens between writes, so a formatted log line is never split
//! across two files.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing_subscriber::fmt::MakeWriter;

struct RotatingFile {
    path: PathBuf,
    max_bytes: u64,
    max_backups: usize,
    file: File,
    written: u64,
}

impl RotatingFile {
    fn open(path: PathBuf, max_bytes: u64, max_backups: usize) -> io::Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let written = file.metadata()?.len();

        Ok(Self {
            path,
            max_bytes,
            max_backups,
            file,
            written,
        })
    }

    fn backup_path(&self, index: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{index}"));
        PathBuf::from(name)
    }

    fn rotate(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.max_backups > 0 {
            let oldest = self.backup_path(self.max_backups);
            if oldest.exists() {
                std::fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_backups).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    std::fs::rename(&from, self.backup_path(index + 1))?;
                }
            }
            std::fs::rename(&self.path, self.backup_path(1))?;
        }

        self.file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        self.written = 0;
        Ok(())
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.written > 0 && self.written + buf.len() as u64 > self.max_bytes {
            self.rotate()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// A [`MakeWriter`] appending to a size-rotated file
///
/// Cloning shares the same underlying file.
#[derive(Clone)]
pub struct RotatingFileWriter {
    inner: Arc<Mutex<RotatingFile>>,
}

impl RotatingFileWriter {
    /// Open (or create) `path`, rotating once it reaches `max_bytes`
    ///
    /// Parent directories are created. `max_backups` rotated files are kept;
    /// with zero backups the file is simply truncated on rotation.
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, max_backups: usize) -> io::Result<Self> {
        let file = RotatingFile::open(path.into(), max_bytes, max_backups)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(file)),
        })
    }

    /// Path of the active log file
    pub fn path(&self) -> PathBuf {
        self.lock().path.clone()
    }

    /// Flush the active file
    pub fn flush(&self) -> io::Result<()> {
        self.lock().flush()
    }

    fn lock(&self) -> MutexGuard<'_, RotatingFile> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RotatingFileWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileWriter")
            .field("path", &self.path())
            .finish()
    }
}

/// Locked handle returned by [`RotatingFileWriter::make_writer`]
pub struct RotatingFileHandle<'a>(MutexGuard<'a, RotatingFile>);

impl Write for RotatingFileHandle<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<'a> MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileHandle<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        RotatingFileHandle(self.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::Path;

    fn has_backup(path: &Path, index: usize) -> bool {
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{index}"));
        Path::new(&name).exists()
    }

    fn write_line(writer: &RotatingFileWriter, line: &str) {
        writer.make_writer().write_all(line.as_bytes()).unwrap();
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("app.log");

        let writer = RotatingFileWriter::new(&path, 1024, 3).unwrap();
        write_line(&writer, "hello\n");

        assert_eq!(fs::read_to_string(&path).unwrap(), "hello\n");
        assert_eq!(writer.path(), path);
    }

    #[test]
    fn test_rotates_at_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&path, 10, 3).unwrap();

        write_line(&writer, "aaaaaaaa\n");
        write_line(&writer, "bbbbbbbb\n");

        assert!(has_backup(&path, 1));
        assert_eq!(fs::read_to_string(&path).unwrap(), "bbbbbbbb\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.1")).unwrap(),
            "aaaaaaaa\n"
        );
    }

    #[test]
    fn test_keeps_at_most_max_backups() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&path, 4, 2).unwrap();

        for line in ["one\n", "two\n", "thr\n", "fou\n"] {
            write_line(&writer, line);
        }

        assert_eq!(fs::read_to_string(&path).unwrap(), "fou\n");
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.1")).unwrap(),
            "thr\n"
        );
        assert_eq!(
            fs::read_to_string(dir.path().join("app.log.2")).unwrap(),
            "two\n"
        );
        assert!(!has_backup(&path, 3));
    }

    #[test]
    fn test_oversized_line_goes_to_fresh_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        let writer = RotatingFileWriter::new(&path, 4, 0).unwrap();

        write_line(&writer, "first line\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "first line\n");

        // Zero backups: the old content is discarded
        write_line(&writer, "second\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert!(!has_backup(&path, 1));
    }

    #[test]
    fn test_appends_to_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("app.log");
        fs::write(&path, "old\n").unwrap();

        let writer = RotatingFileWriter::new(&path, 1024, 1).unwrap();
        write_line(&writer, "new\n");
        writer.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "old\nnew\n");
    }
}
