//! File system operations
//!
//! The filesystem capability consumed by command handlers. Paths are
//! virtual (see [`crate::storage::validation`]) and always passed as data,
//! never interpolated into a shell command.

use chrono::{DateTime, Local};
use log::debug;
use std::fs::{self, File, Metadata, OpenOptions};
use std::io::{self, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::SystemTime;

use crate::storage::validation::virtual_to_real_path;

/// Filesystem operations a session may perform.
pub trait Filesystem: Send + Sync {
    /// True if `path` is a regular file that can be opened for reading.
    fn is_readable(&self, path: &str) -> bool;
    fn exists(&self, path: &str) -> bool;
    fn is_dir(&self, path: &str) -> bool;
    fn open_read(&self, path: &str) -> io::Result<File>;
    /// Opens (creating if needed) for writing. A zero offset truncates;
    /// a non-zero offset keeps the content and positions the cursor there.
    fn open_write(&self, path: &str, offset: u64) -> io::Result<File>;
    /// One line per entry: bare names, or `ls -l` style when `long`.
    fn list(&self, path: &str, long: bool) -> io::Result<Vec<String>>;
    fn make_dir(&self, path: &str) -> io::Result<()>;
    fn remove_dir_all(&self, path: &str) -> io::Result<()>;
}

/// [`Filesystem`] backed by a directory on the local disk.
#[derive(Debug, Clone)]
pub struct LocalFilesystem {
    root: PathBuf,
}

impl LocalFilesystem {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn real(&self, path: &str) -> PathBuf {
        virtual_to_real_path(&self.root, path)
    }
}

impl Filesystem for LocalFilesystem {
    fn is_readable(&self, path: &str) -> bool {
        let real = self.real(path);
        real.is_file() && File::open(&real).is_ok()
    }

    fn exists(&self, path: &str) -> bool {
        self.real(path).exists()
    }

    fn is_dir(&self, path: &str) -> bool {
        self.real(path).is_dir()
    }

    fn open_read(&self, path: &str) -> io::Result<File> {
        File::open(self.real(path))
    }

    fn open_write(&self, path: &str, offset: u64) -> io::Result<File> {
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(offset == 0)
            .open(self.real(path))?;
        if offset > 0 {
            file.seek(SeekFrom::Start(offset))?;
        }
        Ok(file)
    }

    fn list(&self, path: &str, long: bool) -> io::Result<Vec<String>> {
        let real = self.real(path);
        let meta = fs::metadata(&real)?;

        let mut entries = Vec::new();
        if meta.is_dir() {
            for entry in fs::read_dir(&real)? {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                entries.push((name, entry.metadata()?));
            }
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        } else {
            let name = real
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            entries.push((name, meta));
        }

        debug!("Listed {} ({} entries)", real.display(), entries.len());
        Ok(entries
            .into_iter()
            .map(|(name, meta)| {
                if long {
                    long_entry(&name, &meta)
                } else {
                    name
                }
            })
            .collect())
    }

    fn make_dir(&self, path: &str) -> io::Result<()> {
        fs::create_dir(self.real(path))
    }

    fn remove_dir_all(&self, path: &str) -> io::Result<()> {
        if path.trim_matches('/').is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "refusing to remove the server root",
            ));
        }
        let real = self.real(path);
        if real.is_dir() {
            fs::remove_dir_all(real)
        } else {
            fs::remove_file(real)
        }
    }
}

#[cfg(unix)]
fn mode_fields(meta: &Metadata) -> (String, u64, u32, u32) {
    use std::os::unix::fs::MetadataExt;

    let mode = meta.mode();
    let mut perms = String::with_capacity(9);
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        perms.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        perms.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        perms.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    (perms, meta.nlink(), meta.uid(), meta.gid())
}

#[cfg(not(unix))]
fn mode_fields(meta: &Metadata) -> (String, u64, u32, u32) {
    let perms = if meta.permissions().readonly() {
        "r--r--r--"
    } else {
        "rw-rw-rw-"
    };
    (perms.to_string(), 1, 0, 0)
}

/// Formats one `ls -l` style line.
fn long_entry(name: &str, meta: &Metadata) -> String {
    let kind = if meta.is_dir() { 'd' } else { '-' };
    let (perms, links, uid, gid) = mode_fields(meta);
    let modified: DateTime<Local> = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH).into();
    format!(
        "{kind}{perms} {links:>3} {uid:<8} {gid:<8} {size:>12} {date} {name}",
        size = meta.len(),
        date = modified.format("%b %e %H:%M"),
    )
}
