use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};
use tracing::{debug, warn};

/// The single file holding the database snapshot.
///
/// `SnapshotFile` knows nothing about the snapshot's contents; it moves whole
/// byte buffers between memory and disk. Locking is the caller's job.
///
/// ## Crash Safety
/// Writes never touch the live file in place:
///
/// ```text
/// bytes → .<name>.tmp → fsync → rename over <name> → fsync parent dir
/// ```
///
/// A crash at any step leaves either the previous contents or the new
/// contents at `path`, never a truncated mix. A leftover temp file is removed
/// the next time the store is opened.
#[derive(Debug, Clone)]
pub struct SnapshotFile {
    /// Live database file
    path: PathBuf,
    /// Sibling used while a write is in flight
    temp_path: PathBuf,
}

impl SnapshotFile {
    /// Opens the database file, creating an empty one if it does not exist.
    ///
    /// Existing content is preserved. Parent directories are created as
    /// needed.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;

        let file = Self {
            temp_path: temp_path_for(&path),
            path,
        };
        file.cleanup_temp_file()?;
        Ok(file)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole file. A missing file reads as empty.
    pub fn read(&self) -> io::Result<Vec<u8>> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Replaces the file contents with `bytes` all-or-nothing.
    pub fn write_atomic(&self, bytes: &[u8]) -> io::Result<()> {
        let result = self.write_temp_and_rename(bytes);
        if result.is_err() {
            // Best effort; the live file is untouched either way
            let _ = fs::remove_file(&self.temp_path);
        }
        result
    }

    fn write_temp_and_rename(&self, bytes: &[u8]) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        drop(file);

        fs::rename(&self.temp_path, &self.path)?;
        sync_parent_dir(&self.path)?;
        debug!(path = %self.path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    fn cleanup_temp_file(&self) -> io::Result<()> {
        match fs::remove_file(&self.temp_path) {
            Ok(()) => {
                warn!(path = %self.temp_path.display(), "removed temp file from interrupted write");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e),
        }
    }
}

fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> io::Result<()> {
    Ok(())
}
