//! A `.part` file being filled, then renamed into place or removed.

use anyhow::{Context, Result};
use std::fs::File;
use std::os::unix::fs::FileExt;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};

use super::temp_path;

pub struct PartFile {
    file: File,
    path: PathBuf,
}

impl PartFile {
    /// Creates (or truncates) the `.part` file belonging to `final_path`.
    pub fn create(final_path: &Path) -> Result<Self> {
        let path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        Ok(Self { file, path })
    }

    /// Reserves `size` bytes up front; `set_len` where `posix_fallocate` is refused.
    pub fn reserve(&self, size: u64) -> Result<()> {
        if size == 0 {
            return Ok(());
        }
        let r = unsafe { libc::posix_fallocate(self.file.as_raw_fd(), 0, size as libc::off_t) };
        if r != 0 {
            tracing::debug!(errno = r, path = %self.path.display(), "posix_fallocate refused");
            self.file.set_len(size).context("failed to reserve space")?;
        }
        Ok(())
    }

    pub fn write_at(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.file
            .write_all_at(data, offset)
            .with_context(|| format!("write to {} at {}", self.path.display(), offset))
    }

    /// Cuts the file to `len` and flushes it to disk.
    pub fn seal(&self, len: u64) -> Result<()> {
        self.file.set_len(len).context("truncate part file")?;
        self.file.sync_all().context("sync part file")
    }

    /// Renames the file to `final_path`.
    pub fn finalize(self, final_path: &Path) -> Result<()> {
        let Self { file, path } = self;
        drop(file);
        std::fs::rename(&path, final_path).with_context(|| {
            format!("failed to rename {} to {}", path.display(), final_path.display())
        })
    }

    /// Closes and deletes the file.
    pub fn discard(self) {
        let Self { file, path } = self;
        drop(file);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::debug!(path = %path.display(), error = %e, "could not remove part file");
        }
    }
}
