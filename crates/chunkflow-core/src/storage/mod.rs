//! Output files of the local host.
//!
//! Every file is written to `<name>.part` first (preallocated when the size is
//! known) and renamed into place only when complete, so a half-written file
//! never carries the final name.

mod part_file;

pub use part_file::PartFile;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `file.iso` → `file.iso.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Writes `data` to `final_path` through its `.part` file.
pub fn write_file_atomically(final_path: &Path, data: &[u8]) -> Result<()> {
    let part = PartFile::create(final_path)?;
    let len = data.len() as u64;
    if let Err(e) = part
        .reserve(len)
        .and_then(|()| part.write_at(0, data))
        .and_then(|()| part.seal(len))
    {
        part.discard();
        return Err(e);
    }
    part.finalize(final_path)
}
