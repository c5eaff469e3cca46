//! File helpers shared by the file-level passes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{DedupError, Result};

pub(crate) fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| DedupError::io(path, e))
}

pub(crate) fn create_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| DedupError::io(dir, e))
}

/// Output location of `input` inside `out_dir`: same file name, new directory.
pub(crate) fn output_path(out_dir: &Path, input: &Path) -> Option<PathBuf> {
    input.file_name().map(|name| out_dir.join(name))
}

/// Writes `contents` to `path` all-or-nothing.
///
/// Data goes to a temporary file in the destination directory, is synced,
/// and is then renamed over `path`. Readers see either the old file or the
/// complete new one.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(dir).map_err(|e| DedupError::io(dir, e))?;
    file.write_all(contents)
        .map_err(|e| DedupError::io(file.path(), e))?;
    file.as_file()
        .sync_all()
        .map_err(|e| DedupError::io(file.path(), e))?;
    file.persist(path)
        .map_err(|e| DedupError::io(path, e.error))?;
    Ok(())
}
