//! Scoped file I/O for settings files.
//!
//! Writes go to a uniquely named sibling file which is flushed and then
//! renamed over the target, so a reader never observes a half-written
//! settings file.  Every handle is dropped before the function returns,
//! including on error paths.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Writes `bytes` to `path` atomically.
///
/// Creates missing parent directories.  On failure the temporary file is
/// removed and `path` is left as it was.
///
/// # Errors
///
/// Returns the underlying [`io::Error`] together with the path it concerned.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), (PathBuf, io::Error)> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| (dir.to_path_buf(), e))?;
    }

    let temp_path = temp_sibling(path);
    let written = (|| {
        let mut file = fs::File::create(&temp_path)?;
        file.write_all(bytes)?;
        file.sync_all()
    })();

    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err((temp_path, e));
    }

    if let Err(e) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err((path.to_path_buf(), e));
    }
    Ok(())
}

/// Reads the whole file at `path`.
///
/// # Errors
///
/// Returns the underlying [`io::Error`].
pub fn read_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path)
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.{}.tmp", Uuid::new_v4().simple()))
}
