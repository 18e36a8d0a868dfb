//! File access helpers.

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{WrapperError, WrapperResult};

/// Read a whole file.
pub fn read(path: impl AsRef<Path>) -> WrapperResult<Vec<u8>> {
    let path = path.as_ref();
    fs::read(path).map_err(|e| WrapperError::io(path, e))
}

/// True if `path` names an existing regular file.
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    path.as_ref().is_file()
}

/// Final path component. Both `/` and `\` count as separators, since
/// toolchain command files written on Windows end up on Unix hosts too.
///
/// With `strip_extension`, the trailing `.ext` is removed.
pub fn file_part(path: &str, strip_extension: bool) -> String {
    let name = path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path);
    if strip_extension {
        match extension_pos(name) {
            Some(pos) => name[..pos].to_string(),
            None => name.to_string(),
        }
    } else {
        name.to_string()
    }
}

/// Extension of the final path component including the leading dot, or an
/// empty string.
pub fn extension(path: &str) -> String {
    let name = file_part(path, false);
    match extension_pos(&name) {
        Some(pos) => name[pos..].to_string(),
        None => String::new(),
    }
}

fn extension_pos(name: &str) -> Option<usize> {
    name.rfind('.').filter(|&pos| pos > 0)
}

/// Interpret raw bytes read from a file as a path.
///
/// Unix paths are arbitrary bytes. Elsewhere the bytes must be UTF-8.
#[cfg(unix)]
pub fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    Some(PathBuf::from(OsStr::from_bytes(bytes)))
}

#[cfg(not(unix))]
pub fn path_from_bytes(bytes: &[u8]) -> Option<PathBuf> {
    std::str::from_utf8(bytes).ok().map(PathBuf::from)
}

/// Create a uniquely named temporary file in `dir`.
///
/// The file is removed when the returned handle is dropped, on every exit
/// path of the caller.
pub fn tmp_file(dir: &Path, suffix: &str) -> WrapperResult<NamedTempFile> {
    tempfile::Builder::new()
        .prefix("bcache-")
        .suffix(suffix)
        .tempfile_in(dir)
        .map_err(|e| WrapperError::io(dir, e))
}
