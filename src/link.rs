//! Link input hashing.
//!
//! Link steps are keyed on the content of everything they consume. Archives
//! go through [`bcache_archive`] so member timestamps do not leak into the
//! key, and linker command scripts have their library references replaced by
//! the content of the referenced libraries.

use std::io;
use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{WrapperError, WrapperResult};
use crate::sys;

/// Extension of linker command scripts, compared case-insensitively.
pub const LINK_SCRIPT_EXTENSION: &str = ".cmd";

/// Line prefix that references a library in a link script.
const LIBRARY_PREFIX: &[u8] = b"-l";

/// True if `path` looks like a linker command script.
pub fn is_link_script(path: &str) -> bool {
    sys::extension(path).eq_ignore_ascii_case(LINK_SCRIPT_EXTENSION)
}

/// Hash a single link input file.
///
/// Archives are hashed without member timestamps; everything else is hashed
/// byte for byte.
pub fn hash_link_file(path: impl AsRef<Path>, hasher: &mut Sha256) -> WrapperResult<()> {
    let path = path.as_ref();
    let data = sys::read(path)?;

    if bcache_archive::is_ar_data(&data) {
        debug!(path = %path.display(), "hashing archive");
        bcache_archive::hash_ar_data(&data, hasher).map_err(|source| {
            WrapperError::MalformedArchive {
                path: path.to_path_buf(),
                source,
            }
        })
    } else {
        debug!(path = %path.display(), "hashing file");
        hasher.update(&data);
        Ok(())
    }
}

/// Hash a linker command script.
///
/// Lines of the form `-l<path>` or `-l"<path>"` contribute the content of the
/// referenced library instead of their text, so the hash does not depend on
/// where the library lives. All other lines are hashed byte for byte.
pub fn hash_link_cmd_file(path: impl AsRef<Path>, hasher: &mut Sha256) -> WrapperResult<()> {
    let path = path.as_ref();
    debug!(path = %path.display(), "hashing link script");
    let data = sys::read(path)?;

    for line in data.split(|&b| b == b'\n') {
        match library_reference(line) {
            Some(name) => {
                let library = sys::path_from_bytes(name).ok_or_else(|| {
                    WrapperError::io(
                        path,
                        io::Error::new(
                            io::ErrorKind::InvalidData,
                            "library reference is not valid UTF-8",
                        ),
                    )
                })?;
                hash_link_file(library, hasher)?;
            }
            None => {
                hasher.update(line);
                hasher.update(b"\n");
            }
        }
    }

    Ok(())
}

/// Extract the library path from a `-l` line.
///
/// A leading quote is removed together with the last byte of the line, which
/// is the closing quote in any well-formed script.
fn library_reference(line: &[u8]) -> Option<&[u8]> {
    let name = line.strip_prefix(LIBRARY_PREFIX)?;
    let name = name.strip_suffix(b"\r").unwrap_or(name);
    if name.len() > 2 && name.starts_with(b"\"") {
        Some(&name[1..name.len() - 1])
    } else {
        Some(name)
    }
}
