//! Content hashing for AR (`!<arch>`) archives.
//!
//! Static libraries embed a modification time in every member header, so two
//! archives built from identical objects a minute apart differ byte-wise.
//! [`hash_ar_data`] feeds everything except those timestamps into a digest.
//!
//! ## Member header layout
//!
//! | Offset | Length | Field                          | Hashed |
//! |--------|--------|--------------------------------|--------|
//! | 0      | 16     | member name                    | yes    |
//! | 16     | 12     | modification timestamp         | no     |
//! | 28     | 6      | owner id                       | yes    |
//! | 34     | 6      | group id                       | yes    |
//! | 40     | 8      | file mode                      | yes    |
//! | 48     | 10     | payload size (ASCII decimal)   | yes    |
//! | 58     | 2      | terminator (`` `\n ``)         | yes    |
//!
//! Payloads are padded to an even length; the pad byte is not hashed.

mod error;

pub use error::ArchiveError;

use sha2::Digest;

/// Global archive signature.
pub const AR_SIGNATURE: &[u8; 8] = b"!<arch>\n";

/// Size of a member header in bytes.
pub const HEADER_LEN: usize = 60;

const NAME: std::ops::Range<usize> = 0..16;
const HASHED_TAIL: std::ops::Range<usize> = 28..60;
const SIZE_FIELD: std::ops::Range<usize> = 48..58;

/// Check whether `data` starts with the archive signature.
pub fn is_ar_data(data: &[u8]) -> bool {
    data.starts_with(AR_SIGNATURE)
}

/// Feed the timestamp-independent content of an archive into `hasher`.
///
/// On error the hasher may already have absorbed a prefix of the archive;
/// callers should discard it.
pub fn hash_ar_data<H: Digest>(data: &[u8], hasher: &mut H) -> Result<(), ArchiveError> {
    if !is_ar_data(data) {
        return Err(ArchiveError::MissingSignature);
    }

    let mut pos = AR_SIGNATURE.len();
    while pos < data.len() {
        let header = data
            .get(pos..pos + HEADER_LEN)
            .ok_or(ArchiveError::TruncatedHeader { offset: pos })?;

        hasher.update(&header[NAME]);
        hasher.update(&header[HASHED_TAIL]);

        let size = parse_size(&header[SIZE_FIELD], pos)?;
        let start = pos + HEADER_LEN;
        let payload = start
            .checked_add(size)
            .and_then(|end| data.get(start..end))
            .ok_or(ArchiveError::TruncatedMember { offset: pos, size })?;
        hasher.update(payload);

        pos = start + size + (size & 1);
    }

    Ok(())
}

fn parse_size(field: &[u8], offset: usize) -> Result<usize, ArchiveError> {
    let invalid = || ArchiveError::InvalidSize {
        offset,
        field: String::from_utf8_lossy(field).into_owned(),
    };

    let text = std::str::from_utf8(field).map_err(|_| invalid())?.trim();
    let size: i64 = text.parse().map_err(|_| invalid())?;
    usize::try_from(size).map_err(|_| invalid())
}
