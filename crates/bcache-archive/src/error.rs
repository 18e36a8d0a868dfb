//! Archive parse errors.

use thiserror::Error;

/// Errors from parsing an AR archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("missing archive signature")]
    MissingSignature,

    #[error("truncated member header at offset {offset}")]
    TruncatedHeader { offset: usize },

    #[error("invalid member size {field:?} at offset {offset}")]
    InvalidSize { offset: usize, field: String },

    #[error("member at offset {offset} declares {size} bytes past end of archive")]
    TruncatedMember { offset: usize, size: usize },
}
