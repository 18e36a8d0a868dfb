//! Error types for cache-key derivation.
//!
//! Every failure aborts key derivation for the invocation. [`ErrorKind`]
//! tells the driver which class of failure occurred so it can choose between
//! running the toolchain uncached and reporting the error.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use bcache_archive::ArchiveError;

/// Stable classification of a [`WrapperError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    /// The command line has a shape this wrapper cannot key.
    UnsupportedInvocation,
    /// A link input claims to be an archive but violates the AR layout.
    MalformedArchive,
    /// The toolchain rejected the preprocessing command.
    PreprocessFailed,
    /// The toolchain rejected the identification command.
    ToolchainProbeFailed,
    /// No primary output file was declared.
    MissingOutputFile,
    /// An output role was declared more than once.
    ConflictingOutputDeclaration,
    /// A file or process could not be accessed.
    Io,
}

impl ErrorKind {
    /// True when the invocation itself is fine but cannot be keyed, so the
    /// driver may simply run the real toolchain without the cache.
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::UnsupportedInvocation | Self::Io)
    }

    /// True when the toolchain's own exit code and output should be shown to
    /// the user instead of a cache-internal message.
    pub fn is_toolchain_failure(&self) -> bool {
        matches!(self, Self::PreprocessFailed | Self::ToolchainProbeFailed)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedInvocation => write!(f, "UNSUPPORTED_INVOCATION"),
            Self::MalformedArchive => write!(f, "MALFORMED_ARCHIVE"),
            Self::PreprocessFailed => write!(f, "PREPROCESS_FAILED"),
            Self::ToolchainProbeFailed => write!(f, "TOOLCHAIN_PROBE_FAILED"),
            Self::MissingOutputFile => write!(f, "MISSING_OUTPUT_FILE"),
            Self::ConflictingOutputDeclaration => write!(f, "CONFLICTING_OUTPUT_DECLARATION"),
            Self::Io => write!(f, "IO"),
        }
    }
}

/// Errors from a wrapper operation.
#[derive(Debug, thiserror::Error)]
pub enum WrapperError {
    #[error("unsupported invocation: {0}")]
    UnsupportedInvocation(String),

    #[error("unable to parse archive {}: {source}", path.display())]
    MalformedArchive {
        path: PathBuf,
        #[source]
        source: ArchiveError,
    },

    #[error("preprocessing command failed with exit code {exit_code}")]
    PreprocessFailed { exit_code: i32, output: String },

    #[error("toolchain identification failed with exit code {exit_code}")]
    ToolchainProbeFailed { exit_code: i32, output: String },

    #[error("no output file declared")]
    MissingOutputFile,

    #[error("only a single {role} file can be specified")]
    ConflictingOutputDeclaration { role: String },

    #[error("I/O error at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WrapperError {
    /// Wrap an I/O error with the path it concerns.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnsupportedInvocation(_) => ErrorKind::UnsupportedInvocation,
            Self::MalformedArchive { .. } => ErrorKind::MalformedArchive,
            Self::PreprocessFailed { .. } => ErrorKind::PreprocessFailed,
            Self::ToolchainProbeFailed { .. } => ErrorKind::ToolchainProbeFailed,
            Self::MissingOutputFile => ErrorKind::MissingOutputFile,
            Self::ConflictingOutputDeclaration { .. } => ErrorKind::ConflictingOutputDeclaration,
            Self::Io { .. } => ErrorKind::Io,
        }
    }
}

/// Result alias for wrapper operations.
pub type WrapperResult<T> = Result<T, WrapperError>;
