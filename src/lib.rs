//! bcache-key - cache keys for compiler and linker invocations
//!
//! Derives a deterministic identity for a toolchain invocation: identical on
//! every machine and checkout whenever the invocation would produce the same
//! output bytes, and different whenever it would not. The key is the lookup
//! handle for an external artifact cache.

pub mod config;
pub mod error;
pub mod key;
pub mod link;
pub mod logging;
pub mod sys;
pub mod wrapper;

pub use bcache_args::ArgList;
pub use config::{ConfigError, KeyConfig, LogFormat};
pub use error::{ErrorKind, WrapperError, WrapperResult};
pub use key::{derive_key, CacheKeyInputs, KeyDerivation, KeyError};
pub use wrapper::{
    find_wrapper, BuildFiles, ContentIdentity, ExpectedFile, FileRole, InvocationMode,
    ProgramWrapper, ResolvedArgs, Wrapper, WrapperContext, WrapperKind,
};
