//! Cache key derivation.
//!
//! The cache key is computed using RFC 8785 JSON Canonicalization Scheme
//! (JCS) over [`CacheKeyInputs`]:
//!
//! `key = SHA-256 hex digest of JCS(cache_key_inputs)`
//!
//! The inputs hold only output-affecting material: the wrapper family, a
//! digest of the toolchain identity, the filtered arguments and a digest of
//! the content identity. Nothing host-specific (absolute paths, timestamps)
//! reaches them.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::{debug, info};

use bcache_args::ArgList;

use crate::error::{ErrorKind, WrapperError};
use crate::wrapper::{BuildFiles, ContentIdentity, InvocationMode, ProgramWrapper};

/// Schema identifier for cache key inputs.
pub const KEY_SCHEMA_ID: &str = "bcache/key_inputs@1";

/// Errors from key derivation.
#[derive(Debug, Error)]
pub enum KeyError {
    #[error(transparent)]
    Wrapper(#[from] WrapperError),

    #[error("JCS canonicalization error: {0}")]
    JcsError(String),
}

impl KeyError {
    /// Classification of the underlying wrapper failure, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Wrapper(e) => Some(e.kind()),
            Self::JcsError(_) => None,
        }
    }
}

/// The canonical, output-affecting inputs of a cache key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheKeyInputs {
    pub schema_id: String,

    /// Toolchain family that produced the inputs.
    pub wrapper: String,

    /// SHA-256 of the toolchain identification output.
    pub program_id_sha256: String,

    /// Filtered arguments, in invocation order.
    pub relevant_args: ArgList,

    /// SHA-256 of the preprocessed source or link-input digest.
    pub content_sha256: String,
}

impl CacheKeyInputs {
    pub fn new(
        wrapper: &str,
        program_id: &str,
        relevant_args: ArgList,
        content: &ContentIdentity,
    ) -> Self {
        Self {
            schema_id: KEY_SCHEMA_ID.to_string(),
            wrapper: wrapper.to_string(),
            program_id_sha256: sha256_hex(program_id.as_bytes()),
            relevant_args,
            content_sha256: sha256_hex(content.as_bytes()),
        }
    }

    /// Compute the cache key.
    pub fn cache_key(&self) -> Result<String, KeyError> {
        let jcs_bytes = serde_json_canonicalizer::to_vec(self)
            .map_err(|e| KeyError::JcsError(e.to_string()))?;
        Ok(sha256_hex(&jcs_bytes))
    }

    /// Serialize to JSON (pretty printed)
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Everything the driver needs after a successful derivation.
#[derive(Debug, Clone, Serialize)]
pub struct KeyDerivation {
    pub key: String,
    pub mode: InvocationMode,
    pub inputs: CacheKeyInputs,
    pub build_files: BuildFiles,
}

/// Run the full key derivation for one invocation.
///
/// Any failing step aborts the derivation; the caller decides from the
/// error kind whether to run the toolchain uncached or report the failure.
pub fn derive_key<W: ProgramWrapper + ?Sized>(wrapper: &W) -> Result<KeyDerivation, KeyError> {
    let resolved = wrapper.resolve_args()?;
    debug!(args = %resolved.args().join(" ", true), "resolved arguments");

    // Output declarations are checked before any process runs.
    let build_files = wrapper.build_files(&resolved)?;
    let relevant_args = wrapper.relevant_arguments(&resolved);
    let content = wrapper.content_identity(&resolved)?;
    let program_id = wrapper.program_identity()?;

    let inputs = CacheKeyInputs::new(wrapper.name(), &program_id, relevant_args, &content);
    let key = inputs.cache_key()?;
    info!(key = %key, wrapper = wrapper.name(), mode = %content.mode(), "derived cache key");

    Ok(KeyDerivation {
        key,
        mode: content.mode(),
        inputs,
        build_files,
    })
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}
