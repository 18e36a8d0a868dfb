//! Toolchain wrappers.
//!
//! A wrapper knows one toolchain's argument grammar well enough to turn an
//! invocation into cache-key material. Each supported toolchain is a variant
//! of the closed [`Wrapper`] enum; [`find_wrapper`] picks the first variant
//! (in [`WrapperKind::ALL`] order) whose `can_handle` accepts the command.
//!
//! The lifecycle of a key computation is:
//!
//! 1. [`ProgramWrapper::resolve_args`] expands response files once.
//! 2. [`ProgramWrapper::build_files`] declares what the cache must capture.
//! 3. [`ProgramWrapper::relevant_arguments`], [`ProgramWrapper::content_identity`]
//!    and [`ProgramWrapper::program_identity`] produce the key material.

mod files;
mod ti_c6x;

pub use files::{BuildFiles, ExpectedFile, FileRole};
pub use ti_c6x::TiC6xWrapper;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use bcache_args::ArgList;
use serde::{Deserialize, Serialize};

use crate::config::KeyConfig;
use crate::error::WrapperResult;
use crate::sys::{CommandRunner, SystemRunner};

/// Collaborators a wrapper needs from its environment.
#[derive(Clone)]
pub struct WrapperContext {
    pub runner: Arc<dyn CommandRunner>,
    /// Directory for temporary preprocessor output.
    pub temp_dir: PathBuf,
}

impl WrapperContext {
    pub fn new(runner: Arc<dyn CommandRunner>, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            temp_dir: temp_dir.into(),
        }
    }

    /// Context that runs real processes, with the temp dir from `config`.
    pub fn from_config(config: &KeyConfig) -> Self {
        Self::new(Arc::new(SystemRunner), config.temp_dir())
    }
}

impl fmt::Debug for WrapperContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapperContext")
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

/// Argument list with every response file expanded.
///
/// Only [`ProgramWrapper::resolve_args`] creates these, so holding one proves
/// the expansion happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedArgs(ArgList);

impl ResolvedArgs {
    pub(crate) fn new(args: ArgList) -> Self {
        Self(args)
    }

    pub fn args(&self) -> &ArgList {
        &self.0
    }
}

/// What kind of step an invocation performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvocationMode {
    /// Compile a single source file to an object file.
    Compile,
    /// Link objects and libraries into a target.
    Link,
}

impl fmt::Display for InvocationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Compile => write!(f, "compile"),
            Self::Link => write!(f, "link"),
        }
    }
}

/// Mode-specific material identifying what an invocation produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentIdentity {
    /// Full preprocessor output of a compile step.
    Preprocessed(Vec<u8>),
    /// Hex digest over all inputs of a link step.
    LinkDigest(String),
}

impl ContentIdentity {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Preprocessed(text) => text,
            Self::LinkDigest(digest) => digest.as_bytes(),
        }
    }

    pub fn mode(&self) -> InvocationMode {
        match self {
            Self::Preprocessed(_) => InvocationMode::Compile,
            Self::LinkDigest(_) => InvocationMode::Link,
        }
    }
}

/// Capabilities every toolchain wrapper provides.
pub trait ProgramWrapper {
    /// Short stable name of the toolchain family, part of the cache key.
    fn name(&self) -> &'static str;

    /// Expand indirect argument sources.
    fn resolve_args(&self) -> WrapperResult<ResolvedArgs>;

    /// Preprocessed source (compile) or link-input digest (link).
    fn content_identity(&self, resolved: &ResolvedArgs) -> WrapperResult<ContentIdentity>;

    /// Arguments that affect the produced bytes, with paths and existing
    /// input files removed. Unknown flags are kept.
    fn relevant_arguments(&self, resolved: &ResolvedArgs) -> ArgList;

    /// Toolchain fingerprint, independent of the invocation.
    fn program_identity(&self) -> WrapperResult<String>;

    /// Files the real toolchain run produces.
    fn build_files(&self, resolved: &ResolvedArgs) -> WrapperResult<BuildFiles>;
}

/// Supported toolchain families in detection priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    TiC6x,
}

impl WrapperKind {
    pub const ALL: &'static [WrapperKind] = &[WrapperKind::TiC6x];

    pub fn can_handle(&self, args: &ArgList) -> bool {
        match self {
            Self::TiC6x => TiC6xWrapper::can_handle(args),
        }
    }

    fn instantiate(&self, args: ArgList, ctx: WrapperContext) -> Wrapper {
        match self {
            Self::TiC6x => Wrapper::TiC6x(TiC6xWrapper::new(args, ctx)),
        }
    }
}

/// A wrapper instance bound to one invocation.
#[derive(Debug)]
pub enum Wrapper {
    TiC6x(TiC6xWrapper),
}

impl Wrapper {
    pub fn kind(&self) -> WrapperKind {
        match self {
            Self::TiC6x(_) => WrapperKind::TiC6x,
        }
    }

    fn inner(&self) -> &dyn ProgramWrapper {
        match self {
            Self::TiC6x(w) => w,
        }
    }
}

impl ProgramWrapper for Wrapper {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn resolve_args(&self) -> WrapperResult<ResolvedArgs> {
        self.inner().resolve_args()
    }

    fn content_identity(&self, resolved: &ResolvedArgs) -> WrapperResult<ContentIdentity> {
        self.inner().content_identity(resolved)
    }

    fn relevant_arguments(&self, resolved: &ResolvedArgs) -> ArgList {
        self.inner().relevant_arguments(resolved)
    }

    fn program_identity(&self) -> WrapperResult<String> {
        self.inner().program_identity()
    }

    fn build_files(&self, resolved: &ResolvedArgs) -> WrapperResult<BuildFiles> {
        self.inner().build_files(resolved)
    }
}

/// Find the wrapper for `args`, trying variants in priority order.
pub fn find_wrapper(args: &ArgList, ctx: &WrapperContext) -> Option<Wrapper> {
    WrapperKind::ALL
        .iter()
        .find(|kind| kind.can_handle(args))
        .map(|kind| kind.instantiate(args.clone(), ctx.clone()))
}
