//! Build artifact descriptors.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{WrapperError, WrapperResult};

/// Logical role of a file produced by the toolchain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileRole {
    /// Object file of a compile step.
    Object,
    /// Output of a link step.
    LinkTarget,
    /// Dependency file.
    Dep,
    /// Linker map file.
    Map,
}

impl FileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::LinkTarget => "linktarget",
            Self::Dep => "dep",
            Self::Map => "map",
        }
    }

    /// True for the roles that name the main product of an invocation.
    pub fn is_primary(&self) -> bool {
        matches!(self, Self::Object | Self::LinkTarget)
    }
}

impl fmt::Display for FileRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file the cache should capture after a real run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectedFile {
    pub path: String,
    pub cacheable: bool,
}

impl ExpectedFile {
    pub fn cacheable(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            cacheable: true,
        }
    }
}

/// Files an invocation produces, keyed by role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BuildFiles(BTreeMap<FileRole, ExpectedFile>);

impl BuildFiles {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file, rejecting a second declaration of the same role or a
    /// second primary output.
    pub fn insert_unique(&mut self, role: FileRole, file: ExpectedFile) -> WrapperResult<()> {
        let conflicts = self.0.contains_key(&role)
            || (role.is_primary() && self.primary().is_some());
        if conflicts {
            return Err(WrapperError::ConflictingOutputDeclaration {
                role: role.to_string(),
            });
        }
        self.0.insert(role, file);
        Ok(())
    }

    pub fn get(&self, role: FileRole) -> Option<&ExpectedFile> {
        self.0.get(&role)
    }

    /// The object file or link target.
    pub fn primary(&self) -> Option<(FileRole, &ExpectedFile)> {
        self.0
            .iter()
            .find(|(role, _)| role.is_primary())
            .map(|(role, file)| (*role, file))
    }

    pub fn iter(&self) -> impl Iterator<Item = (FileRole, &ExpectedFile)> {
        self.0.iter().map(|(role, file)| (*role, file))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
