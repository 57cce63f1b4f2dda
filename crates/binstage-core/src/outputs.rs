//! Results handed back to the host build system.
//!
//! Runtime dependencies tell a later packaging step which files belong in
//! the distributable. They are recorded whether or not local staging managed
//! to copy anything.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// How the packaging step should treat a staged file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StagedFileKind {
    /// Opaque, unversioned file copied next to the executable as-is.
    #[default]
    NonManaged,
    /// Like [`Self::NonManaged`], but only shipped in debug distributions.
    Debug,
}

impl std::fmt::Display for StagedFileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NonManaged => write!(f, "non-managed"),
            Self::Debug => write!(f, "debug"),
        }
    }
}

/// A single runtime dependency declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeDependency {
    /// Where the file ends up, relative to the host's output root token.
    pub staged_path: String,
    /// Where the file is read from.
    pub source_path: PathBuf,
    /// Packaging treatment.
    pub kind: StagedFileKind,
}

/// Ordered collection of runtime dependencies, unique by staged path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuntimeDependencies {
    entries: Vec<RuntimeDependency>,
}

impl RuntimeDependencies {
    /// Create an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a dependency.
    ///
    /// A later registration for the same staged path replaces the earlier one
    /// in place.
    pub fn register(
        &mut self,
        staged_path: impl Into<String>,
        source_path: impl Into<PathBuf>,
        kind: StagedFileKind,
    ) {
        let dependency = RuntimeDependency {
            staged_path: staged_path.into(),
            source_path: source_path.into(),
            kind,
        };

        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|d| d.staged_path == dependency.staged_path)
        {
            *existing = dependency;
        } else {
            self.entries.push(dependency);
        }
    }

    /// Look up a dependency by staged path.
    #[must_use]
    pub fn get(&self, staged_path: &str) -> Option<&RuntimeDependency> {
        self.entries.iter().find(|d| d.staged_path == staged_path)
    }

    /// Source path registered for a staged path.
    #[must_use]
    pub fn source_for(&self, staged_path: &str) -> Option<&Path> {
        self.get(staged_path).map(|d| d.source_path.as_path())
    }

    /// Iterate in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &RuntimeDependency> {
        self.entries.iter()
    }

    /// Number of registered dependencies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuntimeDependencies {
    type Item = &'a RuntimeDependency;
    type IntoIter = std::slice::Iter<'a, RuntimeDependency>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Everything the host build system consumes from one platform profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildOutputs {
    /// Import libraries to add to the link line, passed through unchanged.
    pub additional_libraries: Vec<PathBuf>,
    /// Shared libraries to load lazily on platforms that support it.
    pub delay_load_libraries: Vec<String>,
    /// Files that must end up in the final distributable.
    pub runtime_dependencies: RuntimeDependencies,
}

impl BuildOutputs {
    /// Whether there is nothing for the host to consume.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.additional_libraries.is_empty()
            && self.delay_load_libraries.is_empty()
            && self.runtime_dependencies.is_empty()
    }
}
