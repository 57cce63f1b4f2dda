//! Resolved per-platform staging profiles.
//!
//! A [`ProfileTable`] is built once from a [`Manifest`] and the host's
//! directories. Looking up a platform without an entry yields an empty
//! profile, so staging for an unsupported platform does nothing.

use crate::manifest::{ArtifactEntry, Manifest, PlatformEntry};
use crate::paths::{self, resolve_under};
use crate::{Error, Result, StagedFileKind, TargetPlatform};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

/// What to do when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CopyPolicy {
    /// Replace the existing file with the source.
    #[default]
    Overwrite,
    /// Leave an existing file untouched.
    NoClobber,
}

impl std::fmt::Display for CopyPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Overwrite => write!(f, "overwrite"),
            Self::NoClobber => write!(f, "no-clobber"),
        }
    }
}

/// A directory that receives a copy of every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Destination {
    /// Absolute directory path.
    pub path: PathBuf,
    /// Copy policy for this directory.
    pub policy: CopyPolicy,
}

impl Destination {
    /// Destination using the default overwrite policy.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: CopyPolicy::default(),
        }
    }

    /// Destination that never replaces existing files.
    #[must_use]
    pub fn no_clobber(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            policy: CopyPolicy::NoClobber,
        }
    }
}

/// A named file to stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
    /// Plain filename, unique within its profile.
    pub filename: String,
    /// Directory to read from instead of the profile's source directory.
    pub source_dir: Option<PathBuf>,
    /// Whether absence is tolerated.
    pub optional: bool,
    /// How the runtime dependency is tagged.
    pub kind: StagedFileKind,
}

impl Artifact {
    /// A required artifact read from the profile's source directory.
    #[must_use]
    pub fn required(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            source_dir: None,
            optional: false,
            kind: StagedFileKind::default(),
        }
    }

    /// An optional artifact read from the profile's source directory.
    #[must_use]
    pub fn optional(filename: impl Into<String>) -> Self {
        Self {
            optional: true,
            ..Self::required(filename)
        }
    }

    /// Read this artifact from `dir` instead.
    #[must_use]
    pub fn from_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.source_dir = Some(dir.into());
        self
    }

    /// Where the artifact is read from.
    #[must_use]
    pub fn source_path(&self, profile_source_dir: &Path) -> PathBuf {
        self.source_dir
            .as_deref()
            .unwrap_or(profile_source_dir)
            .join(&self.filename)
    }
}

/// Complete staging configuration for one platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlatformProfile {
    /// Platform this profile applies to.
    pub platform: TargetPlatform,
    /// Directory holding the platform's prebuilt artifacts.
    pub source_dir: PathBuf,
    /// Ordered destinations; every artifact goes to each of them.
    pub destinations: Vec<Destination>,
    /// Artifacts that must be present.
    pub required: Vec<Artifact>,
    /// Artifacts staged only when present.
    pub optional: Vec<Artifact>,
    /// Import libraries for the link line.
    pub link_libraries: Vec<PathBuf>,
    /// Libraries to delay-load.
    pub delay_load: Vec<String>,
}

impl PlatformProfile {
    /// Profile that stages nothing.
    #[must_use]
    pub fn empty(platform: TargetPlatform) -> Self {
        Self {
            platform,
            source_dir: PathBuf::new(),
            destinations: Vec::new(),
            required: Vec::new(),
            optional: Vec::new(),
            link_libraries: Vec::new(),
            delay_load: Vec::new(),
        }
    }

    /// Required artifacts followed by optional ones.
    pub fn artifacts(&self) -> impl Iterator<Item = &Artifact> {
        self.required.iter().chain(self.optional.iter())
    }

    /// Total number of declared artifacts.
    #[must_use]
    pub fn artifact_count(&self) -> usize {
        self.required.len() + self.optional.len()
    }

    /// Whether the profile declares nothing at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifact_count() == 0
            && self.destinations.is_empty()
            && self.link_libraries.is_empty()
            && self.delay_load.is_empty()
    }

    /// Check the profile invariants.
    ///
    /// Filenames must be plain names and unique across both sets, which also
    /// keeps the required and optional sets disjoint.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for artifact in self.artifacts() {
            paths::validate_filename(&artifact.filename).map_err(|reason| {
                Error::invalid_manifest(
                    self.platform.as_str(),
                    format!("'{}': {reason}", artifact.filename),
                )
            })?;

            if !seen.insert(artifact.filename.as_str()) {
                let in_required = self.required.iter().any(|a| a.filename == artifact.filename);
                let in_optional = self.optional.iter().any(|a| a.filename == artifact.filename);
                let message = if in_required && in_optional {
                    format!(
                        "artifact '{}' is listed as both required and optional",
                        artifact.filename
                    )
                } else {
                    format!("artifact '{}' is listed more than once", artifact.filename)
                };
                return Err(Error::invalid_manifest(self.platform.as_str(), message));
            }
        }
        Ok(())
    }
}

/// Directories supplied by the host build system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostContext {
    /// Platform being built.
    pub platform: TargetPlatform,
    /// This module's own directory; base for source directories.
    pub module_root: PathBuf,
    /// The hosting project's root; base for destinations.
    pub project_root: PathBuf,
}

impl HostContext {
    /// Context with an explicit project root.
    #[must_use]
    pub fn new(
        platform: TargetPlatform,
        module_root: impl Into<PathBuf>,
        project_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            platform,
            module_root: module_root.into(),
            project_root: project_root.into(),
        }
    }

    /// Context whose project root is `hops` directories above the module root.
    pub fn with_project_root_hops(
        platform: TargetPlatform,
        module_root: impl Into<PathBuf>,
        hops: usize,
    ) -> Result<Self> {
        let module_root = module_root.into();
        let project_root = paths::project_root_from_hops(&module_root, hops)?;
        Ok(Self {
            platform,
            module_root,
            project_root,
        })
    }
}

/// Mapping from platform to its resolved profile.
#[derive(Debug, Clone, Default)]
pub struct ProfileTable {
    output_root: String,
    profiles: BTreeMap<TargetPlatform, PlatformProfile>,
}

impl ProfileTable {
    /// Resolve every platform entry in `manifest` against the host directories.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidManifest`] for unknown platform names, platforms
    /// listed twice under different aliases, and profiles that break the
    /// artifact invariants.
    pub fn resolve(manifest: &Manifest, ctx: &HostContext) -> Result<Self> {
        let mut profiles = BTreeMap::new();

        for (key, entry) in &manifest.platforms {
            let platform = TargetPlatform::parse(key)
                .ok_or_else(|| Error::invalid_manifest(key, "unknown platform name"))?;

            let profile = resolve_entry(platform, entry, ctx);
            profile
                .validate()
                .map_err(|e| rekey_invalid_manifest(e, key))?;

            if profiles.insert(platform, profile).is_some() {
                return Err(Error::invalid_manifest(
                    key,
                    format!("platform '{platform}' is declared more than once"),
                ));
            }
        }

        tracing::debug!(
            platforms = profiles.len(),
            module_root = %ctx.module_root.display(),
            project_root = %ctx.project_root.display(),
            "Resolved platform profiles"
        );

        Ok(Self {
            output_root: manifest.output_root.clone(),
            profiles,
        })
    }

    /// Build a table from already-resolved profiles.
    pub fn from_profiles(
        output_root: impl Into<String>,
        profiles: impl IntoIterator<Item = PlatformProfile>,
    ) -> Result<Self> {
        let mut table = Self {
            output_root: output_root.into(),
            profiles: BTreeMap::new(),
        };
        for profile in profiles {
            profile.validate()?;
            table.profiles.insert(profile.platform, profile);
        }
        Ok(table)
    }

    /// Profile for `platform`, or an empty one when the platform is not covered.
    #[must_use]
    pub fn profile_for(&self, platform: TargetPlatform) -> Cow<'_, PlatformProfile> {
        self.profiles.get(&platform).map_or_else(
            || {
                tracing::debug!(%platform, "No profile for platform, staging is a no-op");
                Cow::Owned(PlatformProfile::empty(platform))
            },
            Cow::Borrowed,
        )
    }

    /// Whether `platform` has a profile.
    #[must_use]
    pub fn supports(&self, platform: TargetPlatform) -> bool {
        self.profiles.contains_key(&platform)
    }

    /// Platforms with profiles, in stable order.
    pub fn platforms(&self) -> impl Iterator<Item = TargetPlatform> + '_ {
        self.profiles.keys().copied()
    }

    /// Output root token for staged paths.
    #[must_use]
    pub fn output_root(&self) -> &str {
        &self.output_root
    }
}

fn resolve_entry(platform: TargetPlatform, entry: &PlatformEntry, ctx: &HostContext) -> PlatformProfile {
    let source_dir = resolve_under(&ctx.module_root, &entry.source_dir);

    let artifact = |entry: &ArtifactEntry, optional: bool| Artifact {
        filename: entry.name().to_string(),
        source_dir: entry
            .source_dir()
            .map(|dir| resolve_under(&ctx.module_root, dir)),
        optional,
        kind: entry.kind(),
    };

    PlatformProfile {
        platform,
        destinations: entry
            .destinations
            .iter()
            .map(|d| Destination {
                path: resolve_under(&ctx.project_root, &d.path),
                policy: d.policy,
            })
            .collect(),
        required: entry.required.iter().map(|a| artifact(a, false)).collect(),
        optional: entry.optional.iter().map(|a| artifact(a, true)).collect(),
        link_libraries: entry
            .link_libraries
            .iter()
            .map(|lib| resolve_under(&source_dir, lib))
            .collect(),
        delay_load: entry.delay_load.clone(),
        source_dir,
    }
}

/// Report validation errors under the key the user wrote, not the canonical name.
fn rekey_invalid_manifest(err: Error, key: &str) -> Error {
    match err {
        Error::InvalidManifest { message, .. } => Error::invalid_manifest(key, message),
        other => other,
    }
}
