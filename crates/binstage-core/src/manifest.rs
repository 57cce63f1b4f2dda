//! Manifest format for declaring per-platform artifacts.
//!
//! A manifest (`binstage.toml`) lists, per platform, where prebuilt artifacts
//! live and where they must be staged:
//!
//! ```toml
//! version = 1
//! output_root = "$(TargetOutputDir)"
//!
//! [platforms.win64]
//! source_dir = "Win64"
//! link_libraries = ["Ultralight.lib"]
//! delay_load = ["Ultralight.dll"]
//! required = ["Ultralight.dll", { name = "icudt67l.dat", source_dir = "resources" }]
//! optional = ["inspector_resources.pak"]
//!
//! [[platforms.win64.destinations]]
//! path = "Binaries/Win64"
//! policy = "no-clobber"
//! ```
//!
//! Source directories are relative to the module root, destinations to the
//! project root, link libraries to the platform's source directory. Absolute
//! paths are used as written.

use crate::{CopyPolicy, Error, Result, StagedFileKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Current manifest format version.
pub const MANIFEST_VERSION: u32 = 1;

/// Conventional manifest filename.
pub const MANIFEST_NAME: &str = "binstage.toml";

/// Output root token prefixed onto staged paths unless overridden.
pub const DEFAULT_OUTPUT_ROOT: &str = "$(TargetOutputDir)";

/// Preset used when neither a manifest nor a preset is named.
pub const DEFAULT_PRESET: &str = "ultralight";

const PRESETS: &[(&str, &str)] = &[
    ("ultralight", include_str!("../presets/ultralight.toml")),
    (
        "ultralight-no-clobber",
        include_str!("../presets/ultralight-no-clobber.toml"),
    ),
];

/// The root manifest structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Manifest format version (for future migrations).
    #[serde(default = "default_version")]
    pub version: u32,
    /// Token prefixed onto every staged path.
    #[serde(default = "default_output_root")]
    pub output_root: String,
    /// Platform entries keyed by platform name.
    #[serde(default)]
    pub platforms: BTreeMap<String, PlatformEntry>,
}

fn default_version() -> u32 {
    MANIFEST_VERSION
}

fn default_output_root() -> String {
    DEFAULT_OUTPUT_ROOT.to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            output_root: default_output_root(),
            platforms: BTreeMap::new(),
        }
    }
}

/// One platform's entry as written in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PlatformEntry {
    /// Directory holding this platform's prebuilt artifacts.
    pub source_dir: PathBuf,
    /// Directories that each receive a copy of every artifact.
    #[serde(default)]
    pub destinations: Vec<DestinationEntry>,
    /// Artifacts that must be present.
    #[serde(default)]
    pub required: Vec<ArtifactEntry>,
    /// Artifacts staged only when present.
    #[serde(default)]
    pub optional: Vec<ArtifactEntry>,
    /// Import libraries for the link line.
    #[serde(default)]
    pub link_libraries: Vec<PathBuf>,
    /// Libraries to delay-load, passed through verbatim.
    #[serde(default)]
    pub delay_load: Vec<String>,
}

/// A destination directory and its copy policy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DestinationEntry {
    /// Directory path.
    pub path: PathBuf,
    /// Whether existing files are overwritten.
    #[serde(default)]
    pub policy: CopyPolicy,
}

/// An artifact, either a bare filename or a table with overrides.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ArtifactEntry {
    /// Just the filename, found in the platform's source directory.
    Name(String),
    /// Filename with per-artifact settings.
    Detailed {
        /// Filename.
        name: String,
        /// Directory to read this artifact from instead of the platform's.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        source_dir: Option<PathBuf>,
        /// Packaging treatment of the registered dependency.
        #[serde(default)]
        kind: StagedFileKind,
    },
}

impl ArtifactEntry {
    /// The artifact's filename.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Name(name) | Self::Detailed { name, .. } => name,
        }
    }

    /// Source directory override, if any.
    #[must_use]
    pub fn source_dir(&self) -> Option<&Path> {
        match self {
            Self::Name(_) => None,
            Self::Detailed { source_dir, .. } => source_dir.as_deref(),
        }
    }

    /// Packaging treatment.
    #[must_use]
    pub fn kind(&self) -> StagedFileKind {
        match self {
            Self::Name(_) => StagedFileKind::default(),
            Self::Detailed { kind, .. } => *kind,
        }
    }
}

impl Manifest {
    /// Parse a manifest from TOML text.
    ///
    /// `origin` names the source in error messages.
    pub fn from_toml_str(content: &str, origin: &str) -> Result<Self> {
        let manifest: Self =
            toml::from_str(content).map_err(|e| Error::manifest_parse(origin, e.to_string()))?;

        // Version check for future migrations
        if manifest.version > MANIFEST_VERSION {
            return Err(Error::UnsupportedVersion {
                found: manifest.version,
                supported: MANIFEST_VERSION,
            });
        }

        Ok(manifest)
    }

    /// Load a manifest from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::io(e, Some(path.to_path_buf()), "read manifest"))?;
        let manifest = Self::from_toml_str(&content, &path.display().to_string())?;

        tracing::debug!(
            path = %path.display(),
            platforms = manifest.platforms.len(),
            "Loaded manifest"
        );

        Ok(manifest)
    }

    /// Load one of the built-in presets.
    pub fn preset(name: &str) -> Result<Self> {
        let (_, content) = PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .ok_or_else(|| Error::UnknownPreset {
                name: name.to_string(),
                available: Some(format!("Available presets: {}", preset_names().join(", "))),
            })?;

        Self::from_toml_str(content, &format!("preset '{name}'"))
    }

    /// Serialize the manifest back to TOML.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::configuration(format!("Failed to serialize manifest: {e}")))
    }
}

/// Names of the built-in presets.
#[must_use]
pub fn preset_names() -> Vec<&'static str> {
    PRESETS.iter().map(|(name, _)| *name).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_minimal() {
        let manifest = Manifest::from_toml_str("", "inline").unwrap();
        assert_eq!(manifest, Manifest::default());
    }

    #[test]
    fn test_parse_artifact_forms() {
        let manifest = Manifest::from_toml_str(
            r#"
            [platforms.linux]
            source_dir = "Linux"
            required = ["libUltralight.so", { name = "icudt67l.dat", source_dir = "resources" }]
            optional = [{ name = "libUltralight.debug", kind = "debug" }]

            [[platforms.linux.destinations]]
            path = "Binaries/Linux"
            "#,
            "inline",
        )
        .unwrap();

        let linux = &manifest.platforms["linux"];
        assert_eq!(linux.required[0], ArtifactEntry::Name("libUltralight.so".into()));
        assert_eq!(linux.required[1].name(), "icudt67l.dat");
        assert_eq!(linux.required[1].source_dir(), Some(Path::new("resources")));
        assert_eq!(linux.optional[0].kind(), StagedFileKind::Debug);
        assert_eq!(linux.destinations[0].policy, CopyPolicy::Overwrite);
    }

    #[test]
    fn test_parse_policy() {
        let manifest = Manifest::from_toml_str(
            r#"
            [platforms.win64]
            source_dir = "Win64"
            destinations = [{ path = "a", policy = "no-clobber" }, { path = "b", policy = "overwrite" }]
            "#,
            "inline",
        )
        .unwrap();
        let win = &manifest.platforms["win64"];
        assert_eq!(win.destinations[0].policy, CopyPolicy::NoClobber);
        assert_eq!(win.destinations[1].policy, CopyPolicy::Overwrite);
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = Manifest::from_toml_str(
            r#"
            [platforms.win64]
            source_dir = "Win64"
            requried = ["typo.dll"]
            "#,
            "inline",
        )
        .unwrap_err();
        assert!(matches!(err, Error::ManifestParse { .. }));
    }

    #[test]
    fn test_rejects_newer_version() {
        let err = Manifest::from_toml_str("version = 99", "inline").unwrap_err();
        assert!(matches!(
            err,
            Error::UnsupportedVersion {
                found: 99,
                supported: MANIFEST_VERSION
            }
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let tmp = TempDir::new().unwrap();
        let err = Manifest::load(&tmp.path().join(MANIFEST_NAME)).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }

    #[test]
    fn test_load_roundtrip_through_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(MANIFEST_NAME);
        let original = Manifest::preset("ultralight").unwrap();
        std::fs::write(&path, original.to_toml_string().unwrap()).unwrap();

        assert_eq!(Manifest::load(&path).unwrap(), original);
    }

    #[test]
    fn test_presets_load() {
        for name in preset_names() {
            let manifest = Manifest::preset(name).unwrap();
            for key in ["win64", "mac", "linux"] {
                assert!(
                    manifest.platforms.contains_key(key),
                    "preset {name} should cover {key}"
                );
            }
        }
    }

    #[test]
    fn test_preset_variants_differ() {
        let overwrite = Manifest::preset("ultralight").unwrap();
        let no_clobber = Manifest::preset("ultralight-no-clobber").unwrap();

        let has_appcore = |m: &Manifest| {
            m.platforms["win64"]
                .required
                .iter()
                .any(|a| a.name() == "AppCore.dll")
        };
        assert!(has_appcore(&overwrite));
        assert!(!has_appcore(&no_clobber));

        assert!(
            overwrite.platforms["win64"]
                .destinations
                .iter()
                .all(|d| d.policy == CopyPolicy::Overwrite)
        );
        assert!(
            no_clobber.platforms["win64"]
                .destinations
                .iter()
                .all(|d| d.policy == CopyPolicy::NoClobber)
        );
    }

    #[test]
    fn test_unknown_preset() {
        let err = Manifest::preset("webkit").unwrap_err();
        match err {
            Error::UnknownPreset { name, available } => {
                assert_eq!(name, "webkit");
                assert!(available.unwrap().contains("ultralight"));
            }
            other => panic!("Expected UnknownPreset, got {other:?}"),
        }
    }
}
