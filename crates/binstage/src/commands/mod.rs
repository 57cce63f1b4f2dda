//! Subcommand implementations.
//!
//! Each command returns the text to print on stdout; the binary decides where
//! it goes and how errors are rendered.

pub mod outputs;
pub mod platforms;
pub mod stage;
pub mod version;

use crate::cli::{CliError, Commands, ManifestArgs, TargetArgs};
use binstage_core::{DEFAULT_PRESET, HostContext, Manifest, ProfileTable, TargetPlatform};
use std::path::PathBuf;

/// Run a parsed subcommand.
///
/// # Errors
///
/// Returns a [`CliError`] when the manifest cannot be loaded, the host
/// directories cannot be determined, or strict staging fails.
pub fn execute(command: Commands, json: bool) -> Result<String, CliError> {
    match command {
        Commands::Stage { target, strict } => stage::execute_stage(&target, strict, json),
        Commands::Outputs { target } => outputs::execute_outputs(&target, json),
        Commands::Platforms { manifest } => platforms::execute_platforms(&manifest, json),
        Commands::Version => Ok(version::get_version_info(json)),
    }
}

/// Load the manifest named by the arguments.
///
/// An explicit manifest path wins over a preset name; with neither, the
/// default preset is used.
pub(crate) fn load_manifest(args: &ManifestArgs) -> Result<Manifest, CliError> {
    if let Some(path) = &args.manifest {
        if args.preset.is_some() {
            tracing::debug!(
                manifest = %path.display(),
                "Both manifest and preset given, using manifest"
            );
        }
        tracing::debug!(manifest = %path.display(), "Loading manifest file");
        return Ok(Manifest::load(path)?);
    }

    let name = args.preset.as_deref().unwrap_or(DEFAULT_PRESET);
    tracing::debug!(preset = name, "Loading built-in preset");
    Ok(Manifest::preset(name)?)
}

/// Build the host context and resolved profile table for a staging run.
pub(crate) fn resolve_target(args: &TargetArgs) -> Result<(HostContext, ProfileTable), CliError> {
    let platform = match args.platform {
        Some(platform) => platform,
        None => TargetPlatform::current().ok_or_else(|| {
            CliError::config_with_help(
                "Could not determine the current platform",
                "Pass --platform explicitly",
            )
        })?,
    };

    let module_root = absolute(&args.module_root)?;
    let ctx = match &args.project_root {
        Some(project_root) => HostContext::new(platform, module_root, absolute(project_root)?),
        None => HostContext::with_project_root_hops(platform, module_root, args.project_root_hops)?,
    };

    tracing::debug!(
        platform = %ctx.platform,
        module_root = %ctx.module_root.display(),
        project_root = %ctx.project_root.display(),
        "Resolved host context"
    );

    let manifest = load_manifest(&args.manifest)?;
    let table = ProfileTable::resolve(&manifest, &ctx)?;
    Ok((ctx, table))
}

fn absolute(path: &std::path::Path) -> Result<PathBuf, CliError> {
    std::path::absolute(path).map_err(|e| {
        binstage_core::Error::io(e, Some(path.to_path_buf()), "resolve absolute path").into()
    })
}

/// Serialize `data` inside an [`OkEnvelope`](crate::cli::OkEnvelope).
pub(crate) fn to_json<T: serde::Serialize>(data: T) -> Result<String, CliError> {
    serde_json::to_string_pretty(&crate::cli::OkEnvelope::new(data))
        .map_err(|e| CliError::other(format!("Failed to serialize output: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn manifest_args(manifest: Option<PathBuf>, preset: Option<&str>) -> ManifestArgs {
        ManifestArgs {
            manifest,
            preset: preset.map(String::from),
        }
    }

    #[test]
    fn test_load_default_preset() {
        let manifest = load_manifest(&manifest_args(None, None)).unwrap();
        assert_eq!(manifest, Manifest::preset(DEFAULT_PRESET).unwrap());
    }

    #[test]
    fn test_manifest_wins_over_preset() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("binstage.toml");
        fs::write(
            &path,
            "version = 1\n\n[platforms.linux]\nsource_dir = \"bin\"\nrequired = [\"a.so\"]\n",
        )
        .unwrap();

        let manifest = load_manifest(&manifest_args(Some(path), Some("ultralight"))).unwrap();
        assert_eq!(manifest.platforms.len(), 1);
        assert!(manifest.platforms.contains_key("linux"));
    }

    #[test]
    fn test_unknown_preset_is_config_error() {
        let err = load_manifest(&manifest_args(None, Some("nope"))).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }

    #[test]
    fn test_resolve_target_with_explicit_project_root() {
        let temp = TempDir::new().unwrap();
        let args = TargetArgs {
            manifest: manifest_args(None, None),
            platform: Some(TargetPlatform::Linux),
            module_root: temp.path().join("module"),
            project_root: Some(temp.path().join("project")),
            project_root_hops: 5,
        };

        let (ctx, table) = resolve_target(&args).unwrap();
        assert_eq!(ctx.project_root, temp.path().join("project"));
        assert!(table.supports(TargetPlatform::Linux));
    }

    #[test]
    fn test_resolve_target_with_hops() {
        let temp = TempDir::new().unwrap();
        let args = TargetArgs {
            manifest: manifest_args(None, None),
            platform: Some(TargetPlatform::Win64),
            module_root: temp.path().join("a").join("b"),
            project_root: None,
            project_root_hops: 2,
        };

        let (ctx, _) = resolve_target(&args).unwrap();
        assert_eq!(ctx.project_root, temp.path());
    }

    #[test]
    fn test_too_many_hops_is_config_error() {
        let args = TargetArgs {
            manifest: manifest_args(None, None),
            platform: Some(TargetPlatform::Win64),
            module_root: PathBuf::from("/x"),
            project_root: None,
            project_root_hops: 5,
        };

        let err = resolve_target(&args).unwrap_err();
        assert!(matches!(err, CliError::Config { .. }));
    }
}
