//! `binstage outputs`: print build outputs without copying anything.

use crate::cli::{CliError, TargetArgs};
use crate::commands::{resolve_target, to_json};
use binstage_core::{BuildOutputs, StagingResolver, TargetPlatform};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
struct OutputsView<'a> {
    platform: TargetPlatform,
    #[serde(flatten)]
    outputs: &'a BuildOutputs,
}

/// Execute the outputs command.
///
/// # Errors
///
/// Returns an error if the manifest or host directories cannot be resolved.
pub fn execute_outputs(args: &TargetArgs, json: bool) -> Result<String, CliError> {
    let (ctx, table) = resolve_target(args)?;
    let resolver = StagingResolver::new(table.output_root());
    let outputs = resolver.outputs(&table.profile_for(ctx.platform));

    tracing::debug!(
        platform = %ctx.platform,
        libraries = outputs.additional_libraries.len(),
        delay_load = outputs.delay_load_libraries.len(),
        dependencies = outputs.runtime_dependencies.len(),
        "Computed build outputs"
    );

    if json {
        return to_json(OutputsView {
            platform: ctx.platform,
            outputs: &outputs,
        });
    }

    let mut out = String::new();
    if outputs.is_empty() {
        let _ = write!(out, "No build outputs for {}", ctx.platform);
        return Ok(out);
    }

    let _ = writeln!(out, "Link libraries:");
    for lib in &outputs.additional_libraries {
        let _ = writeln!(out, "  {}", lib.display());
    }
    let _ = writeln!(out, "Delay-load:");
    for name in &outputs.delay_load_libraries {
        let _ = writeln!(out, "  {name}");
    }
    let _ = write!(out, "Runtime dependencies:");
    for dep in &outputs.runtime_dependencies {
        let _ = write!(
            out,
            "\n  {} <- {} [{}]",
            dep.staged_path,
            dep.source_path.display(),
            dep.kind
        );
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ManifestArgs;
    use tempfile::TempDir;

    fn preset_args(temp: &TempDir, platform: TargetPlatform) -> TargetArgs {
        TargetArgs {
            manifest: ManifestArgs {
                manifest: None,
                preset: Some("ultralight".to_string()),
            },
            platform: Some(platform),
            module_root: temp.path().join("module"),
            project_root: Some(temp.path().join("project")),
            project_root_hops: 5,
        }
    }

    #[test]
    fn test_outputs_do_not_touch_disk() {
        let temp = TempDir::new().unwrap();
        let output = execute_outputs(&preset_args(&temp, TargetPlatform::Win64), false).unwrap();

        assert!(output.contains("Link libraries:"));
        assert!(output.contains("UltralightCore.lib"));
        assert!(output.contains("$(TargetOutputDir)/Ultralight.dll"));
        // Optional inspector pak is absent, so it is not listed.
        assert!(!output.contains("inspector_resources.pak"));
        assert!(!temp.path().join("project").exists());
    }

    #[test]
    fn test_outputs_json() {
        let temp = TempDir::new().unwrap();
        let output = execute_outputs(&preset_args(&temp, TargetPlatform::Linux), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["data"]["platform"], "linux");
        assert!(value["data"]["delay_load_libraries"].is_array());
        assert_eq!(
            value["data"]["runtime_dependencies"].as_array().unwrap().len(),
            6
        );
    }

    #[test]
    fn test_outputs_unsupported_platform() {
        let temp = TempDir::new().unwrap();
        let output = execute_outputs(&preset_args(&temp, TargetPlatform::Ios), false).unwrap();
        assert_eq!(output, "No build outputs for ios");
    }
}
