//! `binstage stage`: copy artifacts and report per-destination outcomes.

use crate::cli::{CliError, TargetArgs};
use crate::commands::{resolve_target, to_json};
use binstage_core::{StagingReport, StagingResolver, Strictness};
use std::fmt::Write;

/// Execute the stage command.
///
/// Lenient runs always succeed once the manifest has been resolved; copy
/// failures only show up in the report. With `strict`, a missing required
/// artifact turns into a [`CliError::Staging`].
///
/// # Errors
///
/// Returns an error if the manifest or host directories cannot be resolved,
/// or if `strict` is set and a required artifact is missing.
pub fn execute_stage(args: &TargetArgs, strict: bool, json: bool) -> Result<String, CliError> {
    let (ctx, table) = resolve_target(args)?;
    let resolver = StagingResolver::new(table.output_root());
    let report = resolver.run(&table.profile_for(ctx.platform));

    let strictness = if strict {
        Strictness::Strict
    } else {
        Strictness::Lenient
    };

    if report.should_fail(strictness) {
        let missing: Vec<&str> = report
            .missing_required()
            .map(|o| o.artifact.as_str())
            .collect::<std::collections::BTreeSet<_>>()
            .into_iter()
            .collect();
        let err = CliError::staging_with_help(
            format!(
                "{} required artifact(s) missing for {}: {}",
                missing.len(),
                report.platform,
                missing.join(", ")
            ),
            "Install the prebuilt SDK into the module's source directory, or drop --strict",
        );
        return Err(if json {
            let value = serde_json::to_value(&report)
                .map_err(|e| CliError::other(format!("Failed to serialize report: {e}")))?;
            err.with_report(value)
        } else {
            err
        });
    }

    if json {
        to_json(&report)
    } else {
        Ok(render_report(&report))
    }
}

fn render_report(report: &StagingReport) -> String {
    let mut out = String::new();

    if report.outcomes.is_empty() {
        let _ = writeln!(out, "Nothing to stage for {}", report.platform);
        return out;
    }

    let _ = writeln!(out, "Staging for {}", report.platform);
    for outcome in &report.outcomes {
        let _ = write!(
            out,
            "  {:<24} {} -> {}",
            outcome.status,
            outcome.artifact,
            outcome.destination.display()
        );
        if let Some(detail) = &outcome.detail {
            let _ = write!(out, " ({detail})");
        }
        out.push('\n');
    }
    let _ = writeln!(out, "{}", report.summary());
    let _ = write!(
        out,
        "{} runtime dependencies registered",
        report.outputs.runtime_dependencies.len()
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ManifestArgs;
    use binstage_core::TargetPlatform;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"
version = 1

[platforms.linux]
source_dir = "bin"
destinations = [{ path = "Binaries/Linux" }]
required = ["libcore.so"]
optional = ["extras.pak"]
"#;

    fn setup(with_required: bool) -> (TempDir, TargetArgs) {
        let temp = TempDir::new().unwrap();
        let module = temp.path().join("module");
        fs::create_dir_all(module.join("bin")).unwrap();
        if with_required {
            fs::write(module.join("bin/libcore.so"), b"core").unwrap();
        }
        let manifest = temp.path().join("binstage.toml");
        fs::write(&manifest, MANIFEST).unwrap();

        let args = TargetArgs {
            manifest: ManifestArgs {
                manifest: Some(manifest),
                preset: None,
            },
            platform: Some(TargetPlatform::Linux),
            module_root: module,
            project_root: Some(temp.path().join("project")),
            project_root_hops: 5,
        };
        (temp, args)
    }

    #[test]
    fn test_stage_copies_and_reports() {
        let (temp, args) = setup(true);
        let output = execute_stage(&args, false, false).unwrap();

        assert!(output.contains("Staging for linux"));
        assert!(output.contains("copied"));
        assert!(output.contains("optional missing"));
        assert!(output.contains("1 runtime dependencies registered"));
        assert!(Path::new(&temp.path().join("project/Binaries/Linux/libcore.so")).is_file());
    }

    #[test]
    fn test_lenient_missing_required_succeeds() {
        let (_temp, args) = setup(false);
        let output = execute_stage(&args, false, false).unwrap();
        assert!(output.lines().any(|line| {
            line.trim_start().starts_with("missing required") && line.contains("libcore.so")
        }));
    }

    #[test]
    fn test_strict_missing_required_fails() {
        let (_temp, args) = setup(false);
        let err = execute_stage(&args, true, false).unwrap_err();
        assert!(matches!(err, CliError::Staging { .. }));
        assert!(err.to_string().contains("libcore.so"));
        assert!(matches!(err, CliError::Staging { report: None, .. }));
    }

    #[test]
    fn test_strict_json_failure_keeps_outcomes() {
        let (_temp, args) = setup(false);
        let err = execute_stage(&args, true, true).unwrap_err();
        let CliError::Staging {
            report: Some(report),
            ..
        } = err
        else {
            panic!("Expected staging error with report");
        };
        assert_eq!(report["platform"], "linux");
        assert_eq!(report["outcomes"][0]["artifact"], "libcore.so");
        assert_eq!(report["outcomes"][0]["status"], "failed_missing_required");
        assert_eq!(report["outcomes"][1]["status"], "skipped_optional_missing");
    }

    #[test]
    fn test_json_report() {
        let (_temp, args) = setup(true);
        let output = execute_stage(&args, false, true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(value["status"], "ok");
        assert_eq!(value["data"]["platform"], "linux");
        assert_eq!(value["data"]["outcomes"][0]["status"], "copied");
        assert_eq!(
            value["data"]["outputs"]["runtime_dependencies"][0]["staged_path"],
            "$(TargetOutputDir)/libcore.so"
        );
    }

    #[test]
    fn test_unsupported_platform_is_noop() {
        let (_temp, mut args) = setup(true);
        args.platform = Some(TargetPlatform::Android);
        let output = execute_stage(&args, true, false).unwrap();
        assert!(output.contains("Nothing to stage for android"));
    }
}
