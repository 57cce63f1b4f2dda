//! `binstage platforms`: list the platforms a manifest covers.

use crate::cli::{CliError, ManifestArgs};
use crate::commands::{load_manifest, to_json};
use binstage_core::{Manifest, TargetPlatform};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Serialize)]
struct PlatformInfo {
    platform: TargetPlatform,
    required: usize,
    optional: usize,
    destinations: usize,
    current: bool,
}

fn describe(manifest: &Manifest) -> Result<Vec<PlatformInfo>, CliError> {
    let current = TargetPlatform::current();
    let mut platforms = manifest
        .platforms
        .iter()
        .map(|(key, entry)| {
            let platform = TargetPlatform::parse(key).ok_or_else(|| {
                binstage_core::Error::invalid_manifest(key, "unknown platform name")
            })?;
            Ok(PlatformInfo {
                platform,
                required: entry.required.len(),
                optional: entry.optional.len(),
                destinations: entry.destinations.len(),
                current: current == Some(platform),
            })
        })
        .collect::<Result<Vec<_>, binstage_core::Error>>()?;
    platforms.sort_by_key(|info| info.platform);
    Ok(platforms)
}

/// Execute the platforms command.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or names an unknown platform.
pub fn execute_platforms(args: &ManifestArgs, json: bool) -> Result<String, CliError> {
    let manifest = load_manifest(args)?;
    let platforms = describe(&manifest)?;

    if json {
        return to_json(platforms);
    }

    if platforms.is_empty() {
        return Ok("No platforms declared".to_string());
    }

    let mut out = String::new();
    for (i, info) in platforms.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        let _ = write!(
            out,
            "{:<12} {} required, {} optional, {} destinations",
            info.platform.as_str(),
            info.required,
            info.optional,
            info.destinations
        );
        if info.current {
            out.push_str(" (current)");
        }
    }
    Ok(out)
}
