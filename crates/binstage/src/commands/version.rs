//! `binstage version`

use binstage_core::{MANIFEST_VERSION, TargetPlatform, preset_names};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct VersionInfo {
    name: &'static str,
    version: &'static str,
    manifest_version: u32,
    current_platform: Option<TargetPlatform>,
    presets: Vec<&'static str>,
    correlation_id: String,
}

/// Version, manifest format and preset information, as text or a JSON envelope.
#[tracing::instrument]
pub fn get_version_info(json: bool) -> String {
    let info = VersionInfo {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        manifest_version: MANIFEST_VERSION,
        current_platform: TargetPlatform::current(),
        presets: preset_names(),
        correlation_id: crate::tracing::correlation_id().to_string(),
    };

    tracing::debug!(
        package_name = info.name,
        package_version = info.version,
        "Gathering package information"
    );

    if json {
        return serde_json::to_string_pretty(&crate::cli::OkEnvelope::new(&info))
            .unwrap_or_else(|e| format!("{{\"status\":\"error\",\"error\":\"{e}\"}}"));
    }

    let platform = info
        .current_platform
        .map_or_else(|| "unknown".to_string(), |p| p.to_string());

    format!(
        "{} {} - {}\n\
        Manifest format: v{}\n\
        Current platform: {}\n\
        Presets: {}\n\
        Correlation ID: {}",
        info.name,
        info.version,
        env!("CARGO_PKG_DESCRIPTION"),
        info.manifest_version,
        platform,
        info.presets.join(", "),
        info.correlation_id
    )
}
