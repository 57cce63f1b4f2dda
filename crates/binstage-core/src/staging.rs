//! The staging resolver.
//!
//! Staging is best-effort per (artifact, destination) pair. Nothing in here
//! returns an error: every missing file, directory failure or copy failure
//! becomes a [`StagingOutcome`] that callers and tests can inspect.

use crate::outputs::{BuildOutputs, RuntimeDependencies};
use crate::paths::{ensure_directory, staged_path};
use crate::profile::{Artifact, CopyPolicy, Destination, PlatformProfile};
use crate::{DEFAULT_OUTPUT_ROOT, TargetPlatform};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Result of staging one artifact to one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StagingStatus {
    /// The file was copied (or overwritten).
    Copied,
    /// A no-clobber destination already had the file.
    SkippedAlreadyPresent,
    /// An optional artifact's source does not exist.
    SkippedOptionalMissing,
    /// A required artifact's source does not exist.
    FailedMissingRequired,
    /// Creating the destination directory or copying the file failed.
    FailedCopyError,
}

impl StagingStatus {
    /// Whether this outcome represents a problem.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::FailedMissingRequired | Self::FailedCopyError)
    }

    /// Short label for reports.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Copied => "copied",
            Self::SkippedAlreadyPresent => "already present",
            Self::SkippedOptionalMissing => "optional missing",
            Self::FailedMissingRequired => "missing required",
            Self::FailedCopyError => "copy failed",
        }
    }
}

impl std::fmt::Display for StagingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One (artifact, destination) staging result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StagingOutcome {
    /// Artifact filename.
    pub artifact: String,
    /// Destination directory.
    pub destination: PathBuf,
    /// What happened.
    pub status: StagingStatus,
    /// Error message for failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl StagingOutcome {
    fn new(artifact: &Artifact, destination: &Destination, status: StagingStatus) -> Self {
        Self {
            artifact: artifact.filename.clone(),
            destination: destination.path.clone(),
            status,
            detail: None,
        }
    }

    fn failed(artifact: &Artifact, destination: &Destination, detail: String) -> Self {
        Self {
            detail: Some(detail),
            ..Self::new(artifact, destination, StagingStatus::FailedCopyError)
        }
    }
}

/// How a caller treats missing required artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// A missing required artifact fails the build.
    #[default]
    Strict,
    /// Only report; never fail.
    Lenient,
}

/// Per-status outcome counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StagingSummary {
    /// [`StagingStatus::Copied`] outcomes.
    pub copied: usize,
    /// [`StagingStatus::SkippedAlreadyPresent`] outcomes.
    pub already_present: usize,
    /// [`StagingStatus::SkippedOptionalMissing`] outcomes.
    pub optional_missing: usize,
    /// [`StagingStatus::FailedMissingRequired`] outcomes.
    pub missing_required: usize,
    /// [`StagingStatus::FailedCopyError`] outcomes.
    pub copy_errors: usize,
}

impl StagingSummary {
    fn record(&mut self, status: StagingStatus) {
        match status {
            StagingStatus::Copied => self.copied += 1,
            StagingStatus::SkippedAlreadyPresent => self.already_present += 1,
            StagingStatus::SkippedOptionalMissing => self.optional_missing += 1,
            StagingStatus::FailedMissingRequired => self.missing_required += 1,
            StagingStatus::FailedCopyError => self.copy_errors += 1,
        }
    }
}

impl std::fmt::Display for StagingSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} copied, {} already present, {} optional missing, {} missing required, {} copy errors",
            self.copied,
            self.already_present,
            self.optional_missing,
            self.missing_required,
            self.copy_errors
        )
    }
}

/// Outcomes and build outputs from one staging run.
#[derive(Debug, Clone, Serialize)]
pub struct StagingReport {
    /// Platform that was staged.
    pub platform: TargetPlatform,
    /// One entry per (artifact, destination) pair.
    pub outcomes: Vec<StagingOutcome>,
    /// Link libraries, delay-load list and runtime dependencies.
    pub outputs: BuildOutputs,
}

impl StagingReport {
    /// Outcomes for required artifacts whose source was missing.
    pub fn missing_required(&self) -> impl Iterator<Item = &StagingOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == StagingStatus::FailedMissingRequired)
    }

    /// Outcomes that wrote a file.
    pub fn copied(&self) -> impl Iterator<Item = &StagingOutcome> {
        self.with_status(StagingStatus::Copied)
    }

    /// All failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &StagingOutcome> {
        self.outcomes.iter().filter(|o| o.status.is_failure())
    }

    /// Outcomes with the given status.
    pub fn with_status(&self, status: StagingStatus) -> impl Iterator<Item = &StagingOutcome> {
        self.outcomes.iter().filter(move |o| o.status == status)
    }

    /// Count outcomes by status.
    #[must_use]
    pub fn summary(&self) -> StagingSummary {
        let mut summary = StagingSummary::default();
        for outcome in &self.outcomes {
            summary.record(outcome.status);
        }
        summary
    }

    /// Whether no outcome failed.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Whether a caller with the given strictness should fail the build.
    #[must_use]
    pub fn should_fail(&self, strictness: Strictness) -> bool {
        match strictness {
            Strictness::Strict => self.missing_required().next().is_some(),
            Strictness::Lenient => false,
        }
    }
}

/// Copies a profile's artifacts into its destinations and registers them as
/// runtime dependencies.
#[derive(Debug, Clone)]
pub struct StagingResolver {
    output_root: String,
}

impl Default for StagingResolver {
    fn default() -> Self {
        Self::new(DEFAULT_OUTPUT_ROOT)
    }
}

impl StagingResolver {
    /// Resolver that registers dependencies under `output_root`.
    #[must_use]
    pub fn new(output_root: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
        }
    }

    /// Output root token used for staged paths.
    #[must_use]
    pub fn output_root(&self) -> &str {
        &self.output_root
    }

    /// Stage every artifact in `profile` to every destination.
    ///
    /// Returns one outcome per (artifact, destination) pair, artifacts in
    /// declaration order (required first). Each artifact is registered in
    /// `deps` regardless of how its copies went, except optional artifacts
    /// whose source is missing.
    pub fn stage(
        &self,
        profile: &PlatformProfile,
        deps: &mut RuntimeDependencies,
    ) -> Vec<StagingOutcome> {
        let span = tracing::info_span!("stage", platform = %profile.platform);
        let _guard = span.enter();

        if profile.artifact_count() == 0 {
            tracing::debug!("No artifacts declared, nothing to stage");
            return Vec::new();
        }

        let mut outcomes =
            Vec::with_capacity(profile.artifact_count() * profile.destinations.len());

        for artifact in profile.artifacts() {
            let source = artifact.source_path(&profile.source_dir);

            if source.is_file() {
                for destination in &profile.destinations {
                    outcomes.push(copy_to_destination(artifact, &source, destination));
                }
            } else if artifact.optional {
                tracing::debug!(
                    artifact = %artifact.filename,
                    source = %source.display(),
                    "Optional artifact not present, skipping"
                );
                outcomes.extend(profile.destinations.iter().map(|destination| {
                    StagingOutcome::new(artifact, destination, StagingStatus::SkippedOptionalMissing)
                }));
                continue;
            } else {
                tracing::warn!(
                    artifact = %artifact.filename,
                    source = %source.display(),
                    "Required artifact is missing"
                );
                outcomes.extend(profile.destinations.iter().map(|destination| {
                    StagingOutcome::new(artifact, destination, StagingStatus::FailedMissingRequired)
                }));
            }

            let staged = staged_path(&self.output_root, &artifact.filename);
            tracing::debug!(
                staged = %staged,
                source = %source.display(),
                kind = %artifact.kind,
                "Registered runtime dependency"
            );
            deps.register(staged, source, artifact.kind);
        }

        outcomes
    }

    /// Build outputs for `profile` without touching the filesystem.
    ///
    /// Optional artifacts are only listed when their source currently exists,
    /// matching what [`Self::stage`] would register.
    #[must_use]
    pub fn outputs(&self, profile: &PlatformProfile) -> BuildOutputs {
        let mut runtime_dependencies = RuntimeDependencies::new();
        for artifact in profile.artifacts() {
            let source = artifact.source_path(&profile.source_dir);
            if artifact.optional && !source.is_file() {
                continue;
            }
            runtime_dependencies.register(
                staged_path(&self.output_root, &artifact.filename),
                source,
                artifact.kind,
            );
        }

        BuildOutputs {
            additional_libraries: profile.link_libraries.clone(),
            delay_load_libraries: profile.delay_load.clone(),
            runtime_dependencies,
        }
    }

    /// Stage `profile` and collect everything the host consumes.
    #[must_use]
    pub fn run(&self, profile: &PlatformProfile) -> StagingReport {
        let mut runtime_dependencies = RuntimeDependencies::new();
        let outcomes = self.stage(profile, &mut runtime_dependencies);

        let report = StagingReport {
            platform: profile.platform,
            outcomes,
            outputs: BuildOutputs {
                additional_libraries: profile.link_libraries.clone(),
                delay_load_libraries: profile.delay_load.clone(),
                runtime_dependencies,
            },
        };

        tracing::info!(
            platform = %profile.platform,
            summary = %report.summary(),
            dependencies = report.outputs.runtime_dependencies.len(),
            "Staging finished"
        );

        report
    }
}

fn copy_to_destination(
    artifact: &Artifact,
    source: &Path,
    destination: &Destination,
) -> StagingOutcome {
    if let Err(e) = ensure_directory(&destination.path) {
        tracing::warn!(
            artifact = %artifact.filename,
            destination = %destination.path.display(),
            error = %e,
            "Failed to create destination directory"
        );
        return StagingOutcome::failed(
            artifact,
            destination,
            format!("failed to create {}: {e}", destination.path.display()),
        );
    }

    let target = destination.path.join(&artifact.filename);

    // Only an existing file counts as present; anything else in the way is a copy error.
    if target.is_file() {
        if destination.policy == CopyPolicy::NoClobber {
            tracing::debug!(
                target = %target.display(),
                "Destination file exists, leaving it in place"
            );
            return StagingOutcome::new(artifact, destination, StagingStatus::SkippedAlreadyPresent);
        }

        // Copying a file onto itself truncates it.
        if is_same_file(source, &target) {
            tracing::debug!(
                target = %target.display(),
                "Destination is the source file itself"
            );
            return StagingOutcome::new(artifact, destination, StagingStatus::SkippedAlreadyPresent);
        }
    }

    match std::fs::copy(source, &target) {
        Ok(bytes) => {
            tracing::info!(
                artifact = %artifact.filename,
                target = %target.display(),
                bytes,
                "Staged artifact"
            );
            StagingOutcome::new(artifact, destination, StagingStatus::Copied)
        }
        Err(e) => {
            tracing::warn!(
                artifact = %artifact.filename,
                target = %target.display(),
                error = %e,
                "Failed to copy artifact"
            );
            StagingOutcome::failed(
                artifact,
                destination,
                format!("failed to copy to {}: {e}", target.display()),
            )
        }
    }
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StagedFileKind;
    use tempfile::TempDir;

    fn profile(source: &Path, destinations: Vec<Destination>) -> PlatformProfile {
        PlatformProfile {
            source_dir: source.to_path_buf(),
            destinations,
            ..PlatformProfile::empty(TargetPlatform::Linux)
        }
    }

    #[test]
    fn test_status_failure_classification() {
        assert!(!StagingStatus::Copied.is_failure());
        assert!(!StagingStatus::SkippedAlreadyPresent.is_failure());
        assert!(!StagingStatus::SkippedOptionalMissing.is_failure());
        assert!(StagingStatus::FailedMissingRequired.is_failure());
        assert!(StagingStatus::FailedCopyError.is_failure());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        let json = serde_json::to_string(&StagingStatus::SkippedOptionalMissing).unwrap();
        assert_eq!(json, "\"skipped_optional_missing\"");
    }

    #[test]
    fn test_copy_onto_itself_does_not_truncate() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("lib.so"), b"payload").unwrap();

        let mut p = profile(tmp.path(), vec![Destination::new(tmp.path())]);
        p.required.push(Artifact::required("lib.so"));

        let mut deps = RuntimeDependencies::new();
        let outcomes = StagingResolver::default().stage(&p, &mut deps);

        assert_eq!(outcomes[0].status, StagingStatus::SkippedAlreadyPresent);
        assert_eq!(std::fs::read(tmp.path().join("lib.so")).unwrap(), b"payload");
    }

    #[test]
    fn test_copy_error_when_target_is_directory() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("lib.so"), b"payload").unwrap();
        std::fs::create_dir(dst.path().join("lib.so")).unwrap();

        let mut p = profile(src.path(), vec![Destination::new(dst.path())]);
        p.required.push(Artifact::required("lib.so"));

        let report = StagingResolver::default().run(&p);
        assert_eq!(report.outcomes[0].status, StagingStatus::FailedCopyError);
        assert!(report.outcomes[0].detail.is_some());
        assert!(!report.should_fail(Strictness::Strict));
        assert!(!report.is_clean());
    }

    #[test]
    fn test_no_clobber_does_not_skip_directory_in_the_way() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("lib.so"), b"payload").unwrap();
        std::fs::create_dir(dst.path().join("lib.so")).unwrap();

        let mut p = profile(src.path(), vec![Destination::no_clobber(dst.path())]);
        p.required.push(Artifact::required("lib.so"));

        let report = StagingResolver::default().run(&p);
        assert_eq!(report.outcomes[0].status, StagingStatus::FailedCopyError);
        assert!(!report.is_clean());
        assert!(dst.path().join("lib.so").is_dir());
    }

    #[test]
    fn test_artifact_kind_is_registered() {
        let src = TempDir::new().unwrap();
        std::fs::write(src.path().join("lib.debug"), b"symbols").unwrap();

        let mut p = profile(src.path(), Vec::new());
        let mut artifact = Artifact::optional("lib.debug");
        artifact.kind = StagedFileKind::Debug;
        p.optional.push(artifact);

        let report = StagingResolver::new("out").run(&p);
        assert!(report.outcomes.is_empty());
        let dep = report.outputs.runtime_dependencies.get("out/lib.debug").unwrap();
        assert_eq!(dep.kind, StagedFileKind::Debug);
    }

    #[test]
    fn test_summary_and_strictness() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("present.so"), b"x").unwrap();

        let mut p = profile(src.path(), vec![Destination::new(dst.path())]);
        p.required.push(Artifact::required("present.so"));
        p.required.push(Artifact::required("absent.so"));
        p.optional.push(Artifact::optional("absent.pak"));

        let report = StagingResolver::default().run(&p);
        let summary = report.summary();
        assert_eq!(summary.copied, 1);
        assert_eq!(summary.missing_required, 1);
        assert_eq!(summary.optional_missing, 1);
        assert!(report.should_fail(Strictness::Strict));
        assert!(!report.should_fail(Strictness::Lenient));
        assert_eq!(report.missing_required().count(), 1);
        assert_eq!(report.copied().count(), 1);
        assert_eq!(report.with_status(StagingStatus::Copied).count(), 1);
        assert_eq!(
            summary.to_string(),
            "1 copied, 0 already present, 1 optional missing, 1 missing required, 0 copy errors"
        );
    }

    #[test]
    fn test_outputs_matches_stage_registration() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        std::fs::write(src.path().join("a.so"), b"a").unwrap();

        let mut p = profile(src.path(), vec![Destination::new(dst.path())]);
        p.required.push(Artifact::required("a.so"));
        p.required.push(Artifact::required("missing.so"));
        p.optional.push(Artifact::optional("missing.pak"));
        p.link_libraries.push(src.path().join("a.so"));
        p.delay_load.push("a.so".to_string());

        let resolver = StagingResolver::default();
        let planned = resolver.outputs(&p);
        assert!(!dst.path().join("a.so").exists(), "outputs must not copy");

        let report = resolver.run(&p);
        assert_eq!(planned, report.outputs);
    }
}
