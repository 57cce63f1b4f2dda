//! Platform-aware staging of prebuilt native libraries.
//!
//! Given a target platform and a declarative manifest of required and
//! optional artifacts, binstage copies each artifact into the directories a
//! host build expects (a plugin's binary folder, the project's binary folder)
//! and records it as a runtime dependency for any later packaging step.
//!
//! # Example
//!
//! ```no_run
//! use binstage_core::{HostContext, Manifest, ProfileTable, StagingResolver, Strictness, TargetPlatform};
//!
//! let manifest = Manifest::preset("ultralight")?;
//! let ctx = HostContext::new(
//!     TargetPlatform::Win64,
//!     "/work/Game/Plugins/UltralightUE/Source/ThirdParty/UltralightUELibrary",
//!     "/work/Game",
//! );
//! let table = ProfileTable::resolve(&manifest, &ctx)?;
//!
//! let resolver = StagingResolver::new(table.output_root());
//! let report = resolver.run(&table.profile_for(ctx.platform));
//! for outcome in &report.outcomes {
//!     println!("{}: {} -> {}", outcome.status, outcome.artifact, outcome.destination.display());
//! }
//! if report.should_fail(Strictness::Strict) {
//!     std::process::exit(1);
//! }
//! # Ok::<(), binstage_core::Error>(())
//! ```

pub mod error;
pub mod manifest;
pub mod outputs;
pub mod paths;
pub mod platform;
pub mod profile;
pub mod staging;

pub use error::{Error, Result};
pub use manifest::{
    DEFAULT_OUTPUT_ROOT, DEFAULT_PRESET, MANIFEST_NAME, MANIFEST_VERSION, Manifest, preset_names,
};
pub use outputs::{BuildOutputs, RuntimeDependencies, RuntimeDependency, StagedFileKind};
pub use paths::DEFAULT_PROJECT_ROOT_HOPS;
pub use platform::TargetPlatform;
pub use profile::{Artifact, CopyPolicy, Destination, HostContext, PlatformProfile, ProfileTable};
pub use staging::{
    StagingOutcome, StagingReport, StagingResolver, StagingStatus, StagingSummary, Strictness,
};
