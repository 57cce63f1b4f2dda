//! Path helpers for locating artifacts and staging destinations.
//!
//! Everything here is pure except [`ensure_directory`].

use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Parent hops from a third-party module directory to the host project root.
///
/// Matches a module nested at
/// `<project>/Plugins/<plugin>/Source/ThirdParty/<module>`.
pub const DEFAULT_PROJECT_ROOT_HOPS: usize = 5;

/// Walk `hops` parent directories up from `module_root`.
///
/// Prefer passing an explicit project root; this exists for layouts where the
/// nesting depth is fixed and known.
///
/// # Errors
///
/// Returns [`Error::ProjectRoot`] if the walk runs past the top of the path.
pub fn project_root_from_hops(module_root: &Path, hops: usize) -> Result<PathBuf> {
    let mut current = module_root;
    for _ in 0..hops {
        current = current
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .ok_or_else(|| Error::ProjectRoot {
                module_root: module_root.to_path_buf(),
                hops,
            })?;
    }
    Ok(current.to_path_buf())
}

/// Resolve `path` against `base` unless it is already absolute.
#[must_use]
pub fn resolve_under(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Caller-facing staged path for an artifact: `<output-root>/<filename>`.
///
/// Always uses `/`, since the host build system expands the output root token
/// itself.
#[must_use]
pub fn staged_path(output_root: &str, filename: &str) -> String {
    let root = output_root.trim_end_matches(['/', '\\']);
    if root.is_empty() {
        filename.to_string()
    } else {
        format!("{root}/{filename}")
    }
}

/// Check that an artifact name is a plain filename.
///
/// # Errors
///
/// Returns the reason the name was rejected.
pub fn validate_filename(name: &str) -> std::result::Result<(), &'static str> {
    if name.trim().is_empty() {
        return Err("artifact name cannot be empty");
    }
    if name.contains('/') || name.contains('\\') {
        return Err("artifact name cannot contain path separators");
    }
    if name == "." || name == ".." {
        return Err("artifact name cannot be a directory reference");
    }
    Ok(())
}

/// Make sure `dir` exists as a directory, creating it and its parents if needed.
///
/// # Errors
///
/// Returns the underlying I/O error if creation fails, including when a
/// non-directory is in the way.
pub fn ensure_directory(dir: &Path) -> std::io::Result<()> {
    if dir.is_dir() {
        return Ok(());
    }
    tracing::debug!(dir = %dir.display(), "Creating destination directory");
    std::fs::create_dir_all(dir)
}
