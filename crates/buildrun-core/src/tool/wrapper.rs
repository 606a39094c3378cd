//! Wrapper script lookup
//!
//! A project pins its build tool version through a bundled wrapper script
//! (`mvnw`, `gradlew`, ...). The lookup is deterministic: candidate names are
//! tried in the order the profile declares them and the first existing file wins.

use crate::error::{BuildError, Result};
use crate::tool::profile::{Os, ToolProfile};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Find the wrapper for the current OS directly under `project_root`
pub fn resolve(project_root: &Path, profile: &ToolProfile) -> Result<PathBuf> {
    resolve_for(project_root, profile, Os::current())
}

/// Find the wrapper for `os` directly under `project_root`
pub fn resolve_for(project_root: &Path, profile: &ToolProfile, os: Os) -> Result<PathBuf> {
    find_wrapper(project_root, profile, os).ok_or_else(|| BuildError::WrapperNotFound {
        tool: profile.tool,
        root: project_root.to_path_buf(),
    })
}

/// Find the executable the CLI should run for a project.
///
/// Checks the project root and then each ancestor directory for a wrapper,
/// then falls back to the plain tool binary on `PATH`.
pub fn locate_executable(project_root: &Path, profile: &ToolProfile) -> Result<PathBuf> {
    locate_executable_in(
        project_root,
        profile,
        Os::current(),
        std::env::var_os("PATH").as_deref(),
    )
}

pub fn locate_executable_in(
    project_root: &Path,
    profile: &ToolProfile,
    os: Os,
    search_path: Option<&OsStr>,
) -> Result<PathBuf> {
    for dir in project_root.ancestors() {
        if let Some(wrapper) = find_wrapper(dir, profile, os) {
            debug!(wrapper = %wrapper.display(), "using build tool wrapper");
            return Ok(wrapper);
        }
    }

    if let Some(binary) = search_path.and_then(|paths| find_on_path(profile, os, paths)) {
        debug!(executable = %binary.display(), "no wrapper found, using build tool from PATH");
        return Ok(binary);
    }

    Err(BuildError::WrapperNotFound {
        tool: profile.tool,
        root: project_root.to_path_buf(),
    })
}

fn find_wrapper(dir: &Path, profile: &ToolProfile, os: Os) -> Option<PathBuf> {
    profile
        .wrapper_names(os)
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

fn find_on_path(profile: &ToolProfile, os: Os, search_path: &OsStr) -> Option<PathBuf> {
    let names: Vec<String> = match os {
        Os::Windows => vec![
            format!("{}.cmd", profile.executable),
            format!("{}.bat", profile.executable),
            format!("{}.exe", profile.executable),
        ],
        Os::Other => vec![profile.executable.to_string()],
    };

    std::env::split_paths(search_path).find_map(|dir| {
        names
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    })
}
