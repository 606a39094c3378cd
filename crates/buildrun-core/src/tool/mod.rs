//! Build tool profiles and wrapper lookup
//!
//! This module provides:
//! - Static profiles for the supported build tools (Maven, Gradle)
//! - Build tool detection from project files
//! - Wrapper script resolution

pub mod profile;
pub mod wrapper;

pub use profile::{BuildTool, Lifecycle, Os, ToolProfile};
pub use wrapper::{locate_executable, resolve, resolve_for};
