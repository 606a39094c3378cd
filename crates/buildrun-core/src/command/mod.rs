//! From developer intent to build tool command line
//!
//! This module provides:
//! - `BuildIntent` and the per-kind option table
//! - Translation of an intent into tool-specific tokens
//! - Command assembly, preview and dry-run rendering

pub mod assemble;
pub mod intent;
pub mod translate;

pub use assemble::{assemble, render_dry_run, GeneratedCommand};
pub use intent::{BuildIntent, Flag, FlagValue, IntentKind, ResolvedOptions};
pub use translate::translate;

use crate::error::Result;
use crate::tool::profile::ToolProfile;
use std::path::Path;

/// Translate `intent` for `profile` and assemble it behind `executable`
pub fn compile(
    intent: &BuildIntent,
    profile: &ToolProfile,
    executable: &Path,
) -> Result<GeneratedCommand> {
    let tokens = translate(intent, profile)?;
    Ok(assemble(executable, tokens))
}
