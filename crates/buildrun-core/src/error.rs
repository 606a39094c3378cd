//! Error types for buildrun-core

use crate::command::intent::IntentKind;
use crate::tool::profile::BuildTool;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while compiling an intent into an invocation or while
/// driving a build daemon.
#[derive(Debug, Error)]
pub enum BuildError {
    // === Resolution ===
    #[error("no {tool} wrapper or executable found for {}", root.display())]
    WrapperNotFound { tool: BuildTool, root: PathBuf },

    // === Option table ===
    #[error("unknown option '--{flag}' for '{kind}'")]
    UnknownFlag { kind: IntentKind, flag: String },

    #[error("options '--{first}' and '--{second}' cannot be combined for '{kind}'")]
    MutuallyExclusiveFlags {
        kind: IntentKind,
        first: String,
        second: String,
    },

    #[error("invalid value '{value}' for '--{flag}': {reason}")]
    InvalidFlagValue {
        flag: String,
        value: String,
        reason: String,
    },

    #[error("option '--{flag}' requires a value")]
    MissingFlagValue { flag: String },

    #[error("'{kind}' is not a build tool invocation")]
    NotTranslatable { kind: IntentKind },

    // === Daemon ===
    #[error("{tool} does not support a build daemon")]
    DaemonUnsupported { tool: BuildTool },

    #[error("build daemon for {} failed to start (exit code {code})", root.display())]
    DaemonStartFailed { root: PathBuf, code: i32 },

    #[error("failed to record daemon state in {}: {message}", path.display())]
    DaemonMarker { path: PathBuf, message: String },

    // === Execution ===
    #[error("invocation aborted")]
    Aborted,

    #[error("invocation failed: {0}")]
    Invocation(String),

    // === Settings ===
    #[error("failed to load settings from {}: {message}", path.display())]
    Settings { path: PathBuf, message: String },
}

pub type Result<T> = std::result::Result<T, BuildError>;
