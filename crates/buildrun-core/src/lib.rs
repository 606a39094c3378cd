//! Buildrun Core - Build tool invocation layer behind the `buildrun` CLI
//!
//! This library turns a small set of developer intents (create, build, dev,
//! test) into the exact command line of either Maven or Gradle, and manages
//! the Gradle build daemon.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! - **Layer 1: Static data** - `ToolProfile` per build tool and the option table
//! - **Layer 2: Pure compilation** - `BuildIntent` -> tokens -> `GeneratedCommand`
//! - **Layer 3: Execution** - the `Invoker` seam, `DaemonController`, project generators
//!
//! # Example Usage
//!
//! ```ignore
//! use buildrun_core::{command, tool, BuildIntent, IntentKind, ToolProfile};
//!
//! let intent = BuildIntent::parse(IntentKind::Build, &["--clean", "--no-tests"])?;
//! let wrapper = tool::resolve(project_root, &ToolProfile::GRADLE)?;
//! let generated = command::compile(&intent, &ToolProfile::GRADLE, &wrapper)?;
//! println!("{}", generated.preview());
//! ```

pub mod command;
pub mod create;
pub mod error;
pub mod runtime;
pub mod settings;
pub mod tool;

// Re-export main types for convenience
pub use command::{
    assemble, compile, render_dry_run, translate, BuildIntent, Flag, FlagValue, GeneratedCommand,
    IntentKind,
};
pub use create::{CommandGenerator, Coordinates, CreatePlan, ProjectGenerator};
pub use error::{BuildError, Result};
pub use runtime::{DaemonController, DaemonState, InvocationOutput, Invoker, ProcessInvoker};
pub use settings::Settings;
pub use tool::{BuildTool, Os, ToolProfile};
