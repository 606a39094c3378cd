//! Command execution and build daemon management
//!
//! This module provides:
//! - The `Invoker` seam and a child-process implementation
//! - Build daemon lifecycle control per project root

pub mod daemon;
pub mod invoker;

pub use daemon::{DaemonController, DaemonHandle, DaemonState, SharedHandle};
pub use invoker::{InvocationOutput, InvokeError, Invoker, ProcessInvoker};
