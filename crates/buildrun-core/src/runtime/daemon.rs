//! Build daemon lifecycle
//!
//! One `DaemonHandle` exists per project root. Each handle sits behind its own
//! async mutex, so start and stop requests for a root are serialized and a
//! second start observes the first one's result instead of spawning again.
//!
//! Separate `buildrun` processes coordinate through a marker file under the
//! project root. Whoever creates the marker first spawns the daemon; everyone
//! else sees it as running.

use crate::command::assemble::{assemble, GeneratedCommand};
use crate::error::{BuildError, Result};
use crate::runtime::invoker::Invoker;
use crate::tool::profile::ToolProfile;
use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard as AsyncMutexGuard};
use tracing::{debug, info, warn};

/// Marker recording a running daemon, relative to the project root
pub const DAEMON_MARKER: &str = ".gradle/buildrun-daemon";

/// Markers older than Gradle's default daemon idle timeout are ignored
const MARKER_MAX_AGE: Duration = Duration::from_secs(3 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
    Stopped,
    Starting,
    Running,
}

/// Daemon bookkeeping for one project root
#[derive(Debug)]
pub struct DaemonHandle {
    profile: &'static ToolProfile,
    project_root: PathBuf,
    executable: PathBuf,
    marker: PathBuf,
    state: DaemonState,
    /// Command that brought the daemon up, kept while it runs
    started_with: Option<GeneratedCommand>,
}

impl DaemonHandle {
    fn new(profile: &'static ToolProfile, project_root: &Path, executable: &Path) -> Self {
        Self {
            profile,
            project_root: project_root.to_path_buf(),
            executable: executable.to_path_buf(),
            marker: project_root.join(DAEMON_MARKER),
            state: DaemonState::Stopped,
            started_with: None,
        }
    }

    pub fn state(&self) -> DaemonState {
        self.state
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn profile(&self) -> &'static ToolProfile {
        self.profile
    }

    pub fn started_with(&self) -> Option<&GeneratedCommand> {
        self.started_with.as_ref()
    }
}

pub type SharedHandle = Arc<AsyncMutex<DaemonHandle>>;

/// A start in flight. Dropping it before `finish` puts the handle back to
/// `Stopped` and gives up the marker, whether the start failed or its future
/// was cancelled.
struct PendingStart<'a> {
    daemon: AsyncMutexGuard<'a, DaemonHandle>,
    done: bool,
}

impl<'a> PendingStart<'a> {
    fn new(mut daemon: AsyncMutexGuard<'a, DaemonHandle>) -> Self {
        daemon.state = DaemonState::Starting;
        Self {
            daemon,
            done: false,
        }
    }

    fn finish(mut self, command: GeneratedCommand) -> DaemonState {
        self.daemon.state = DaemonState::Running;
        self.daemon.started_with = Some(command);
        self.done = true;
        DaemonState::Running
    }
}

impl Drop for PendingStart<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.daemon.state = DaemonState::Stopped;
            release_marker(&self.daemon.marker);
        }
    }
}

/// Starts, stops and reuses build daemons through an `Invoker`
pub struct DaemonController<I: Invoker> {
    invoker: I,
    overrides: Vec<String>,
    handles: Mutex<HashMap<PathBuf, SharedHandle>>,
}

impl<I: Invoker> DaemonController<I> {
    pub fn new(invoker: I) -> Self {
        Self {
            invoker,
            overrides: Vec::new(),
            handles: Mutex::new(HashMap::new()),
        }
    }

    /// Environment overrides appended to daemon start and stop commands
    pub fn with_overrides(mut self, overrides: Vec<String>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn invoker(&self) -> &I {
        &self.invoker
    }

    /// The handle for `project_root`, created on first use
    pub fn handle(
        &self,
        project_root: &Path,
        profile: &'static ToolProfile,
        executable: &Path,
    ) -> Result<SharedHandle> {
        if !profile.supports_daemon {
            return Err(BuildError::DaemonUnsupported { tool: profile.tool });
        }

        let mut handles = self.handles.lock().unwrap_or_else(PoisonError::into_inner);
        let handle = handles
            .entry(project_root.to_path_buf())
            .or_insert_with(|| {
                Arc::new(AsyncMutex::new(DaemonHandle::new(
                    profile,
                    project_root,
                    executable,
                )))
            })
            .clone();
        Ok(handle)
    }

    /// Start the daemon unless it is already running
    pub async fn start(&self, handle: &AsyncMutex<DaemonHandle>) -> Result<DaemonState> {
        let mut daemon = handle.lock().await;
        if daemon.state == DaemonState::Running {
            debug!(root = %daemon.project_root.display(), "daemon already running");
            return Ok(DaemonState::Running);
        }

        let claimed = claim_marker(&daemon.marker).map_err(|e| BuildError::DaemonMarker {
            path: daemon.marker.clone(),
            message: e.to_string(),
        })?;
        if !claimed {
            debug!(root = %daemon.project_root.display(), "daemon started by another invocation");
            daemon.state = DaemonState::Running;
            return Ok(DaemonState::Running);
        }

        let command = self.command(&daemon, daemon.profile.daemon_start());
        info!(command = %command.preview(), "starting build daemon");

        let pending = PendingStart::new(daemon);
        let output = self
            .invoker
            .invoke(&command, &pending.daemon.project_root)
            .await?;

        if !output.success() {
            return Err(BuildError::DaemonStartFailed {
                root: pending.daemon.project_root.clone(),
                code: output.exit_code,
            });
        }

        Ok(pending.finish(command))
    }

    /// Stop the daemon; stopping a stopped daemon succeeds without doing anything
    pub async fn stop(&self, handle: &AsyncMutex<DaemonHandle>) -> Result<DaemonState> {
        let mut daemon = handle.lock().await;
        if daemon.state == DaemonState::Stopped && !daemon.marker.exists() {
            debug!(root = %daemon.project_root.display(), "daemon already stopped");
            return Ok(DaemonState::Stopped);
        }

        let command = self.command(&daemon, daemon.profile.daemon_stop());
        info!(command = %command.preview(), "stopping build daemon");

        let output = self.invoker.invoke(&command, &daemon.project_root).await?;
        if !output.success() {
            return Err(BuildError::Invocation(format!(
                "daemon stop exited with code {}",
                output.exit_code
            )));
        }

        daemon.state = DaemonState::Stopped;
        daemon.started_with = None;
        release_marker(&daemon.marker);
        Ok(DaemonState::Stopped)
    }

    /// Record that the daemon process went away on its own
    pub async fn mark_exited(&self, handle: &AsyncMutex<DaemonHandle>) {
        let mut daemon = handle.lock().await;
        if daemon.state != DaemonState::Stopped {
            debug!(root = %daemon.project_root.display(), "daemon exited");
        }
        daemon.state = DaemonState::Stopped;
        daemon.started_with = None;
        release_marker(&daemon.marker);
    }

    pub async fn state(&self, handle: &AsyncMutex<DaemonHandle>) -> DaemonState {
        handle.lock().await.state
    }

    fn command(&self, daemon: &DaemonHandle, action: &str) -> GeneratedCommand {
        let mut tokens = vec![action.to_string()];
        tokens.extend(self.overrides.iter().cloned());
        assemble(&daemon.executable, tokens)
    }
}

/// Create the marker (first writer wins). Returns false when another
/// invocation already holds a live one.
fn claim_marker(path: &Path) -> std::io::Result<bool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    for _ in 0..2 {
        match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(mut file) => {
                writeln!(file, "{}", std::process::id())?;
                return Ok(true);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                if !marker_is_stale(path) {
                    return Ok(false);
                }
                debug!(marker = %path.display(), "removing stale daemon marker");
                release_marker(path);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(false)
}

fn marker_is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > MARKER_MAX_AGE)
}

fn release_marker(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!(marker = %path.display(), error = %e, "failed to remove daemon marker");
        }
    }
}
