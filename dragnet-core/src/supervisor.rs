//! Producer process lifecycle.
//!
//! The producer is an opaque external binary that appends to the output
//! file; it may spawn its compute-heavy work as a separate process under a
//! known name. Termination is therefore two-stage: graceful stop of the
//! direct child with a bounded wait and a forced kill on expiry, then a
//! best-effort by-name kill of the worker. A missing worker is not an
//! error; only other termination failures are reported.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::{Child, Command};
use tracing::{info, warn};

use crate::config::Config;
use crate::error::{DragnetError, Result};
use crate::tailer::ProducerControl;

/// One producer process for one cycle, plus what is needed to take the
/// whole tree down. Created by [`ProducerSupervisor::spawn`].
#[derive(Debug)]
pub struct ProducerHandle {
    child: Child,
    worker_name: Option<String>,
    grace: Duration,
    terminated: bool,
}

#[derive(Debug, Clone)]
pub struct ProducerSupervisor {
    command: String,
    args: Vec<String>,
    worker_name: Option<String>,
    grace: Duration,
}

impl ProducerSupervisor {
    pub fn new(config: &Config) -> Self {
        Self {
            command: config.producer_command.clone(),
            args: config.producer_args.clone(),
            worker_name: config.worker_name.clone(),
            grace: config.terminate_grace,
        }
    }

    /// Start one producer for one cycle. The producer writes its own output
    /// file; its console streams are discarded.
    pub fn spawn(&self) -> Result<ProducerHandle> {
        let child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                DragnetError::Process(format!("failed to start {}: {}", self.command, e))
            })?;

        info!(command = %self.command, pid = child.id(), "producer started");
        Ok(ProducerHandle {
            child,
            worker_name: self.worker_name.clone(),
            grace: self.grace,
            terminated: false,
        })
    }

    pub async fn terminate(&self, handle: &mut ProducerHandle) -> Result<()> {
        handle.terminate().await
    }
}

impl ProducerHandle {
    /// Stop the producer and its worker. Idempotent; safe to call again
    /// after the tailer already requested termination at the size cap.
    pub async fn terminate(&mut self) -> Result<()> {
        if self.terminated {
            return Ok(());
        }
        self.terminated = true;

        // The worker is killed by name regardless of how the direct child
        // went down; it is a separate process and may outlive its parent.
        let stopped = self.stop_child().await;
        if let Some(name) = self.worker_name.clone() {
            kill_by_name(&name).await;
        }
        stopped
    }

    async fn stop_child(&mut self) -> Result<()> {
        // Already exited on its own?
        if let Ok(Some(status)) = self.child.try_wait() {
            info!(%status, "producer already exited");
            return Ok(());
        }

        request_graceful_stop(&mut self.child);

        match tokio::time::timeout(self.grace, self.child.wait()).await {
            Ok(Ok(status)) => {
                info!(%status, "producer exited gracefully");
                Ok(())
            }
            Ok(Err(err)) => Err(DragnetError::Process(format!(
                "wait for producer failed: {err}"
            ))),
            Err(_) => {
                warn!(grace = ?self.grace, "producer ignored graceful stop; killing");
                self.child
                    .kill()
                    .await
                    .map_err(|e| DragnetError::Process(format!("kill failed: {e}")))?;
                Ok(())
            }
        }
    }
}

#[async_trait]
impl ProducerControl for ProducerHandle {
    async fn terminate(&mut self) -> Result<()> {
        ProducerHandle::terminate(self).await
    }
}

#[cfg(unix)]
fn request_graceful_stop(child: &mut Child) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        if let Err(err) = kill(Pid::from_raw(pid as i32), Signal::SIGTERM) {
            warn!(error = %err, pid, "SIGTERM delivery failed");
        }
    }
}

#[cfg(not(unix))]
fn request_graceful_stop(child: &mut Child) {
    // No portable graceful signal; fall straight through to the kill path.
    if let Err(err) = child.start_kill() {
        warn!(error = %err, "start_kill failed");
    }
}

/// Force-kill every process running under `name`, routed through the
/// platform's own tool in the manner of a shell one-liner. Absence of such
/// a process is the common case after a clean exit and is not an error.
pub async fn kill_by_name(name: &str) {
    #[cfg(windows)]
    let result = Command::new("taskkill")
        .args(["/F", "/IM", name])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    #[cfg(not(windows))]
    let result = Command::new("pkill")
        .args(["-x", name])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    match result {
        Ok(status) if status.success() => info!(name, "worker process terminated"),
        Ok(_) => info!(name, "no worker process was running"),
        Err(err) => warn!(error = %err, name, "worker kill could not run"),
    }
}
