// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Process execution environment capability.
//!
//! Wraps the OS-level primitives the Process adapter needs: spawn with
//! redirected stdio, enumerate running processes by resolved executable
//! path, terminate and await exit, and drain whatever stdio has been
//! captured from children spawned here. The adapter itself never touches
//! `tokio::process` or `sysinfo` directly, which keeps it testable against
//! a scripted environment.

use crate::domain::host::HostError;
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, RefreshKind, System, UpdateKind};
use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

/// What to launch and where.
#[derive(Debug, Clone)]
pub struct ProcessSpec {
    pub file_name: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
}

impl ProcessSpec {
    /// The executable path used for process matching: the file name joined
    /// with the working directory when relative, otherwise as given.
    pub fn resolved_path(&self) -> PathBuf {
        let file = Path::new(&self.file_name);
        match &self.working_directory {
            Some(dir) if file.is_relative() => Path::new(dir).join(file),
            _ => file.to_path_buf(),
        }
    }
}

/// Stdio captured so far from a spawned child.
#[derive(Debug, Clone, Default)]
pub struct CapturedOutput {
    pub stdout: Bytes,
    pub stderr: Bytes,
}

/// OS process primitives consumed by the Process adapter.
#[async_trait]
pub trait ProcessEnvironment: Send + Sync {
    /// Spawn a child with redirected stdout/stderr. The environment keeps
    /// the stdio pipes for later [`Self::captured_output`] calls but does
    /// not own the child's lifetime beyond the spawn itself.
    async fn spawn(&self, spec: &ProcessSpec) -> Result<(), HostError>;

    /// Pids of running processes whose executable path exactly equals
    /// `path`.
    async fn find_by_path(&self, path: &Path) -> Result<Vec<u32>, HostError>;

    /// Forcibly terminate the process and await its exit.
    async fn terminate(&self, pid: u32) -> Result<(), HostError>;

    /// Output captured so far from children this environment spawned at
    /// `path`. Empty when nothing was spawned here.
    async fn captured_output(&self, path: &Path) -> Result<CapturedOutput, HostError>;
}

#[derive(Clone, Default)]
struct OutputBuffers {
    stdout: Arc<Mutex<Vec<u8>>>,
    stderr: Arc<Mutex<Vec<u8>>>,
}

/// [`ProcessEnvironment`] backed by `tokio::process` and `sysinfo`.
pub struct SystemProcessEnvironment {
    captures: Mutex<HashMap<PathBuf, OutputBuffers>>,
}

impl SystemProcessEnvironment {
    pub fn new() -> Self {
        Self {
            captures: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for SystemProcessEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy a child pipe into a shared buffer chunk by chunk, so partial output
/// is readable while the child still runs.
fn drain_pipe<R>(mut pipe: R, buffer: Arc<Mutex<Vec<u8>>>)
where
    R: AsyncReadExt + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buffer.lock().extend_from_slice(&chunk[..n]),
                Err(err) => {
                    warn!(error = %err, "stopped draining child pipe");
                    break;
                }
            }
        }
    });
}

#[async_trait]
impl ProcessEnvironment for SystemProcessEnvironment {
    async fn spawn(&self, spec: &ProcessSpec) -> Result<(), HostError> {
        let mut command = tokio::process::Command::new(&spec.file_name);
        if let Some(args) = &spec.arguments {
            command.args(args.split_whitespace());
        }
        if let Some(dir) = &spec.working_directory {
            command.current_dir(dir);
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn()?;
        debug!(file = %spec.file_name, pid = ?child.id(), "spawned server process");

        let buffers = OutputBuffers::default();
        if let Some(pipe) = child.stdout.take() {
            drain_pipe(pipe, buffers.stdout.clone());
        }
        if let Some(pipe) = child.stderr.take() {
            drain_pipe(pipe, buffers.stderr.clone());
        }
        self.captures
            .lock()
            .insert(spec.resolved_path(), buffers);

        // Reap the child when it exits; its lifetime is otherwise its own.
        tokio::spawn(async move {
            let _ = child.wait().await;
        });

        Ok(())
    }

    async fn find_by_path(&self, path: &Path) -> Result<Vec<u32>, HostError> {
        let path = path.to_path_buf();
        let pids = tokio::task::spawn_blocking(move || {
            let refresh = RefreshKind::nothing().with_processes(
                ProcessRefreshKind::nothing().with_exe(UpdateKind::Always),
            );
            let system = System::new_with_specifics(refresh);
            system
                .processes()
                .iter()
                .filter(|(_, process)| process.exe() == Some(path.as_path()))
                .map(|(pid, _)| pid.as_u32())
                .collect::<Vec<_>>()
        })
        .await
        .map_err(|err| HostError::Backend(format!("process enumeration failed: {err}")))?;
        Ok(pids)
    }

    async fn terminate(&self, pid: u32) -> Result<(), HostError> {
        tokio::task::spawn_blocking(move || {
            let mut system = System::new();
            system.refresh_processes(
                ProcessesToUpdate::Some(&[sysinfo::Pid::from_u32(pid)]),
                true,
            );
            match system.process(sysinfo::Pid::from_u32(pid)) {
                Some(process) => {
                    process.kill();
                    process.wait();
                    Ok(())
                }
                None => Err(HostError::Backend(format!("process {pid} not found"))),
            }
        })
        .await
        .map_err(|err| HostError::Backend(format!("process termination failed: {err}")))?
    }

    async fn captured_output(&self, path: &Path) -> Result<CapturedOutput, HostError> {
        let buffers = self.captures.lock().get(path).cloned();
        Ok(match buffers {
            Some(buffers) => CapturedOutput {
                stdout: Bytes::from(buffers.stdout.lock().clone()),
                stderr: Bytes::from(buffers.stderr.lock().clone()),
            },
            None => CapturedOutput::default(),
        })
    }
}
