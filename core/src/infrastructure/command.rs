// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! External command execution capability.
//!
//! The Docker Compose adapter drives the `docker` CLI through this seam;
//! tests substitute a scripted runner.

use crate::domain::host::HostError;
use async_trait::async_trait;
use std::process::Stdio;
use tracing::debug;

/// Captured result of one external command run.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Run a command line to completion, capturing stdout/stderr text and the
/// exit code. Spawn failures surface as [`HostError::Io`]; a nonzero exit
/// is not an error at this layer (callers classify it).
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, HostError>;
}

/// [`CommandRunner`] over `tokio::process`.
pub struct TokioCommandRunner;

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, program: &str, args: &[String]) -> Result<CommandOutput, HostError> {
        debug!(program, ?args, "running external command");
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            // A missing code means the child died to a signal; -1 keeps the
            // "nonzero is a failure" classification intact.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}
