// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Host adapter for servers packaged as Docker Compose projects.
//!
//! Every operation shells out to `docker compose --file <path> ...` through
//! the [`CommandRunner`] seam. Start and stop are idempotent from the
//! backend's perspective (`up -d` / `down` tolerate the current state), so
//! no pre-check is performed; a nonzero exit code surfaces as
//! [`HostError::Execution`] with the code and captured stderr.

use crate::domain::host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
use crate::domain::properties::{BindProperties, PropertyMap};
use crate::domain::server::ServerStatus;
use crate::infrastructure::command::{CommandOutput, CommandRunner};
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use tracing::info;

/// Per-server properties of the Docker Compose adapter.
#[derive(Debug, Clone)]
pub struct DockerComposeHostProperties {
    pub docker_compose_file_path: String,
}

impl BindProperties for DockerComposeHostProperties {
    fn bind(props: &PropertyMap<'_>) -> Result<Self, HostError> {
        Ok(Self {
            docker_compose_file_path: props.required("DockerComposeFilePath")?.to_string(),
        })
    }
}

/// Maps the first whitespace-delimited token of `docker compose ps
/// --format "{{.Status}}"` output to a server status. Anything
/// unrecognized, including empty output, reads as stopped.
fn status_from_ps_output(output: &str) -> ServerStatus {
    match output.split_whitespace().next() {
        Some("Up") => ServerStatus::Running,
        Some("Created") => ServerStatus::Starting,
        _ => ServerStatus::Stopped,
    }
}

pub struct DockerComposeHostAdapter {
    runner: Arc<dyn CommandRunner>,
    /// Docker binary path, adapter-level static.
    binary: String,
    /// Optional `-H` daemon address, adapter-level static.
    docker_host: Option<String>,
}

impl DockerComposeHostAdapter {
    pub fn new(runner: Arc<dyn CommandRunner>, binary: String, docker_host: Option<String>) -> Self {
        Self {
            runner,
            binary,
            docker_host,
        }
    }

    async fn run_compose(
        &self,
        ctx: &HostContext,
        trailing: &[&str],
    ) -> Result<CommandOutput, HostError> {
        let props: DockerComposeHostProperties = ctx.bind()?;

        let mut args = Vec::new();
        if let Some(host) = &self.docker_host {
            args.push("-H".to_string());
            args.push(host.clone());
        }
        args.push("compose".to_string());
        args.push("--file".to_string());
        args.push(props.docker_compose_file_path.clone());
        args.extend(trailing.iter().map(|s| s.to_string()));

        let output = self.runner.run(&self.binary, &args).await?;
        if !output.success() {
            return Err(HostError::Execution {
                command: format!("{} {}", self.binary, args.join(" ")),
                code: output.exit_code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }
}

#[async_trait]
impl ServerHostAdapter for DockerComposeHostAdapter {
    async fn status(&self, ctx: &HostContext) -> Result<ServerStatus, HostError> {
        let output = self
            .run_compose(ctx, &["ps", "--format", "{{.Status}}"])
            .await?;
        Ok(status_from_ps_output(&output.stdout))
    }

    async fn start(&self, ctx: &HostContext) -> Result<(), HostError> {
        self.run_compose(ctx, &["up", "-d"]).await?;
        info!(server = %ctx.server_name, "compose project up");
        Ok(())
    }

    async fn stop(&self, ctx: &HostContext) -> Result<(), HostError> {
        self.run_compose(ctx, &["down"]).await?;
        info!(server = %ctx.server_name, "compose project down");
        Ok(())
    }

    async fn logs(&self, ctx: &HostContext) -> Result<ServerLogs, HostError> {
        let output = self.run_compose(ctx, &["logs"]).await?;
        let mut logs = ServerLogs::new();
        if !output.stdout.is_empty() {
            logs.insert("output".to_string(), Bytes::from(output.stdout));
        }
        Ok(logs)
    }
}
