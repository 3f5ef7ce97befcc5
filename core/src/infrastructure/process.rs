// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Host adapter for servers running as bare OS processes.
//!
//! Process identity is recomputed from the OS on every call by matching the
//! resolved executable path; no process handle is retained between
//! operations. Start and stop are therefore a check-then-act pair with no
//! lock in between, which is an accepted simplification for a
//! single-operator control surface, not a concurrency guarantee. When more
//! than one process matches the path there is no safe target to act on and
//! the adapter reports [`HostError::AmbiguousState`] instead of guessing.

use crate::domain::host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
use crate::domain::properties::{BindProperties, PropertyMap};
use crate::domain::server::ServerStatus;
use crate::infrastructure::process_env::{ProcessEnvironment, ProcessSpec};
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Per-server properties of the Process adapter.
#[derive(Debug, Clone)]
pub struct ProcessHostProperties {
    pub file_name: String,
    pub arguments: Option<String>,
    pub working_directory: Option<String>,
}

impl BindProperties for ProcessHostProperties {
    fn bind(props: &PropertyMap<'_>) -> Result<Self, HostError> {
        Ok(Self {
            file_name: props.required("FileName")?.to_string(),
            arguments: props.optional("Arguments").map(str::to_string),
            working_directory: props.optional("WorkingDirectory").map(str::to_string),
        })
    }
}

impl ProcessHostProperties {
    fn spec(&self) -> ProcessSpec {
        ProcessSpec {
            file_name: self.file_name.clone(),
            arguments: self.arguments.clone(),
            working_directory: self.working_directory.clone(),
        }
    }
}

pub struct ProcessHostAdapter {
    env: Arc<dyn ProcessEnvironment>,
}

impl ProcessHostAdapter {
    pub fn new(env: Arc<dyn ProcessEnvironment>) -> Self {
        Self { env }
    }

    /// The single matching pid, `None` when stopped, an error when the
    /// match is ambiguous.
    async fn single_match(&self, path: &PathBuf) -> Result<Option<u32>, HostError> {
        let pids = self.env.find_by_path(path).await?;
        match pids.as_slice() {
            [] => Ok(None),
            [pid] => Ok(Some(*pid)),
            _ => Err(HostError::AmbiguousState {
                path: path.display().to_string(),
            }),
        }
    }
}

#[async_trait]
impl ServerHostAdapter for ProcessHostAdapter {
    async fn status(&self, ctx: &HostContext) -> Result<ServerStatus, HostError> {
        let props: ProcessHostProperties = ctx.bind()?;
        let path = props.spec().resolved_path();
        Ok(match self.single_match(&path).await? {
            Some(_) => ServerStatus::Running,
            None => ServerStatus::Stopped,
        })
    }

    async fn start(&self, ctx: &HostContext) -> Result<(), HostError> {
        if self.status(ctx).await? == ServerStatus::Running {
            return Err(HostError::IllegalState(
                "server is already running".to_string(),
            ));
        }

        let props: ProcessHostProperties = ctx.bind()?;
        self.env.spawn(&props.spec()).await?;
        info!(server = %ctx.server_name, file = %props.file_name, "started server process");
        Ok(())
    }

    async fn stop(&self, ctx: &HostContext) -> Result<(), HostError> {
        if self.status(ctx).await? == ServerStatus::Stopped {
            return Err(HostError::IllegalState(
                "server is already stopped".to_string(),
            ));
        }

        let props: ProcessHostProperties = ctx.bind()?;
        let path = props.spec().resolved_path();
        if let Some(pid) = self.single_match(&path).await? {
            self.env.terminate(pid).await?;
            info!(server = %ctx.server_name, pid, "terminated server process");
        }
        Ok(())
    }

    async fn logs(&self, ctx: &HostContext) -> Result<ServerLogs, HostError> {
        let props: ProcessHostProperties = ctx.bind()?;
        let captured = self
            .env
            .captured_output(&props.spec().resolved_path())
            .await?;

        let mut logs = ServerLogs::new();
        if !captured.stdout.is_empty() {
            logs.insert("output".to_string(), captured.stdout);
        }
        if !captured.stderr.is_empty() {
            logs.insert("error".to_string(), captured.stderr);
        }
        Ok(logs)
    }
}
