// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! The host adapter contract.
//!
//! A host adapter controls the lifecycle of one kind of externally hosted
//! workload (bare process, Docker Compose project, Kubernetes workload)
//! behind a single capability set: status query, start, stop, log
//! retrieval, plus a shared wait-until-status poll. Adapters are long-lived
//! and hold only adapter-level static options; everything server-specific
//! arrives through a fresh [`HostContext`] on every call.

use crate::domain::properties::{BindProperties, PropertyMap};
use crate::domain::server::ServerStatus;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Interval between status probes inside [`ServerHostAdapter::wait_for_status`].
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Named log payloads returned by [`ServerHostAdapter::logs`].
///
/// Process and Docker Compose adapters use the names `"output"` and
/// `"error"`; the Kubernetes adapter uses one entry per container.
pub type ServerLogs = HashMap<String, Bytes>;

/// Errors surfaced by host adapters.
///
/// Backend failures pass through unmodified apart from this classification;
/// adapters never retry or silently recover.
#[derive(Debug, Error)]
pub enum HostError {
    /// A per-server property failed to bind against the adapter's schema.
    /// Raised before any backend call.
    #[error("host property `{field}` is invalid: {reason}")]
    Configuration { field: String, reason: String },

    /// The requested Kubernetes resource kind is outside the supported set.
    #[error("workload kind `{0}` is not supported (expected Deployment or StatefulSet)")]
    UnsupportedKind(String),

    /// An external command exited with a nonzero code.
    #[error("`{command}` exited with code {code}: {stderr}")]
    Execution {
        command: String,
        code: i32,
        stderr: String,
    },

    /// The operation is not valid for the server's current state
    /// (e.g. starting a process that already runs).
    #[error("{0}")]
    IllegalState(String),

    /// More than one OS process matches the resolved executable path, so no
    /// single target can safely be acted upon.
    #[error("multiple processes share the executable path `{path}`")]
    AmbiguousState { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A backend API call failed (e.g. the Kubernetes control plane).
    #[error("backend error: {0}")]
    Backend(String),
}

impl HostError {
    /// A required property was absent from the raw map.
    pub fn missing_property(field: &str) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: "required property is missing".to_string(),
        }
    }

    /// A property was present but malformed.
    pub fn invalid_property(field: &str, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

/// Per-invocation binding of a server to its governing adapter.
///
/// Captured once per orchestration call and never persisted: two servers may
/// share an adapter key while carrying different property values, so the raw
/// map is rebound against the adapter's typed schema on every operation.
#[derive(Debug, Clone)]
pub struct HostContext {
    pub server_name: String,
    pub adapter_name: String,
    pub properties: HashMap<String, String>,
}

impl HostContext {
    pub fn new(
        server_name: impl Into<String>,
        adapter_name: impl Into<String>,
        properties: HashMap<String, String>,
    ) -> Self {
        Self {
            server_name: server_name.into(),
            adapter_name: adapter_name.into(),
            properties,
        }
    }

    /// Bind the raw property map to the adapter's typed property structure,
    /// failing fast with a [`HostError::Configuration`] naming the offending
    /// field before any backend call is made.
    pub fn bind<T: BindProperties>(&self) -> Result<T, HostError> {
        T::bind(&PropertyMap::new(&self.properties))
    }
}

/// Backend-specific lifecycle control behind one polymorphic contract.
#[async_trait]
pub trait ServerHostAdapter: Send + Sync {
    /// Recompute the server's live status from the backend.
    async fn status(&self, ctx: &HostContext) -> Result<ServerStatus, HostError>;

    /// Start the server. Single attempt, non-transactional: a failure midway
    /// leaves the backend in whatever state the partial action produced.
    async fn start(&self, ctx: &HostContext) -> Result<(), HostError>;

    /// Stop the server. Same single-attempt semantics as [`Self::start`].
    async fn stop(&self, ctx: &HostContext) -> Result<(), HostError>;

    /// Retrieve available logs as named byte payloads. Empty payloads are
    /// omitted; an empty map is a valid result, not an error.
    async fn logs(&self, ctx: &HostContext) -> Result<ServerLogs, HostError>;

    /// Poll [`Self::status`] once per [`STATUS_POLL_INTERVAL`] until the
    /// result equals `target` (true), `timeout` elapses (false), or `cancel`
    /// fires (false, promptly). A false return is never an error here; the
    /// caller decides whether it is one. Probe failures propagate.
    ///
    /// The elapsed check precedes each probe, so a zero timeout returns
    /// false without touching the backend.
    async fn wait_for_status(
        &self,
        ctx: &HostContext,
        target: ServerStatus,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<bool, HostError> {
        let started = tokio::time::Instant::now();
        while started.elapsed() < timeout && !cancel.is_cancelled() {
            if self.status(ctx).await? == target {
                return Ok(true);
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(false),
                _ = tokio::time::sleep(STATUS_POLL_INTERVAL) => {}
            }
        }
        Ok(false)
    }
}
