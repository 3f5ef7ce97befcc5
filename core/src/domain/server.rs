// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Server directory entries and the observable server lifecycle states.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Live status of a hosted server, recomputed from the backend on every
/// query. Nothing persists a status between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServerStatus {
    /// The backend could not classify the workload.
    Unknown,
    Stopped,
    Starting,
    Running,
}

impl std::fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Unknown => "Unknown",
            Self::Stopped => "Stopped",
            Self::Starting => "Starting",
            Self::Running => "Running",
        };
        f.write_str(s)
    }
}

/// One entry of the merged server directory.
///
/// Descriptors are produced by [`ServerInfoProvider`](crate::domain::provider::ServerInfoProvider)
/// implementations on every directory refresh and are immutable once
/// returned; the next refresh (or TTL expiry) replaces them wholesale.
///
/// The serde shape is camelCase because the ConfigMap provider parses each
/// data value as a camelCase YAML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerInfo {
    /// Display label of the hosted game, if any.
    pub game: Option<String>,
    /// Icon URL or path for display surfaces.
    pub icon: Option<String>,
    /// Readme text or link shown alongside the server.
    pub readme: Option<String>,
    /// Directory holding downloadable server files.
    pub files_path: Option<String>,
    /// Directory holding gallery images.
    pub gallery_path: Option<String>,
    /// Directory holding server backups.
    pub backups_path: Option<String>,
    /// Registry key of the host adapter governing this server's lifecycle.
    /// A server without one is display-only: lifecycle operations are
    /// rejected as unsupported.
    pub host_adapter_name: Option<String>,
    /// Raw adapter-specific configuration, bound to the adapter's typed
    /// property structure on every invocation.
    pub host_properties: HashMap<String, String>,
    /// Arbitrary display fields (e.g. "Version", "Address").
    pub fields: HashMap<String, String>,
}

impl ServerInfo {
    /// Whether the descriptor names a host adapter at all.
    pub fn has_host_adapter(&self) -> bool {
        self.host_adapter_name
            .as_deref()
            .is_some_and(|name| !name.trim().is_empty())
    }
}
