// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Configuration schema for the orchestration core.
//!
//! The schema mirrors the operator-facing configuration file: PascalCase
//! keys, one `ServerHostAdapters` section keyed by adapter registration
//! name, an ordered `ServerInfoProviders` list, and two tunable durations.
//! Durations accept humantime strings (`5m`, `90s`, `1h`).

use crate::domain::server::ServerInfo;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::time::Duration;

fn default_cache_expiration() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(10 * 60)
}

fn default_docker_binary() -> String {
    "docker".to_string()
}

/// Tunables consumed by the server manager.
#[derive(Debug, Clone, Copy)]
pub struct ManagerSettings {
    /// TTL of the merged server directory cache.
    pub servers_cache_expiration: Duration,
    /// How long `start`/`stop` with `wait` polls for the target status
    /// before reporting a timeout.
    pub server_status_wait_timeout: Duration,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            servers_cache_expiration: default_cache_expiration(),
            server_status_wait_timeout: default_wait_timeout(),
        }
    }
}

/// Top-level configuration document.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ManagerConfig {
    #[serde(with = "humantime_serde", default = "default_cache_expiration")]
    pub servers_cache_expiration: Duration,

    #[serde(with = "humantime_serde", default = "default_wait_timeout")]
    pub server_status_wait_timeout: Duration,

    /// Adapter registrations: configuration key -> adapter type plus the
    /// adapter-level static options that do not vary per server. Keys are
    /// unique by construction (it is a map).
    #[serde(default)]
    pub server_host_adapters: BTreeMap<String, HostAdapterConfig>,

    /// Descriptor providers, queried in list order on every directory
    /// refresh (later providers win name collisions).
    #[serde(default)]
    pub server_info_providers: Vec<ServerInfoProviderConfig>,
}

impl ManagerConfig {
    pub fn settings(&self) -> ManagerSettings {
        ManagerSettings {
            servers_cache_expiration: self.servers_cache_expiration,
            server_status_wait_timeout: self.server_status_wait_timeout,
        }
    }
}

/// One adapter registration. The tag selects the backend; the remaining
/// fields are the adapter-level statics (per-server values travel in the
/// descriptor's host properties instead).
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "Type")]
pub enum HostAdapterConfig {
    Process,

    #[serde(rename_all = "PascalCase")]
    DockerCompose {
        /// Docker binary invoked for `compose` subcommands.
        #[serde(default = "default_docker_binary")]
        docker_process_file_path: String,
        /// Optional `-H` daemon address.
        #[serde(default)]
        docker_host: Option<String>,
    },

    #[serde(rename_all = "PascalCase")]
    Kubernetes {
        /// Path to a kubeconfig file; absent means in-cluster configuration.
        #[serde(default)]
        kube_config_path: Option<PathBuf>,
    },
}

/// One descriptor provider registration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "Type")]
pub enum ServerInfoProviderConfig {
    /// Servers declared inline in the configuration file.
    #[serde(rename_all = "PascalCase")]
    Configuration {
        #[serde(default)]
        servers: HashMap<String, ServerInfo>,
    },

    /// Servers discovered from labelled ConfigMaps, one camelCase YAML
    /// descriptor document per data entry.
    #[serde(rename_all = "PascalCase")]
    KubernetesConfigMap {
        label_selector: String,
        #[serde(default)]
        kube_config_path: Option<PathBuf>,
    },
}
