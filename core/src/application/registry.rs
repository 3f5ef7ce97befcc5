// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Adapter registry: configuration key to host adapter resolution.
//!
//! Built once at startup from the `ServerHostAdapters` configuration
//! section and read-only thereafter. Each key owns one long-lived adapter
//! instance parameterized by its adapter-level statics; per-server
//! properties are bound separately on every invocation, because many
//! servers share one key with different property values.

use crate::domain::config::HostAdapterConfig;
use crate::domain::host::{HostError, ServerHostAdapter};
use crate::infrastructure::command::TokioCommandRunner;
use crate::infrastructure::docker_compose::DockerComposeHostAdapter;
use crate::infrastructure::kubernetes::{KubeApiClient, KubernetesHostAdapter};
use crate::infrastructure::process::ProcessHostAdapter;
use crate::infrastructure::process_env::SystemProcessEnvironment;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::info;

pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn ServerHostAdapter>>,
}

impl AdapterRegistry {
    /// Build the registry from configuration, constructing one adapter per
    /// key against the real backends. Process adapters share one process
    /// environment and compose adapters one command runner; each Kubernetes
    /// registration gets its own client (registrations may point at
    /// different clusters).
    pub async fn from_config(
        configs: &BTreeMap<String, HostAdapterConfig>,
    ) -> Result<Self, HostError> {
        let process_env = Arc::new(SystemProcessEnvironment::new());
        let command_runner = Arc::new(TokioCommandRunner);

        let mut adapters: HashMap<String, Arc<dyn ServerHostAdapter>> = HashMap::new();
        for (key, config) in configs {
            let adapter: Arc<dyn ServerHostAdapter> = match config {
                HostAdapterConfig::Process => {
                    Arc::new(ProcessHostAdapter::new(process_env.clone()))
                }
                HostAdapterConfig::DockerCompose {
                    docker_process_file_path,
                    docker_host,
                } => Arc::new(DockerComposeHostAdapter::new(
                    command_runner.clone(),
                    docker_process_file_path.clone(),
                    docker_host.clone(),
                )),
                HostAdapterConfig::Kubernetes { kube_config_path } => {
                    let client = KubeApiClient::new(kube_config_path.as_deref()).await?;
                    Arc::new(KubernetesHostAdapter::new(Arc::new(client)))
                }
            };
            info!(key = %key, "registered host adapter");
            adapters.insert(key.clone(), adapter);
        }
        Ok(Self { adapters })
    }

    /// Build from prebuilt adapter instances. Used by tests and callers
    /// that wire their own backends.
    pub fn from_adapters(adapters: HashMap<String, Arc<dyn ServerHostAdapter>>) -> Self {
        Self { adapters }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn ServerHostAdapter>> {
        self.adapters.get(key).cloned()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}
