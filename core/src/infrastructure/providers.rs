// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Server descriptor provider implementations.

use crate::domain::config::ServerInfoProviderConfig;
use crate::domain::host::HostError;
use crate::domain::provider::{ProviderError, ServerInfoProvider};
use crate::domain::server::ServerInfo;
use crate::infrastructure::kubernetes::{KubeApiClient, KubernetesApi};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Construct the provider chain from configuration, preserving list order
/// (later providers win name collisions during the directory merge).
pub async fn build_providers(
    configs: &[ServerInfoProviderConfig],
) -> Result<Vec<Arc<dyn ServerInfoProvider>>, HostError> {
    let mut providers: Vec<Arc<dyn ServerInfoProvider>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config {
            ServerInfoProviderConfig::Configuration { servers } => {
                providers.push(Arc::new(ConfigServerInfoProvider::new(servers.clone())));
            }
            ServerInfoProviderConfig::KubernetesConfigMap {
                label_selector,
                kube_config_path,
            } => {
                let api = KubeApiClient::new(kube_config_path.as_deref()).await?;
                providers.push(Arc::new(KubernetesConfigMapServerInfoProvider::new(
                    Arc::new(api),
                    label_selector.clone(),
                )));
            }
        }
    }
    Ok(providers)
}

/// Serves the descriptors declared inline in the configuration file.
pub struct ConfigServerInfoProvider {
    servers: HashMap<String, ServerInfo>,
}

impl ConfigServerInfoProvider {
    pub fn new(servers: HashMap<String, ServerInfo>) -> Self {
        Self { servers }
    }
}

#[async_trait]
impl ServerInfoProvider for ConfigServerInfoProvider {
    fn name(&self) -> &str {
        "configuration"
    }

    async fn server_info(&self) -> Result<HashMap<String, ServerInfo>, ProviderError> {
        Ok(self.servers.clone())
    }
}

/// Discovers descriptors from labelled ConfigMaps: every data entry of
/// every matching ConfigMap is one `server name -> camelCase YAML document`
/// pair.
pub struct KubernetesConfigMapServerInfoProvider {
    api: Arc<dyn KubernetesApi>,
    label_selector: String,
}

impl KubernetesConfigMapServerInfoProvider {
    pub fn new(api: Arc<dyn KubernetesApi>, label_selector: String) -> Self {
        Self {
            api,
            label_selector,
        }
    }
}

#[async_trait]
impl ServerInfoProvider for KubernetesConfigMapServerInfoProvider {
    fn name(&self) -> &str {
        "kubernetes-config-map"
    }

    async fn server_info(&self) -> Result<HashMap<String, ServerInfo>, ProviderError> {
        let entries = self
            .api
            .labelled_config_map_data(&self.label_selector)
            .await
            .map_err(|err| ProviderError::Source(err.to_string()))?;

        let mut servers = HashMap::new();
        for (name, document) in entries {
            let info: ServerInfo =
                serde_yaml::from_str(&document).map_err(|err| ProviderError::Parse {
                    name: name.clone(),
                    reason: err.to_string(),
                })?;
            servers.insert(name, info);
        }
        debug!(
            selector = %self.label_selector,
            count = servers.len(),
            "loaded servers from config maps"
        );
        Ok(servers)
    }
}
