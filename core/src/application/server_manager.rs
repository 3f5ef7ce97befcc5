// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! The server directory and lifecycle orchestrator.
//!
//! `ServerManager` owns the merged, TTL-cached server directory and routes
//! lifecycle operations to the adapter resolved from each descriptor. It
//! adds exactly three distinctions of its own on top of adapter errors:
//! unknown server names, servers without a controllable host, and
//! wait-for-status timeouts. Everything else propagates unwrapped.

use crate::application::registry::AdapterRegistry;
use crate::domain::config::{ManagerConfig, ManagerSettings};
use crate::domain::host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
use crate::domain::provider::{ProviderError, ServerInfoProvider};
use crate::domain::server::{ServerInfo, ServerStatus};
use crate::infrastructure::cache::TtlCell;
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Gallery listings only include these extensions (case-insensitive).
const GALLERY_EXTENSIONS: [&str; 5] = ["png", "jpg", "jpeg", "gif", "webp"];

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("server `{0}` not found")]
    NotFound(String),

    /// The server exists but declares no host adapter, or declares a key
    /// that resolves to nothing in the registry.
    #[error("the `{0}` server does not support this operation")]
    UnsupportedOperation(String),

    #[error("the `{server}` server did not reach {target} within the timeout period")]
    Timeout {
        server: String,
        target: ServerStatus,
    },

    #[error("the `{server}` server directory `{path}` does not exist")]
    DirectoryNotFound { server: String, path: String },

    #[error("the `{server}` server file `{file}` does not exist")]
    FileNotFound { server: String, file: String },

    #[error("server info provider `{provider}` failed")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error(transparent)]
    Host(#[from] HostError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ServerManager {
    settings: ManagerSettings,
    providers: Vec<Arc<dyn ServerInfoProvider>>,
    registry: Arc<AdapterRegistry>,
    cache: TtlCell<Arc<HashMap<String, ServerInfo>>>,
    /// Fired on shutdown; observed by every wait-for-status poll loop.
    shutdown: CancellationToken,
}

impl ServerManager {
    pub fn new(
        settings: ManagerSettings,
        providers: Vec<Arc<dyn ServerInfoProvider>>,
        registry: Arc<AdapterRegistry>,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            settings,
            providers,
            registry,
            cache: TtlCell::new(),
            shutdown,
        }
    }

    /// Assemble the full orchestrator from a parsed configuration document:
    /// adapters against the real backends, providers in declared order.
    pub async fn from_config(
        config: &ManagerConfig,
        shutdown: CancellationToken,
    ) -> Result<Self, HostError> {
        let registry = AdapterRegistry::from_config(&config.server_host_adapters).await?;
        let providers =
            crate::infrastructure::providers::build_providers(&config.server_info_providers)
                .await?;
        Ok(Self::new(
            config.settings(),
            providers,
            Arc::new(registry),
            shutdown,
        ))
    }

    /// The merged server directory: cached until the TTL expires, then
    /// reassembled by querying every provider in order. A later provider's
    /// entry overwrites an earlier one for the same name, and the cache is
    /// replaced all-or-nothing (a provider failure keeps the previous
    /// directory untouched).
    pub async fn get_servers(&self) -> Result<Arc<HashMap<String, ServerInfo>>, ManagerError> {
        self.cache
            .get_or_populate(self.settings.servers_cache_expiration, || {
                self.refresh_directory()
            })
            .await
    }

    async fn refresh_directory(&self) -> Result<Arc<HashMap<String, ServerInfo>>, ManagerError> {
        let mut merged = HashMap::new();
        for provider in &self.providers {
            let servers =
                provider
                    .server_info()
                    .await
                    .map_err(|source| ManagerError::Provider {
                        provider: provider.name().to_string(),
                        source,
                    })?;
            merged.extend(servers);
        }
        info!(count = merged.len(), "refreshed server directory");
        Ok(Arc::new(merged))
    }

    /// Drop the cached directory and rebuild it from the providers now,
    /// regardless of how much TTL the current entry has left.
    pub async fn refresh_servers(&self) -> Result<Arc<HashMap<String, ServerInfo>>, ManagerError> {
        self.cache.invalidate().await;
        self.get_servers().await
    }

    pub async fn get_server_info(&self, name: &str) -> Result<ServerInfo, ManagerError> {
        let servers = self.get_servers().await?;
        servers
            .get(name)
            .cloned()
            .ok_or_else(|| ManagerError::NotFound(name.to_string()))
    }

    pub async fn get_server_status(&self, name: &str) -> Result<ServerStatus, ManagerError> {
        let info = self.get_server_info(name).await?;
        let (adapter, ctx) = self.resolve_adapter(name, &info)?;
        Ok(adapter.status(&ctx).await?)
    }

    /// Start the server; with `wait`, poll until it reports running within
    /// the configured timeout and raise [`ManagerError::Timeout`] otherwise.
    pub async fn start_server(&self, name: &str, wait: bool) -> Result<(), ManagerError> {
        let info = self.get_server_info(name).await?;
        let (adapter, ctx) = self.resolve_adapter(name, &info)?;
        adapter.start(&ctx).await?;
        info!(server = %name, "start issued");
        if wait {
            self.await_status(name, adapter.as_ref(), &ctx, ServerStatus::Running)
                .await?;
        }
        Ok(())
    }

    /// Stop the server; with `wait`, poll until it reports stopped.
    pub async fn stop_server(&self, name: &str, wait: bool) -> Result<(), ManagerError> {
        let info = self.get_server_info(name).await?;
        let (adapter, ctx) = self.resolve_adapter(name, &info)?;
        adapter.stop(&ctx).await?;
        info!(server = %name, "stop issued");
        if wait {
            self.await_status(name, adapter.as_ref(), &ctx, ServerStatus::Stopped)
                .await?;
        }
        Ok(())
    }

    pub async fn get_server_logs(&self, name: &str) -> Result<ServerLogs, ManagerError> {
        let info = self.get_server_info(name).await?;
        let (adapter, ctx) = self.resolve_adapter(name, &info)?;
        Ok(adapter.logs(&ctx).await?)
    }

    /// Regular files under the server's configured files directory.
    pub async fn get_server_files(&self, name: &str) -> Result<Vec<PathBuf>, ManagerError> {
        let info = self.get_server_info(name).await?;
        let path = Self::configured_path(name, info.files_path.as_deref())?;
        self.list_files(name, &path, |_| true).await
    }

    /// One downloadable file under the server's files directory.
    pub async fn get_server_file(
        &self,
        name: &str,
        file_name: &str,
    ) -> Result<PathBuf, ManagerError> {
        let info = self.get_server_info(name).await?;
        let dir = Self::configured_path(name, info.files_path.as_deref())?;

        // Only bare file names resolve; anything with directory components
        // is treated as nonexistent.
        let is_bare = Path::new(file_name)
            .components()
            .all(|c| matches!(c, Component::Normal(_)))
            && !file_name.contains(std::path::MAIN_SEPARATOR);
        let path = dir.join(file_name);
        if !is_bare || !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ManagerError::FileNotFound {
                server: name.to_string(),
                file: file_name.to_string(),
            });
        }
        Ok(path)
    }

    /// Image files under the server's configured gallery directory.
    pub async fn get_server_gallery_files(
        &self,
        name: &str,
    ) -> Result<Vec<PathBuf>, ManagerError> {
        let info = self.get_server_info(name).await?;
        let path = Self::configured_path(name, info.gallery_path.as_deref())?;
        self.list_files(name, &path, |file| {
            file.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| {
                    GALLERY_EXTENSIONS
                        .iter()
                        .any(|wanted| ext.eq_ignore_ascii_case(wanted))
                })
        })
        .await
    }

    fn configured_path(name: &str, path: Option<&str>) -> Result<PathBuf, ManagerError> {
        match path {
            Some(path) if !path.trim().is_empty() => Ok(PathBuf::from(path)),
            _ => Err(ManagerError::UnsupportedOperation(name.to_string())),
        }
    }

    async fn list_files(
        &self,
        server: &str,
        dir: &Path,
        keep: impl Fn(&Path) -> bool,
    ) -> Result<Vec<PathBuf>, ManagerError> {
        if !tokio::fs::try_exists(dir).await.unwrap_or(false) {
            return Err(ManagerError::DirectoryNotFound {
                server: server.to_string(),
                path: dir.display().to_string(),
            });
        }

        let mut entries = tokio::fs::read_dir(dir).await?;
        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() && keep(&entry.path()) {
                files.push(entry.path());
            }
        }
        files.sort();
        Ok(files)
    }

    async fn await_status(
        &self,
        name: &str,
        adapter: &dyn ServerHostAdapter,
        ctx: &HostContext,
        target: ServerStatus,
    ) -> Result<(), ManagerError> {
        let reached = adapter
            .wait_for_status(
                ctx,
                target,
                self.settings.server_status_wait_timeout,
                &self.shutdown,
            )
            .await?;
        if !reached {
            warn!(server = %name, %target, "status wait timed out");
            return Err(ManagerError::Timeout {
                server: name.to_string(),
                target,
            });
        }
        Ok(())
    }

    fn resolve_adapter(
        &self,
        name: &str,
        info: &ServerInfo,
    ) -> Result<(Arc<dyn ServerHostAdapter>, HostContext), ManagerError> {
        if !info.has_host_adapter() {
            return Err(ManagerError::UnsupportedOperation(name.to_string()));
        }
        let key = info
            .host_adapter_name
            .as_deref()
            .unwrap_or_default()
            .trim();
        let adapter = self
            .registry
            .get(key)
            .ok_or_else(|| ManagerError::UnsupportedOperation(name.to_string()))?;
        let ctx = HostContext::new(name, key, info.host_properties.clone());
        Ok((adapter, ctx))
    }
}
