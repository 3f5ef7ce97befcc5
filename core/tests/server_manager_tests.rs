// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! End-to-end tests of the server manager against stub providers and
//! adapters: directory merging and caching, lifecycle routing, wait
//! timeouts, and the file listing operations.

use async_trait::async_trait;
use servermgr_core::application::{AdapterRegistry, ManagerError, ServerManager};
use servermgr_core::domain::config::ManagerSettings;
use servermgr_core::domain::host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
use servermgr_core::domain::provider::{ProviderError, ServerInfoProvider};
use servermgr_core::domain::server::{ServerInfo, ServerStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

struct StaticProvider {
    name: &'static str,
    servers: HashMap<String, ServerInfo>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ServerInfoProvider for StaticProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn server_info(&self) -> Result<HashMap<String, ServerInfo>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.servers.clone())
    }
}

/// Fails on the first query, succeeds afterwards.
struct FlakyProvider {
    servers: HashMap<String, ServerInfo>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ServerInfoProvider for FlakyProvider {
    fn name(&self) -> &str {
        "flaky"
    }

    async fn server_info(&self) -> Result<HashMap<String, ServerInfo>, ProviderError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err(ProviderError::Source("connection refused".to_string()));
        }
        Ok(self.servers.clone())
    }
}

/// Replays a scripted status sequence, holding the last entry forever.
struct StubAdapter {
    statuses: Vec<ServerStatus>,
    probes: AtomicUsize,
    starts: AtomicUsize,
    stops: AtomicUsize,
}

impl StubAdapter {
    fn new(statuses: Vec<ServerStatus>) -> Self {
        Self {
            statuses,
            probes: AtomicUsize::new(0),
            starts: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ServerHostAdapter for StubAdapter {
    async fn status(&self, _ctx: &HostContext) -> Result<ServerStatus, HostError> {
        let idx = self.probes.fetch_add(1, Ordering::SeqCst);
        Ok(self.statuses[idx.min(self.statuses.len() - 1)])
    }

    async fn start(&self, _ctx: &HostContext) -> Result<(), HostError> {
        self.starts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self, _ctx: &HostContext) -> Result<(), HostError> {
        self.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn logs(&self, _ctx: &HostContext) -> Result<ServerLogs, HostError> {
        Ok(ServerLogs::new())
    }
}

fn hosted_server(adapter: &str) -> ServerInfo {
    ServerInfo {
        host_adapter_name: Some(adapter.to_string()),
        ..ServerInfo::default()
    }
}

fn settings(cache_ttl: Duration, wait_timeout: Duration) -> ManagerSettings {
    ManagerSettings {
        servers_cache_expiration: cache_ttl,
        server_status_wait_timeout: wait_timeout,
    }
}

fn manager_with(
    providers: Vec<Arc<dyn ServerInfoProvider>>,
    adapters: HashMap<String, Arc<dyn ServerHostAdapter>>,
    wait_timeout: Duration,
) -> ServerManager {
    ServerManager::new(
        settings(Duration::from_secs(300), wait_timeout),
        providers,
        Arc::new(AdapterRegistry::from_adapters(adapters)),
        CancellationToken::new(),
    )
}

fn server_map(entries: &[(&str, ServerInfo)]) -> HashMap<String, ServerInfo> {
    entries
        .iter()
        .map(|(name, info)| (name.to_string(), info.clone()))
        .collect()
}

#[tokio::test]
async fn later_provider_wins_on_name_collision() {
    let first = ServerInfo {
        game: Some("Factorio".to_string()),
        ..ServerInfo::default()
    };
    let second = ServerInfo {
        game: Some("Valheim".to_string()),
        ..ServerInfo::default()
    };
    let providers: Vec<Arc<dyn ServerInfoProvider>> = vec![
        Arc::new(StaticProvider {
            name: "a",
            servers: server_map(&[("alpha", first.clone()), ("beta", first.clone())]),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
        Arc::new(StaticProvider {
            name: "b",
            servers: server_map(&[("beta", second.clone()), ("gamma", first)]),
            calls: Arc::new(AtomicUsize::new(0)),
        }),
    ];
    let manager = manager_with(providers, HashMap::new(), Duration::from_secs(10));

    let servers = manager.get_servers().await.unwrap();
    assert_eq!(servers.len(), 3);
    assert_eq!(servers["beta"].game.as_deref(), Some("Valheim"));
}

#[tokio::test(start_paused = true)]
async fn directory_is_cached_until_the_ttl_expires() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[("alpha", ServerInfo::default())]),
        calls: calls.clone(),
    });
    let manager = ServerManager::new(
        settings(Duration::from_secs(60), Duration::from_secs(10)),
        vec![provider],
        Arc::new(AdapterRegistry::from_adapters(HashMap::new())),
        CancellationToken::new(),
    );

    manager.get_servers().await.unwrap();
    manager.get_servers().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    tokio::time::advance(Duration::from_secs(61)).await;
    manager.get_servers().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn explicit_refresh_requeries_providers_inside_the_ttl() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[("alpha", ServerInfo::default())]),
        calls: calls.clone(),
    });
    let manager = ServerManager::new(
        settings(Duration::from_secs(3600), Duration::from_secs(10)),
        vec![provider],
        Arc::new(AdapterRegistry::from_adapters(HashMap::new())),
        CancellationToken::new(),
    );

    manager.get_servers().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    // Entry is far from expiring, but an explicit refresh bypasses it.
    let servers = manager.refresh_servers().await.unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    // The refreshed entry carries a fresh TTL.
    manager.get_servers().await.unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn provider_failure_surfaces_and_is_not_cached() {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Arc::new(FlakyProvider {
        servers: server_map(&[("alpha", ServerInfo::default())]),
        calls: calls.clone(),
    });
    let manager = manager_with(vec![provider], HashMap::new(), Duration::from_secs(10));

    let err = manager.get_servers().await.unwrap_err();
    assert!(matches!(err, ManagerError::Provider { ref provider, .. } if provider == "flaky"));

    // The failed refresh stored nothing, so the retry queries again.
    let servers = manager.get_servers().await.unwrap();
    assert_eq!(servers.len(), 1);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unknown_server_reports_not_found() {
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: HashMap::new(),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let manager = manager_with(vec![provider], HashMap::new(), Duration::from_secs(10));

    let err = manager.get_server_status("ghost").await.unwrap_err();
    assert!(matches!(err, ManagerError::NotFound(ref name) if name == "ghost"));
}

#[tokio::test]
async fn server_without_adapter_is_unsupported() {
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[
            ("bare", ServerInfo::default()),
            ("dangling", hosted_server("nonexistent")),
        ]),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let manager = manager_with(vec![provider], HashMap::new(), Duration::from_secs(10));

    for name in ["bare", "dangling"] {
        let err = manager.start_server(name, false).await.unwrap_err();
        assert!(matches!(err, ManagerError::UnsupportedOperation(ref n) if n == name));
    }
}

#[tokio::test(start_paused = true)]
async fn start_with_wait_returns_once_running() {
    let adapter = Arc::new(StubAdapter::new(vec![
        ServerStatus::Stopped,
        ServerStatus::Starting,
        ServerStatus::Running,
    ]));
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[("alpha", hosted_server("stub"))]),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut adapters: HashMap<String, Arc<dyn ServerHostAdapter>> = HashMap::new();
    adapters.insert("stub".to_string(), adapter.clone());
    let manager = manager_with(vec![provider], adapters, Duration::from_secs(30));

    manager.start_server("alpha", true).await.unwrap();
    assert_eq!(adapter.starts.load(Ordering::SeqCst), 1);
    assert_eq!(adapter.probes.load(Ordering::SeqCst), 3);
}

#[tokio::test(start_paused = true)]
async fn start_with_wait_times_out_when_status_never_changes() {
    let adapter = Arc::new(StubAdapter::new(vec![ServerStatus::Stopped]));
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[("alpha", hosted_server("stub"))]),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut adapters: HashMap<String, Arc<dyn ServerHostAdapter>> = HashMap::new();
    adapters.insert("stub".to_string(), adapter.clone());
    let manager = manager_with(vec![provider], adapters, Duration::from_secs(5));

    let err = manager.start_server("alpha", true).await.unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Timeout {
            ref server,
            target: ServerStatus::Running,
        } if server == "alpha"
    ));
    assert_eq!(adapter.starts.load(Ordering::SeqCst), 1);
    assert_eq!(adapter.probes.load(Ordering::SeqCst), 5);
}

#[tokio::test(start_paused = true)]
async fn stop_with_wait_polls_for_stopped() {
    let adapter = Arc::new(StubAdapter::new(vec![
        ServerStatus::Running,
        ServerStatus::Stopped,
    ]));
    let provider = Arc::new(StaticProvider {
        name: "a",
        servers: server_map(&[("alpha", hosted_server("stub"))]),
        calls: Arc::new(AtomicUsize::new(0)),
    });
    let mut adapters: HashMap<String, Arc<dyn ServerHostAdapter>> = HashMap::new();
    adapters.insert("stub".to_string(), adapter.clone());
    let manager = manager_with(vec![provider], adapters, Duration::from_secs(30));

    manager.stop_server("alpha", true).await.unwrap();
    assert_eq!(adapter.stops.load(Ordering::SeqCst), 1);
    assert_eq!(adapter.probes.load(Ordering::SeqCst), 2);
}

mod files {
    use super::*;
    use std::fs;

    fn file_manager(info: ServerInfo) -> ServerManager {
        let provider = Arc::new(StaticProvider {
            name: "a",
            servers: server_map(&[("alpha", info)]),
            calls: Arc::new(AtomicUsize::new(0)),
        });
        manager_with(vec![provider], HashMap::new(), Duration::from_secs(10))
    }

    #[tokio::test]
    async fn lists_regular_files_only() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("save1.zip"), b"x").unwrap();
        fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();

        let manager = file_manager(ServerInfo {
            files_path: Some(dir.path().to_string_lossy().into_owned()),
            ..ServerInfo::default()
        });

        let files = manager.get_server_files("alpha").await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["notes.txt", "save1.zip"]);
    }

    #[tokio::test]
    async fn gallery_keeps_only_image_extensions() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["map.png", "shot.JPG", "clip.webp", "readme.md", "save.zip"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }

        let manager = file_manager(ServerInfo {
            gallery_path: Some(dir.path().to_string_lossy().into_owned()),
            ..ServerInfo::default()
        });

        let files = manager.get_server_gallery_files("alpha").await.unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["clip.webp", "map.png", "shot.JPG"]);
    }

    #[tokio::test]
    async fn fetches_one_file_by_bare_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("save1.zip"), b"x").unwrap();

        let manager = file_manager(ServerInfo {
            files_path: Some(dir.path().to_string_lossy().into_owned()),
            ..ServerInfo::default()
        });

        let path = manager.get_server_file("alpha", "save1.zip").await.unwrap();
        assert!(path.ends_with("save1.zip"));

        let err = manager
            .get_server_file("alpha", "missing.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, ManagerError::FileNotFound { .. }));

        // Names with directory components never resolve.
        let err = manager
            .get_server_file("alpha", "../save1.zip")
            .await
            .unwrap_err();
        assert!(matches!(err, ManagerError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn missing_directory_and_missing_config_are_distinct_errors() {
        let manager = file_manager(ServerInfo {
            files_path: Some("/nonexistent/servermgr-test".to_string()),
            ..ServerInfo::default()
        });
        let err = manager.get_server_files("alpha").await.unwrap_err();
        assert!(matches!(err, ManagerError::DirectoryNotFound { .. }));

        let manager = file_manager(ServerInfo::default());
        let err = manager.get_server_files("alpha").await.unwrap_err();
        assert!(matches!(err, ManagerError::UnsupportedOperation(_)));

        let err = manager.get_server_gallery_files("alpha").await.unwrap_err();
        assert!(matches!(err, ManagerError::UnsupportedOperation(_)));
    }
}
