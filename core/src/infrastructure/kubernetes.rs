// Copyright (c) 2026 servermgr contributors
// SPDX-License-Identifier: MIT

//! Kubernetes control-plane capability and the host adapter built on it.
//!
//! The adapter governs a Deployment or StatefulSet by reading its replica
//! status and merge-patching its scale; logs come from the first pod
//! matching the workload's selector, one stream per container. Everything
//! the adapter (and the ConfigMap descriptor provider) needs from the
//! control plane sits behind [`KubernetesApi`], implemented for production
//! by [`KubeApiClient`] and by scripted fakes in tests.

use crate::domain::host::{HostContext, HostError, ServerHostAdapter, ServerLogs};
use crate::domain::properties::{BindProperties, PropertyMap};
use crate::domain::server::ServerStatus;
use async_trait::async_trait;
use bytes::Bytes;
use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::core::v1::{ConfigMap, Pod};
use kube::api::{Api, ListParams, LogParams, Patch, PatchParams};
use kube::ResourceExt;
use serde_json::json;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Workload kinds the adapter can govern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
}

impl WorkloadKind {
    /// Parses the per-server `Kind` property. Unknown kinds fail with
    /// [`HostError::UnsupportedKind`] before any API call is made.
    pub fn parse(kind: &str) -> Result<Self, HostError> {
        match kind {
            "Deployment" => Ok(Self::Deployment),
            "StatefulSet" => Ok(Self::StatefulSet),
            other => Err(HostError::UnsupportedKind(other.to_string())),
        }
    }
}

/// Per-server properties of the Kubernetes adapter.
#[derive(Debug, Clone)]
pub struct KubernetesHostProperties {
    pub kind: WorkloadKind,
    pub namespace: String,
    pub name: String,
}

impl BindProperties for KubernetesHostProperties {
    fn bind(props: &PropertyMap<'_>) -> Result<Self, HostError> {
        Ok(Self {
            kind: WorkloadKind::parse(props.required("Kind")?)?,
            namespace: props.required("Namespace")?.to_string(),
            name: props.required("Name")?.to_string(),
        })
    }
}

/// Declared and ready replica counts of a workload, as reported by its
/// status subresource. Absent counts mean the controller has not reported
/// yet and read as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct WorkloadStatus {
    pub replicas: Option<i32>,
    pub ready_replicas: Option<i32>,
}

/// A pod matched by a workload selector, with its container names.
#[derive(Debug, Clone)]
pub struct PodInfo {
    pub name: String,
    pub containers: Vec<String>,
}

/// Pure replica-count to status mapping.
pub fn replica_status(replicas: Option<i32>, ready_replicas: Option<i32>) -> ServerStatus {
    let replicas = replicas.unwrap_or(0);
    let ready = ready_replicas.unwrap_or(0);
    if replicas != 0 && ready == replicas {
        ServerStatus::Running
    } else if replicas != 0 {
        ServerStatus::Starting
    } else {
        ServerStatus::Stopped
    }
}

/// Control-plane operations consumed by the adapter and the ConfigMap
/// descriptor provider.
#[async_trait]
pub trait KubernetesApi: Send + Sync {
    async fn workload_status(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<WorkloadStatus, HostError>;

    /// Merge-patch the workload's scale subresource to `replicas`.
    /// Idempotent; safe to call regardless of current state.
    async fn scale_workload(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), HostError>;

    async fn workload_selector(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, HostError>;

    async fn pods_by_selector(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodInfo>, HostError>;

    async fn container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<String, HostError>;

    /// Data entries of all ConfigMaps matching `label_selector`, across
    /// namespaces, in listing order.
    async fn labelled_config_map_data(
        &self,
        label_selector: &str,
    ) -> Result<Vec<(String, String)>, HostError>;
}

fn backend_err(err: impl std::fmt::Display) -> HostError {
    HostError::Backend(err.to_string())
}

/// Render a `matchLabels` map as a list-style label selector.
pub fn label_selector_string(labels: &BTreeMap<String, String>) -> String {
    labels
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// [`KubernetesApi`] over the `kube` client. Built from a kubeconfig file
/// when a path is configured, from the in-cluster environment otherwise.
pub struct KubeApiClient {
    client: kube::Client,
}

impl KubeApiClient {
    pub async fn new(kube_config_path: Option<&Path>) -> Result<Self, HostError> {
        let config = match kube_config_path {
            Some(path) => {
                let kubeconfig =
                    kube::config::Kubeconfig::read_from(path).map_err(backend_err)?;
                kube::Config::from_custom_kubeconfig(
                    kubeconfig,
                    &kube::config::KubeConfigOptions::default(),
                )
                .await
                .map_err(backend_err)?
            }
            None => kube::Config::incluster().map_err(backend_err)?,
        };
        let client = kube::Client::try_from(config).map_err(backend_err)?;
        Ok(Self { client })
    }

    fn deployments(&self, namespace: &str) -> Api<Deployment> {
        Api::namespaced(self.client.clone(), namespace)
    }

    fn stateful_sets(&self, namespace: &str) -> Api<StatefulSet> {
        Api::namespaced(self.client.clone(), namespace)
    }
}

#[async_trait]
impl KubernetesApi for KubeApiClient {
    async fn workload_status(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<WorkloadStatus, HostError> {
        match kind {
            WorkloadKind::Deployment => {
                let deployment = self
                    .deployments(namespace)
                    .get_status(name)
                    .await
                    .map_err(backend_err)?;
                let status = deployment.status.unwrap_or_default();
                Ok(WorkloadStatus {
                    replicas: status.replicas,
                    ready_replicas: status.ready_replicas,
                })
            }
            WorkloadKind::StatefulSet => {
                let stateful_set = self
                    .stateful_sets(namespace)
                    .get_status(name)
                    .await
                    .map_err(backend_err)?;
                let status = stateful_set.status.unwrap_or_default();
                Ok(WorkloadStatus {
                    replicas: Some(status.replicas),
                    ready_replicas: status.ready_replicas,
                })
            }
        }
    }

    async fn scale_workload(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
        replicas: i32,
    ) -> Result<(), HostError> {
        let patch = Patch::Merge(json!({ "spec": { "replicas": replicas } }));
        let params = PatchParams::default();
        match kind {
            WorkloadKind::Deployment => {
                self.deployments(namespace)
                    .patch_scale(name, &params, &patch)
                    .await
                    .map_err(backend_err)?;
            }
            WorkloadKind::StatefulSet => {
                self.stateful_sets(namespace)
                    .patch_scale(name, &params, &patch)
                    .await
                    .map_err(backend_err)?;
            }
        }
        Ok(())
    }

    async fn workload_selector(
        &self,
        kind: WorkloadKind,
        namespace: &str,
        name: &str,
    ) -> Result<BTreeMap<String, String>, HostError> {
        let selector = match kind {
            WorkloadKind::Deployment => self
                .deployments(namespace)
                .get(name)
                .await
                .map_err(backend_err)?
                .spec
                .map(|spec| spec.selector),
            WorkloadKind::StatefulSet => self
                .stateful_sets(namespace)
                .get(name)
                .await
                .map_err(backend_err)?
                .spec
                .map(|spec| spec.selector),
        };
        Ok(selector
            .and_then(|selector| selector.match_labels)
            .unwrap_or_default())
    }

    async fn pods_by_selector(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<PodInfo>, HostError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let listed = pods
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(backend_err)?;
        Ok(listed
            .items
            .into_iter()
            .map(|pod| {
                let containers = pod
                    .spec
                    .as_ref()
                    .map(|spec| spec.containers.iter().map(|c| c.name.clone()).collect())
                    .unwrap_or_default();
                PodInfo {
                    name: pod.name_any(),
                    containers,
                }
            })
            .collect())
    }

    async fn container_logs(
        &self,
        namespace: &str,
        pod: &str,
        container: &str,
    ) -> Result<String, HostError> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let params = LogParams {
            container: Some(container.to_string()),
            ..LogParams::default()
        };
        pods.logs(pod, &params).await.map_err(backend_err)
    }

    async fn labelled_config_map_data(
        &self,
        label_selector: &str,
    ) -> Result<Vec<(String, String)>, HostError> {
        let config_maps: Api<ConfigMap> = Api::all(self.client.clone());
        let listed = config_maps
            .list(&ListParams::default().labels(label_selector))
            .await
            .map_err(backend_err)?;
        Ok(listed
            .items
            .into_iter()
            .flat_map(|cm| cm.data.unwrap_or_default())
            .collect())
    }
}

pub struct KubernetesHostAdapter {
    api: Arc<dyn KubernetesApi>,
}

impl KubernetesHostAdapter {
    pub fn new(api: Arc<dyn KubernetesApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl ServerHostAdapter for KubernetesHostAdapter {
    async fn status(&self, ctx: &HostContext) -> Result<ServerStatus, HostError> {
        let props: KubernetesHostProperties = ctx.bind()?;
        let status = self
            .api
            .workload_status(props.kind, &props.namespace, &props.name)
            .await?;
        Ok(replica_status(status.replicas, status.ready_replicas))
    }

    async fn start(&self, ctx: &HostContext) -> Result<(), HostError> {
        let props: KubernetesHostProperties = ctx.bind()?;
        self.api
            .scale_workload(props.kind, &props.namespace, &props.name, 1)
            .await?;
        info!(server = %ctx.server_name, workload = %props.name, "scaled workload to 1");
        Ok(())
    }

    async fn stop(&self, ctx: &HostContext) -> Result<(), HostError> {
        let props: KubernetesHostProperties = ctx.bind()?;
        self.api
            .scale_workload(props.kind, &props.namespace, &props.name, 0)
            .await?;
        info!(server = %ctx.server_name, workload = %props.name, "scaled workload to 0");
        Ok(())
    }

    async fn logs(&self, ctx: &HostContext) -> Result<ServerLogs, HostError> {
        let props: KubernetesHostProperties = ctx.bind()?;
        let selector = self
            .api
            .workload_selector(props.kind, &props.namespace, &props.name)
            .await?;
        let pods = self
            .api
            .pods_by_selector(&props.namespace, &label_selector_string(&selector))
            .await?;

        // No matching pod is an empty result, not an error.
        let Some(pod) = pods.first() else {
            return Ok(ServerLogs::new());
        };

        let mut logs = ServerLogs::new();
        for container in &pod.containers {
            let text = self
                .api
                .container_logs(&props.namespace, &pod.name, container)
                .await?;
            logs.insert(container.clone(), Bytes::from(text));
        }
        Ok(logs)
    }
}
