//! kube-rs backed cluster view

use crate::config::{ConnectOptions, connect};
use crate::error::ClusterError;
use faas_checker_core::{ClusterView, PLATFORM_SELECTOR};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;
use kube::Client;
use kube::api::{Api, ListParams};
use tracing::debug;

/// Read-only view over a live cluster
#[derive(Clone)]
pub struct KubeClusterView {
    client: Client,
}

impl KubeClusterView {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using a kubeconfig file or the in-cluster environment
    pub async fn connect(options: &ConnectOptions) -> Result<Self, ClusterError> {
        Ok(Self::new(connect(options).await?))
    }

    async fn list_deployments(
        &self,
        namespace: &str,
        params: &ListParams,
    ) -> Result<Vec<Deployment>, ClusterError> {
        let deployments: Api<Deployment> = Api::namespaced(self.client.clone(), namespace);
        let list = deployments
            .list(params)
            .await
            .map_err(|e| ClusterError::api("deployments", e))?;
        debug!(namespace, count = list.items.len(), "Listed deployments");
        Ok(list.items)
    }
}

impl ClusterView for KubeClusterView {
    type Error = ClusterError;

    async fn list_platform_workloads(
        &self,
        namespace: &str,
    ) -> Result<Vec<Deployment>, ClusterError> {
        let params = ListParams::default().labels(PLATFORM_SELECTOR);
        self.list_deployments(namespace, &params).await
    }

    async fn list_namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        let namespaces: Api<Namespace> = Api::all(self.client.clone());
        let list = namespaces
            .list(&ListParams::default())
            .await
            .map_err(|e| ClusterError::api("namespaces", e))?;
        Ok(list.items)
    }

    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        self.list_deployments(namespace, &ListParams::default()).await
    }

    async fn server_version(&self) -> Result<String, ClusterError> {
        let info = self
            .client
            .apiserver_version()
            .await
            .map_err(|e| ClusterError::api("server version", e))?;
        Ok(info.git_version)
    }
}
