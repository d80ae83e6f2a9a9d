//! Connection settings and client construction
//!
//! A kubeconfig file on disk wins. When the file is missing the in-cluster
//! service account is tried instead, so the checker can also run as a pod.

use crate::error::ClusterError;
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default kubeconfig location, before home expansion
pub const DEFAULT_KUBECONFIG: &str = "$HOME/.kube/config";

/// Where and how to connect
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    /// Kubeconfig path, `$HOME` and `~` are expanded
    pub kubeconfig: String,
    /// Kubeconfig context, the current context when unset
    pub context: Option<String>,
}

impl ConnectOptions {
    pub fn new(kubeconfig: impl Into<String>) -> Self {
        Self {
            kubeconfig: kubeconfig.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }
}

/// Replace every `$HOME` and `~` in a path with the home directory
///
/// Paths without either marker are returned untouched and never need a home
/// directory.
pub fn expand_home(raw: &str, home: Option<&Path>) -> Result<PathBuf, ClusterError> {
    if !raw.contains("$HOME") && !raw.contains('~') {
        return Ok(PathBuf::from(raw));
    }

    let home = home.ok_or(ClusterError::NoHomeDirectory)?;
    let home = home.to_string_lossy();
    Ok(PathBuf::from(
        raw.replace("$HOME", &home).replace('~', &home),
    ))
}

/// Expand a kubeconfig path against the current user's home directory
pub fn resolve_kubeconfig_path(raw: &str) -> Result<PathBuf, ClusterError> {
    expand_home(raw, dirs_next::home_dir().as_deref())
}

/// Build a client config from the kubeconfig, or from the in-cluster environment
pub async fn load_config(options: &ConnectOptions) -> Result<Config, ClusterError> {
    let path = resolve_kubeconfig_path(&options.kubeconfig)?;

    if !path.exists() {
        debug!(path = %path.display(), "Kubeconfig not found, trying in-cluster config");
        return Config::incluster().map_err(|e| ClusterError::InCluster(e.to_string()));
    }

    debug!(path = %path.display(), context = ?options.context, "Loading kubeconfig");
    let kubeconfig = Kubeconfig::read_from(&path).map_err(|e| ClusterError::KubeconfigRead {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;

    let kube_options = KubeConfigOptions {
        context: options.context.clone(),
        ..Default::default()
    };
    Config::from_custom_kubeconfig(kubeconfig, &kube_options)
        .await
        .map_err(|e| ClusterError::KubeconfigParse(e.to_string()))
}

/// Create a Kubernetes client
pub async fn connect(options: &ConnectOptions) -> Result<Client, ClusterError> {
    let config = load_config(options).await?;
    debug!(cluster_url = %config.cluster_url, "Creating K8s client");
    Client::try_from(config).map_err(|e| ClusterError::ClientCreate(e.to_string()))
}
