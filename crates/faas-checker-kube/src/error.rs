//! Error types for faas-checker-kube

use thiserror::Error;

/// Errors that can occur while connecting to or reading from the cluster
#[derive(Error, Debug)]
pub enum ClusterError {
    /// Kubeconfig file could not be read
    #[error("Failed to read kubeconfig {path}: {message}")]
    KubeconfigRead { path: String, message: String },

    /// Kubeconfig was read but could not be turned into a client config
    #[error("Failed to load kubeconfig: {0}")]
    KubeconfigParse(String),

    /// No kubeconfig and no in-cluster service account
    #[error("Failed to load in-cluster config: {0}")]
    InCluster(String),

    /// Client construction failed
    #[error("Failed to create K8s client: {0}")]
    ClientCreate(String),

    /// A list or version request failed
    #[error("K8s API error listing {resource}: {message}")]
    Api {
        resource: &'static str,
        message: String,
    },

    /// No home directory found
    #[error("Could not determine home directory")]
    NoHomeDirectory,
}

impl ClusterError {
    pub(crate) fn api(resource: &'static str, err: kube::Error) -> Self {
        ClusterError::Api {
            resource,
            message: err.to_string(),
        }
    }
}
