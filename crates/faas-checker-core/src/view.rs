//! Read-only view of the cluster
//!
//! The extractor never talks to the Kubernetes API directly. Everything it
//! needs comes through [`ClusterView`], which narrows the API down to four
//! reads and returns the raw resources untouched.

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Namespace;

/// Label selector carried by every OpenFaaS control-plane deployment
pub const PLATFORM_SELECTOR: &str = "app=openfaas";

/// The four reads the inspection needs
///
/// Implementations must not filter or rewrite what the API returns, and
/// repeated calls against an unchanged cluster must return the same data in
/// the same order.
#[allow(async_fn_in_trait)]
pub trait ClusterView {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Control-plane deployments in the platform namespace matching
    /// [`PLATFORM_SELECTOR`]
    async fn list_platform_workloads(&self, namespace: &str)
    -> Result<Vec<Deployment>, Self::Error>;

    /// Every namespace in the cluster
    async fn list_namespaces(&self) -> Result<Vec<Namespace>, Self::Error>;

    /// All deployments in a namespace
    async fn list_workloads(&self, namespace: &str) -> Result<Vec<Deployment>, Self::Error>;

    /// Version string reported by the API server
    async fn server_version(&self) -> Result<String, Self::Error>;
}
