//! faas-checker-kube: Kubernetes access for faas-checker
//!
//! Loads credentials (kubeconfig or in-cluster) and implements
//! [`faas_checker_core::ClusterView`] on top of kube-rs.

pub mod config;
pub mod error;
pub mod view;

pub use config::{ConnectOptions, DEFAULT_KUBECONFIG, connect, expand_home, resolve_kubeconfig_path};
pub use error::ClusterError;
pub use view::KubeClusterView;
