//! Inspection pipeline
//!
//! Issues the cluster reads one after another and hands the raw resources
//! to the extractor. The result is a single immutable snapshot.

use crate::error::CheckError;
use crate::extract::{classify_namespaces, extract_functions, extract_platform};
use crate::model::PlatformInstallation;
use crate::view::ClusterView;
use std::collections::BTreeMap;
use tracing::{debug, info};

/// Build the installation model from a cluster view
///
/// The namespace listing comes first so that a missing platform namespace
/// is reported before any workload is read.
pub async fn inspect<V: ClusterView>(
    view: &V,
    platform_namespace: &str,
) -> Result<PlatformInstallation, CheckError> {
    let namespaces = view.list_namespaces().await.map_err(cluster_error)?;
    debug!(count = namespaces.len(), "Listed namespaces");

    let summary = classify_namespaces(&namespaces, platform_namespace);
    if !summary.core_namespace_present {
        return Err(CheckError::NamespaceNotFound(platform_namespace.to_string()));
    }

    let platform_workloads = view
        .list_platform_workloads(platform_namespace)
        .await
        .map_err(cluster_error)?;
    debug!(count = platform_workloads.len(), "Listed platform workloads");
    let components = extract_platform(&platform_workloads)?;

    let mut functions_by_namespace = BTreeMap::new();
    for namespace in &summary.function_namespaces {
        let workloads = view.list_workloads(namespace).await.map_err(cluster_error)?;
        debug!(namespace = %namespace, count = workloads.len(), "Listed function workloads");
        functions_by_namespace.insert(namespace.clone(), extract_functions(namespace, &workloads));
    }

    let orchestrator_version = view.server_version().await.map_err(cluster_error)?;

    info!(
        namespaces = summary.function_namespaces.len(),
        version = %orchestrator_version,
        "Inspection complete"
    );

    Ok(PlatformInstallation {
        orchestrator_version,
        core_namespace_present: summary.core_namespace_present,
        service_mesh_present: summary.service_mesh_present,
        function_namespaces: summary.function_namespaces,
        gateway: components.gateway,
        controller: components.controller,
        queue_worker: components.queue_worker,
        autoscaler: components.autoscaler,
        dashboard: components.dashboard,
        internal_messaging: components.internal_messaging,
        functions_by_namespace,
    })
}

fn cluster_error<E>(err: E) -> CheckError
where
    E: std::error::Error + Send + Sync + 'static,
{
    CheckError::Cluster(Box::new(err))
}
