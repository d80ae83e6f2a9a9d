//! Namespace classification

use crate::model::{
    DEFAULT_FUNCTION_NAMESPACE, FUNCTION_NAMESPACE_ANNOTATION, SERVICE_MESH_NAMESPACE,
};
use k8s_openapi::api::core::v1::Namespace;
use std::collections::BTreeSet;
use tracing::debug;

/// What the namespace listing tells us about the installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceSummary {
    pub core_namespace_present: bool,
    pub service_mesh_present: bool,
    /// Sorted ascending, always contains `openfaas-fn` exactly once
    pub function_namespaces: Vec<String>,
}

/// Classify the cluster namespaces
///
/// A namespace hosts functions when it is `openfaas-fn` or carries the
/// `openfaas` annotation, whatever its value.
pub fn classify_namespaces(namespaces: &[Namespace], platform_namespace: &str) -> NamespaceSummary {
    let mut core_namespace_present = false;
    let mut service_mesh_present = false;
    let mut function_namespaces = BTreeSet::from([DEFAULT_FUNCTION_NAMESPACE.to_string()]);

    for namespace in namespaces {
        let Some(name) = namespace.metadata.name.as_deref() else {
            continue;
        };

        if name == platform_namespace {
            core_namespace_present = true;
        }
        if name == SERVICE_MESH_NAMESPACE {
            service_mesh_present = true;
        }

        let annotated = namespace
            .metadata
            .annotations
            .as_ref()
            .is_some_and(|annotations| annotations.contains_key(FUNCTION_NAMESPACE_ANNOTATION));
        if annotated {
            debug!(namespace = name, "Found annotated function namespace");
            function_namespaces.insert(name.to_string());
        }
    }

    NamespaceSummary {
        core_namespace_present,
        service_mesh_present,
        function_namespaces: function_namespaces.into_iter().collect(),
    }
}
