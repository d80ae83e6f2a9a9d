//! Function deployments

use super::{containers, env_values, replicas, template_labels, workload_name};
use crate::model::{Function, Resources, Scaling, UNSET_QUANTITY};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use std::collections::BTreeMap;

pub const SCALE_MIN_LABEL: &str = "com.openfaas.scale.min";
pub const SCALE_MAX_LABEL: &str = "com.openfaas.scale.max";
pub const SCALE_TYPE_LABEL: &str = "com.openfaas.scale.type";
pub const SCALE_TARGET_LABEL: &str = "com.openfaas.scale.target";
pub const SCALE_PROPORTION_LABEL: &str = "com.openfaas.scale.target-proportion";
pub const SCALE_ZERO_LABEL: &str = "com.openfaas.scale.zero";
pub const SCALE_ZERO_DURATION_LABEL: &str = "com.openfaas.scale.zero-duration";

/// Read every deployment of a function namespace, keeping listing order
pub fn extract_functions(namespace: &str, workloads: &[Deployment]) -> Vec<Function> {
    workloads
        .iter()
        .map(|workload| extract_function(namespace, workload))
        .collect()
}

fn extract_function(namespace: &str, workload: &Deployment) -> Function {
    let mut function = Function {
        namespace: namespace.to_string(),
        name: workload_name(workload).to_string(),
        replicas: replicas(workload),
        scaling: template_labels(workload).and_then(read_scaling),
        ..Default::default()
    };

    // The first container is the function itself
    if let Some(container) = containers(workload).first() {
        read_container(container, &mut function);
    }

    function
}

fn read_container(container: &Container, function: &mut Function) {
    for (key, value) in env_values(container) {
        match key {
            "max_inflight" => function.max_inflight = value.parse().ok(),
            "read_timeout" => function.read_timeout = Some(value.to_string()),
            "write_timeout" => function.write_timeout = Some(value.to_string()),
            "exec_timeout" => function.exec_timeout = Some(value.to_string()),
            _ => {}
        }
    }

    if let Some(resources) = &container.resources {
        function.requests = read_resources(resources.requests.as_ref());
        function.limits = read_resources(resources.limits.as_ref());
    }

    function.read_only_root_filesystem = container
        .security_context
        .as_ref()
        .and_then(|ctx| ctx.read_only_root_filesystem)
        .unwrap_or(false);
}

fn read_resources(quantities: Option<&BTreeMap<String, Quantity>>) -> Resources {
    let quantity = |name: &str| {
        quantities
            .and_then(|q| q.get(name))
            .map(|q| q.0.clone())
            .unwrap_or_else(|| UNSET_QUANTITY.to_string())
    };

    Resources {
        memory: quantity("memory"),
        cpu: quantity("cpu"),
    }
}

/// Scaling configuration, present as soon as one scaling label is set
fn read_scaling(labels: &BTreeMap<String, String>) -> Option<Scaling> {
    let mut scaling = Scaling::default();
    let mut found = false;

    for (label, value) in labels {
        match label.as_str() {
            SCALE_MIN_LABEL => scaling.min = value.parse().ok(),
            SCALE_MAX_LABEL => scaling.max = value.parse().ok(),
            SCALE_TYPE_LABEL => scaling.scale_type = non_empty(value),
            SCALE_TARGET_LABEL => scaling.target = non_empty(value),
            SCALE_PROPORTION_LABEL => scaling.proportion = non_empty(value),
            SCALE_ZERO_LABEL => scaling.zero = non_empty(value),
            SCALE_ZERO_DURATION_LABEL => scaling.zero_duration = non_empty(value),
            _ => continue,
        }
        found = true;
    }

    found.then_some(scaling)
}

fn non_empty(value: &str) -> Option<String> {
    (!value.is_empty()).then(|| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;
    use k8s_openapi::api::core::v1::{ResourceRequirements, SecurityContext};

    fn function_workload() -> Deployment {
        let mut function = with_env(
            container("nodeinfo", "ghcr.io/openfaas/nodeinfo:latest"),
            &[
                ("fprocess", "node index.js"),
                ("max_inflight", "10"),
                ("read_timeout", "30s"),
                ("write_timeout", "30s"),
                ("exec_timeout", "25s"),
            ],
        );
        function.resources = Some(ResourceRequirements {
            requests: Some(BTreeMap::from([
                ("memory".to_string(), Quantity("128Mi".to_string())),
                ("cpu".to_string(), Quantity("100m".to_string())),
            ])),
            limits: Some(BTreeMap::from([(
                "memory".to_string(),
                Quantity("256Mi".to_string()),
            )])),
            ..Default::default()
        });
        function.security_context = Some(SecurityContext {
            read_only_root_filesystem: Some(true),
            ..Default::default()
        });

        deployment(
            "nodeinfo",
            2,
            vec![function, container("sidecar", "envoy")],
        )
    }

    #[test]
    fn test_extract_function_fields() {
        let functions = extract_functions("openfaas-fn", &[function_workload()]);
        assert_eq!(functions.len(), 1);

        let function = &functions[0];
        assert_eq!(function.name, "nodeinfo");
        assert_eq!(function.namespace, "openfaas-fn");
        assert_eq!(function.qualified_name(), "nodeinfo.openfaas-fn");
        assert_eq!(function.replicas, 2);
        assert_eq!(function.max_inflight, Some(10));
        assert_eq!(function.read_timeout.as_deref(), Some("30s"));
        assert_eq!(function.write_timeout.as_deref(), Some("30s"));
        assert_eq!(function.exec_timeout.as_deref(), Some("25s"));
        assert_eq!(function.requests.memory, "128Mi");
        assert_eq!(function.requests.cpu, "100m");
        assert_eq!(function.limits.memory, "256Mi");
        assert_eq!(function.limits.cpu, "0");
        assert!(function.read_only_root_filesystem);
        assert!(function.scaling.is_none());
    }

    #[test]
    fn test_missing_fields_are_unset() {
        let workload = deployment("bare", 1, vec![container("bare", "bare:latest")]);
        let function = &extract_functions("openfaas-fn", &[workload])[0];
        assert_eq!(function.max_inflight, None);
        assert_eq!(function.read_timeout, None);
        assert!(function.requests.is_empty());
        assert!(function.limits.is_empty());
        assert!(!function.read_only_root_filesystem);

        let empty = &extract_functions("openfaas-fn", &[deployment("empty", 1, vec![])])[0];
        assert_eq!(empty.name, "empty");
        assert!(empty.requests.is_empty());
    }

    #[test]
    fn test_unparsable_max_inflight_is_dropped() {
        let workload = deployment(
            "figlet",
            1,
            vec![with_env(container("figlet", "figlet"), &[("max_inflight", "-")])],
        );
        assert_eq!(extract_functions("fn", &[workload])[0].max_inflight, None);
    }

    #[test]
    fn test_scaling_present_iff_label_present() {
        let unrelated = with_labels(
            deployment("a", 1, vec![container("a", "a")]),
            &[("faas_function", "a")],
        );
        let zero_only = with_labels(
            deployment("b", 1, vec![container("b", "b")]),
            &[(SCALE_ZERO_LABEL, "true"), (SCALE_ZERO_DURATION_LABEL, "2m")],
        );
        let bad_min = with_labels(
            deployment("c", 1, vec![container("c", "c")]),
            &[(SCALE_MIN_LABEL, "one"), (SCALE_MAX_LABEL, "10")],
        );

        let functions = extract_functions("fn", &[unrelated, zero_only, bad_min]);
        assert!(functions[0].scaling.is_none());

        let scaling = functions[1].scaling.as_ref().unwrap();
        assert_eq!(scaling.zero.as_deref(), Some("true"));
        assert_eq!(scaling.zero_duration.as_deref(), Some("2m"));
        assert_eq!(scaling.min, None);
        assert!(functions[1].scales_to_zero());

        let scaling = functions[2].scaling.as_ref().unwrap();
        assert_eq!(scaling.min, None);
        assert_eq!(scaling.max, Some(10));
    }

    #[test]
    fn test_listing_order_is_preserved() {
        let workloads = [
            deployment("zeta", 1, vec![]),
            deployment("alpha", 1, vec![]),
        ];
        let names: Vec<_> = extract_functions("fn", &workloads)
            .into_iter()
            .map(|f| f.name)
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
