//! Extraction of the inspection model from raw cluster resources
//!
//! Everything here is a pure function over `k8s-openapi` types: no I/O and
//! no formatting. Durations are kept as the strings found in the cluster and
//! only parsed when the rules need them.
//!
//! - `namespaces.rs` - function namespace classification
//! - `platform.rs` - control-plane components (gateway, queue-worker, ...)
//! - `functions.rs` - function deployments

mod functions;
mod namespaces;
mod platform;

pub use functions::{
    SCALE_MAX_LABEL, SCALE_MIN_LABEL, SCALE_PROPORTION_LABEL, SCALE_TARGET_LABEL,
    SCALE_TYPE_LABEL, SCALE_ZERO_DURATION_LABEL, SCALE_ZERO_LABEL, extract_functions,
};
pub use namespaces::{NamespaceSummary, classify_namespaces};
pub use platform::{
    PlatformComponents, extract_platform, is_jetstream_image, is_pro_component, is_pro_image,
};

use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use std::collections::BTreeMap;

/// Desired replica count of a deployment
fn replicas(workload: &Deployment) -> u32 {
    let desired = workload
        .spec
        .as_ref()
        .and_then(|spec| spec.replicas)
        // apiserver default when the field is omitted
        .unwrap_or(1);
    u32::try_from(desired).unwrap_or(0)
}

fn workload_name(workload: &Deployment) -> &str {
    workload.metadata.name.as_deref().unwrap_or_default()
}

fn containers(workload: &Deployment) -> &[Container] {
    workload
        .spec
        .as_ref()
        .and_then(|spec| spec.template.spec.as_ref())
        .map(|pod| pod.containers.as_slice())
        .unwrap_or(&[])
}

/// Container with the given name, or the first container as a fallback
fn named_container<'a>(workload: &'a Deployment, name: &str) -> Option<&'a Container> {
    let containers = containers(workload);
    containers
        .iter()
        .find(|c| c.name == name)
        .or_else(|| containers.first())
}

fn template_labels(workload: &Deployment) -> Option<&BTreeMap<String, String>> {
    workload
        .spec
        .as_ref()
        .and_then(|spec| spec.template.metadata.as_ref())
        .and_then(|meta| meta.labels.as_ref())
}

/// Literal environment values of a container
///
/// Entries populated through `valueFrom` carry no literal value and are
/// skipped.
fn env_values(container: &Container) -> impl Iterator<Item = (&str, &str)> {
    container
        .env
        .iter()
        .flatten()
        .filter_map(|env| env.value.as_deref().map(|value| (env.name.as_str(), value)))
}

fn has_volume_mount(container: &Container, name: &str) -> bool {
    container
        .volume_mounts
        .iter()
        .flatten()
        .any(|mount| mount.name == name)
}

fn image(container: &Container) -> String {
    container.image.clone().unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Builders for the deployments used across extractor tests

    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
    use k8s_openapi::api::core::v1::{
        Container, EnvVar, PodSpec, PodTemplateSpec, VolumeMount,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    pub fn container(name: &str, image: &str) -> Container {
        Container {
            name: name.to_string(),
            image: Some(image.to_string()),
            ..Default::default()
        }
    }

    pub fn with_env(mut container: Container, env: &[(&str, &str)]) -> Container {
        container.env = Some(
            env.iter()
                .map(|(name, value)| EnvVar {
                    name: name.to_string(),
                    value: Some(value.to_string()),
                    ..Default::default()
                })
                .collect(),
        );
        container
    }

    pub fn with_mount(mut container: Container, name: &str) -> Container {
        container
            .volume_mounts
            .get_or_insert_with(Vec::new)
            .push(VolumeMount {
                name: name.to_string(),
                mount_path: format!("/var/secrets/{}", name),
                ..Default::default()
            });
        container
    }

    pub fn deployment(name: &str, replicas: i32, containers: Vec<Container>) -> Deployment {
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas: Some(replicas),
                template: PodTemplateSpec {
                    metadata: None,
                    spec: Some(PodSpec {
                        containers,
                        ..Default::default()
                    }),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    pub fn with_labels(mut deployment: Deployment, labels: &[(&str, &str)]) -> Deployment {
        if let Some(spec) = deployment.spec.as_mut() {
            let meta = spec.template.metadata.get_or_insert_with(Default::default);
            let map = meta.labels.get_or_insert_with(Default::default);
            for (key, value) in labels {
                map.insert(key.to_string(), value.to_string());
            }
        }
        deployment
    }
}
