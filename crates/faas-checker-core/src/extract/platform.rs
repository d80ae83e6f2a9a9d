//! Control-plane components from the platform namespace

use super::{
    containers, env_values, has_volume_mount, image, named_container, replicas, workload_name,
};
use crate::error::CheckError;
use crate::model::{
    Autoscaler, Controller, ControllerMode, Dashboard, Gateway, InternalMessaging, QueueWorker,
};
use k8s_openapi::api::apps::v1::Deployment;
use k8s_openapi::api::core::v1::Container;
use tracing::debug;

/// Image path used for OpenFaaS Pro builds
const PRO_IMAGE_MARKER: &str = "openfaasltd";

/// Volume carrying the OpenFaaS Pro license
const LICENSE_VOLUME: &str = "license";

const JETSTREAM_IMAGE_MARKER: &str = "jetstream-queue-worker";

const DASHBOARD_JWT_VOLUME: &str = "dashboard-jwt";

/// Components found among the platform deployments
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformComponents {
    pub gateway: Option<Gateway>,
    pub controller: Option<Controller>,
    pub queue_worker: Option<QueueWorker>,
    pub autoscaler: Option<Autoscaler>,
    pub dashboard: Option<Dashboard>,
    pub internal_messaging: Option<InternalMessaging>,
}

/// Dispatch platform deployments by name into component records
///
/// Fails when a boolean environment variable on the gateway or controller
/// is not a recognised boolean.
pub fn extract_platform(workloads: &[Deployment]) -> Result<PlatformComponents, CheckError> {
    let mut components = PlatformComponents::default();

    for workload in workloads {
        match workload_name(workload) {
            "gateway" => extract_gateway(workload, &mut components)?,
            "queue-worker" => components.queue_worker = Some(extract_queue_worker(workload)),
            "autoscaler" => components.autoscaler = Some(extract_autoscaler(workload)),
            "dashboard" => components.dashboard = Some(extract_dashboard(workload)),
            "nats" => components.internal_messaging = Some(InternalMessaging),
            other => debug!(workload = other, "Skipping unrecognised platform workload"),
        }
    }

    Ok(components)
}

/// The gateway deployment also hosts the controller as a sidecar
fn extract_gateway(
    workload: &Deployment,
    components: &mut PlatformComponents,
) -> Result<(), CheckError> {
    let mut gateway = Gateway {
        replicas: replicas(workload),
        ..Default::default()
    };

    for container in containers(workload) {
        if container.name == "gateway" {
            gateway.image = image(container);
            gateway.pro_variant = is_pro_component(container);

            for (key, value) in env_values(container) {
                match key {
                    "read_timeout" => gateway.read_timeout = Some(value.to_string()),
                    "write_timeout" => gateway.write_timeout = Some(value.to_string()),
                    "upstream_timeout" => gateway.upstream_timeout = Some(value.to_string()),
                    "probe_functions" => {
                        gateway.probe_functions =
                            Some(parse_flag("gateway", "probe_functions", value)?)
                    }
                    "direct_functions" => {
                        gateway.direct_functions =
                            Some(parse_flag("gateway", "direct_functions", value)?)
                    }
                    _ => {}
                }
            }
        } else if let Some(mode) = ControllerMode::from_container(&container.name) {
            debug!(%mode, "Detected controller");
            components.controller = Some(extract_controller(container, mode)?);
        }
    }

    components.gateway = Some(gateway);
    Ok(())
}

fn extract_controller(
    container: &Container,
    mode: ControllerMode,
) -> Result<Controller, CheckError> {
    let mut controller = Controller {
        mode,
        image: image(container),
        read_timeout: None,
        write_timeout: None,
        set_nonroot_user: None,
        cluster_role: None,
    };

    for (key, value) in env_values(container) {
        match key {
            "read_timeout" => controller.read_timeout = Some(value.to_string()),
            "write_timeout" => controller.write_timeout = Some(value.to_string()),
            "set_nonroot_user" => {
                controller.set_nonroot_user =
                    Some(parse_flag("controller", "set_nonroot_user", value)?)
            }
            "cluster_role" => {
                controller.cluster_role = Some(parse_flag("controller", "cluster_role", value)?)
            }
            _ => {}
        }
    }

    Ok(controller)
}

fn extract_queue_worker(workload: &Deployment) -> QueueWorker {
    let mut queue_worker = QueueWorker {
        replicas: replicas(workload),
        ..Default::default()
    };

    if let Some(container) = named_container(workload, "queue-worker") {
        queue_worker.image = image(container);
        queue_worker.jetstream_variant = is_jetstream_image(&queue_worker.image);

        for (key, value) in env_values(container) {
            match key {
                "ack_wait" => queue_worker.ack_wait = Some(value.to_string()),
                // Unparsable values are treated as unset
                "max_inflight" => queue_worker.max_inflight = value.parse().ok(),
                _ => {}
            }
        }
    }

    queue_worker
}

fn extract_autoscaler(workload: &Deployment) -> Autoscaler {
    Autoscaler {
        image: named_container(workload, "autoscaler")
            .map(image)
            .unwrap_or_default(),
        replicas: replicas(workload),
    }
}

fn extract_dashboard(workload: &Deployment) -> Dashboard {
    let container = named_container(workload, "dashboard");
    Dashboard {
        image: container.map(image).unwrap_or_default(),
        jwt_secret_mounted: container.is_some_and(|c| has_volume_mount(c, DASHBOARD_JWT_VOLUME)),
    }
}

/// Parse a boolean environment value
///
/// Accepts `1`, `t`, `T`, `TRUE`, `true`, `True` and their false
/// counterparts; anything else is fatal.
fn parse_flag(component: &'static str, key: &'static str, value: &str) -> Result<bool, CheckError> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Ok(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Ok(false),
        _ => Err(CheckError::InvalidBool {
            component,
            key,
            value: value.to_string(),
        }),
    }
}

/// Image published under the OpenFaaS Pro registry path
pub fn is_pro_image(image: &str) -> bool {
    image.contains(PRO_IMAGE_MARKER)
}

/// Pro image or a mounted license, either is enough
pub fn is_pro_component(container: &Container) -> bool {
    container.image.as_deref().is_some_and(is_pro_image)
        || has_volume_mount(container, LICENSE_VOLUME)
}

pub fn is_jetstream_image(image: &str) -> bool {
    image.contains(JETSTREAM_IMAGE_MARKER)
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::*;
    use super::*;

    fn gateway_workload(gateway_env: &[(&str, &str)], controller: Container) -> Deployment {
        deployment(
            "gateway",
            3,
            vec![
                with_env(container("gateway", "ghcr.io/openfaas/gateway:0.27.0"), gateway_env),
                controller,
            ],
        )
    }

    #[test]
    fn test_is_pro_image() {
        assert!(!is_pro_image("ghcr.io/openfaas/gateway:0.23.2"));
        assert!(is_pro_image("ghcr.io/openfaasltd/gateway:0.2.0"));
    }

    #[test]
    fn test_pro_detection_via_license_mount() {
        let plain = container("gateway", "ghcr.io/openfaas/gateway:0.23.2");
        assert!(!is_pro_component(&plain));
        assert!(is_pro_component(&with_mount(plain, "license")));
        assert!(is_pro_component(&container("gateway", "ghcr.io/openfaasltd/gateway:0.2.0")));
    }

    #[test]
    fn test_is_jetstream_image() {
        assert!(is_jetstream_image("ghcr.io/openfaasltd/jetstream-queue-worker:0.3.0"));
        assert!(!is_jetstream_image("ghcr.io/openfaas/queue-worker:0.13.3"));
    }

    #[test]
    fn test_extract_gateway_and_operator() {
        let workload = gateway_workload(
            &[
                ("read_timeout", "65s"),
                ("write_timeout", "65s"),
                ("upstream_timeout", "60s"),
                ("direct_functions", "true"),
                ("probe_functions", "False"),
            ],
            with_env(
                container("operator", "ghcr.io/openfaasltd/faas-netes:0.5.0"),
                &[
                    ("read_timeout", "60s"),
                    ("write_timeout", "61s"),
                    ("set_nonroot_user", "1"),
                ],
            ),
        );

        let components = extract_platform(&[workload]).unwrap();
        let gateway = components.gateway.unwrap();
        assert_eq!(gateway.replicas, 3);
        assert!(!gateway.pro_variant);
        assert_eq!(gateway.upstream_timeout.as_deref(), Some("60s"));
        assert_eq!(gateway.direct_functions, Some(true));
        assert_eq!(gateway.probe_functions, Some(false));

        let controller = components.controller.unwrap();
        assert_eq!(controller.mode, ControllerMode::Operator);
        assert_eq!(controller.read_timeout.as_deref(), Some("60s"));
        assert_eq!(controller.write_timeout.as_deref(), Some("61s"));
        assert_eq!(controller.set_nonroot_user, Some(true));
        assert_eq!(controller.cluster_role, None);
    }

    #[test]
    fn test_invalid_boolean_is_fatal() {
        let workload = gateway_workload(
            &[("probe_functions", "yes")],
            container("faas-netes", "ghcr.io/openfaas/faas-netes:0.17.0"),
        );
        let err = extract_platform(&[workload]).unwrap_err();
        assert!(matches!(
            err,
            CheckError::InvalidBool { key: "probe_functions", ref value, .. } if value == "yes"
        ));

        let workload = gateway_workload(
            &[],
            with_env(
                container("faas-netes", "ghcr.io/openfaas/faas-netes:0.17.0"),
                &[("cluster_role", "")],
            ),
        );
        assert!(extract_platform(&[workload]).is_err());
    }

    #[test]
    fn test_extract_queue_worker() {
        let workload = deployment(
            "queue-worker",
            2,
            vec![with_env(
                container("queue-worker", "ghcr.io/openfaasltd/jetstream-queue-worker:0.3.0"),
                &[("ack_wait", "60s"), ("max_inflight", "fifty")],
            )],
        );
        let queue_worker = extract_platform(&[workload]).unwrap().queue_worker.unwrap();
        assert_eq!(queue_worker.replicas, 2);
        assert_eq!(queue_worker.ack_wait.as_deref(), Some("60s"));
        assert_eq!(queue_worker.max_inflight, None);
        assert!(queue_worker.jetstream_variant);
    }

    #[test]
    fn test_scaled_down_components_are_still_present() {
        let workloads = [
            deployment(
                "autoscaler",
                0,
                vec![container("autoscaler", "ghcr.io/openfaasltd/autoscaler:0.2.0")],
            ),
            deployment(
                "dashboard",
                1,
                vec![with_mount(
                    container("dashboard", "ghcr.io/openfaasltd/openfaas-dashboard:0.1.0"),
                    "dashboard-jwt",
                )],
            ),
            deployment("nats", 1, vec![container("nats", "nats-streaming:0.22.0")]),
            deployment("prometheus", 1, vec![container("prometheus", "prom/prometheus")]),
        ];
        let components = extract_platform(&workloads).unwrap();

        let autoscaler = components.autoscaler.unwrap();
        assert_eq!(autoscaler.replicas, 0);
        assert_eq!(autoscaler.image, "ghcr.io/openfaasltd/autoscaler:0.2.0");
        assert!(components.dashboard.unwrap().jwt_secret_mounted);
        assert!(components.internal_messaging.is_some());
        assert!(components.gateway.is_none());
        assert!(components.controller.is_none());
        assert!(components.queue_worker.is_none());
    }
}
