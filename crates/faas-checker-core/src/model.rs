//! Domain types for faas-checker
//!
//! These types represent an OpenFaaS installation as read from a single
//! snapshot of the cluster. They are built once by the extractor and never
//! mutated afterwards.

use std::collections::BTreeMap;

/// Namespace that always hosts functions, even when nothing is deployed there
pub const DEFAULT_FUNCTION_NAMESPACE: &str = "openfaas-fn";

/// Namespace whose presence signals an Istio service mesh
pub const SERVICE_MESH_NAMESPACE: &str = "istio-system";

/// Namespace annotation key that marks a function namespace (value ignored)
pub const FUNCTION_NAMESPACE_ANNOTATION: &str = "openfaas";

/// Placeholder shown for fields that were not configured
pub const NOT_SET: &str = "<not set>";

/// Quantity string used for resources that were not requested
pub const UNSET_QUANTITY: &str = "0";

/// Root record describing everything found in the cluster
#[derive(Debug, Clone, Default)]
pub struct PlatformInstallation {
    pub orchestrator_version: String,
    pub core_namespace_present: bool,
    pub service_mesh_present: bool,
    /// Sorted, deduplicated, always contains [`DEFAULT_FUNCTION_NAMESPACE`]
    pub function_namespaces: Vec<String>,
    pub gateway: Option<Gateway>,
    pub controller: Option<Controller>,
    pub queue_worker: Option<QueueWorker>,
    pub autoscaler: Option<Autoscaler>,
    pub dashboard: Option<Dashboard>,
    pub internal_messaging: Option<InternalMessaging>,
    pub functions_by_namespace: BTreeMap<String, Vec<Function>>,
}

impl PlatformInstallation {
    /// Asynchronous invocations are available when a queue-worker is deployed
    pub fn async_enabled(&self) -> bool {
        self.queue_worker.is_some()
    }

    /// Total in-flight async invocations the queue-workers accept
    pub fn async_concurrency(&self) -> u64 {
        self.queue_worker
            .as_ref()
            .map(QueueWorker::concurrency)
            .unwrap_or(0)
    }

    pub fn operator_mode(&self) -> bool {
        self.controller
            .as_ref()
            .is_some_and(|c| c.mode == ControllerMode::Operator)
    }

    pub fn pro_gateway(&self) -> bool {
        self.gateway.as_ref().is_some_and(|g| g.pro_variant)
    }

    pub fn jetstream(&self) -> bool {
        self.queue_worker
            .as_ref()
            .is_some_and(|q| q.jetstream_variant)
    }

    /// Functions of a namespace, in listing order
    pub fn functions(&self, namespace: &str) -> &[Function] {
        self.functions_by_namespace
            .get(namespace)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Feature checklist in report order
    pub fn features(&self) -> [Feature; 8] {
        let gateway_replicas = self.gateway.as_ref().map(|g| g.replicas).unwrap_or(0);

        [
            Feature::new("Async", self.async_enabled()),
            Feature::new("Pro gateway", self.pro_gateway()),
            Feature::new("HA Gateway", gateway_replicas >= crate::rules::MIN_HA_REPLICAS),
            Feature::new("Operator mode", self.operator_mode()),
            Feature::new("Autoscaler", self.autoscaler.is_some()),
            Feature::new("Dashboard", self.dashboard.is_some()),
            Feature::new("JetStream", self.jetstream()),
            Feature::new("Istio", self.service_mesh_present),
        ]
    }
}

/// One entry of the "Features detected" checklist
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    pub name: &'static str,
    pub enabled: bool,
}

impl Feature {
    fn new(name: &'static str, enabled: bool) -> Self {
        Self { name, enabled }
    }

    pub fn symbol(&self) -> &'static str {
        if self.enabled { "✅" } else { "❌" }
    }
}

/// Ingress for synchronous invocations
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gateway {
    pub image: String,
    pub replicas: u32,
    pub pro_variant: bool,
    pub read_timeout: Option<String>,
    pub write_timeout: Option<String>,
    pub upstream_timeout: Option<String>,
    pub direct_functions: Option<bool>,
    pub probe_functions: Option<bool>,
}

/// The two exclusive ways function workloads are reconciled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerMode {
    FaasNetes,
    Operator,
}

impl ControllerMode {
    /// Map a container name in the gateway workload to a controller mode
    pub fn from_container(name: &str) -> Option<Self> {
        match name {
            "faas-netes" => Some(ControllerMode::FaasNetes),
            "operator" => Some(ControllerMode::Operator),
            _ => None,
        }
    }
}

impl std::fmt::Display for ControllerMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ControllerMode::FaasNetes => write!(f, "faas-netes"),
            ControllerMode::Operator => write!(f, "operator"),
        }
    }
}

/// faas-netes or operator sidecar of the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Controller {
    pub mode: ControllerMode,
    pub image: String,
    pub read_timeout: Option<String>,
    pub write_timeout: Option<String>,
    pub set_nonroot_user: Option<bool>,
    pub cluster_role: Option<bool>,
}

/// Asynchronous invocation executor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueWorker {
    pub image: String,
    pub replicas: u32,
    pub ack_wait: Option<String>,
    pub max_inflight: Option<u32>,
    pub jetstream_variant: bool,
}

impl QueueWorker {
    pub fn concurrency(&self) -> u64 {
        u64::from(self.replicas) * u64::from(self.max_inflight.unwrap_or(0))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Autoscaler {
    pub image: String,
    pub replicas: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    pub image: String,
    pub jwt_secret_mounted: bool,
}

/// Marker for the in-cluster NATS deployment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InternalMessaging;

/// Memory and CPU quantities, `"0"` meaning unset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resources {
    pub memory: String,
    pub cpu: String,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            memory: UNSET_QUANTITY.to_string(),
            cpu: UNSET_QUANTITY.to_string(),
        }
    }
}

impl Resources {
    pub fn is_empty(&self) -> bool {
        self.memory == UNSET_QUANTITY && self.cpu == UNSET_QUANTITY
    }

    pub fn memory_label(&self) -> &str {
        quantity_label(&self.memory)
    }

    pub fn cpu_label(&self) -> &str {
        quantity_label(&self.cpu)
    }
}

fn quantity_label(quantity: &str) -> &str {
    if quantity == UNSET_QUANTITY {
        "<none>"
    } else {
        quantity
    }
}

/// A deployed function
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Function {
    pub namespace: String,
    pub name: String,
    pub replicas: u32,
    pub max_inflight: Option<u32>,
    pub read_timeout: Option<String>,
    pub write_timeout: Option<String>,
    pub exec_timeout: Option<String>,
    pub requests: Resources,
    pub limits: Resources,
    pub read_only_root_filesystem: bool,
    pub scaling: Option<Scaling>,
}

impl Function {
    /// `name.namespace`, as used in warnings
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.name, self.namespace)
    }

    pub fn scales_to_zero(&self) -> bool {
        self.scaling
            .as_ref()
            .is_some_and(|s| s.zero.as_deref() == Some("true"))
    }
}

/// Autoscaling labels of a function
///
/// See <https://docs.openfaas.com/architecture/autoscaling/>.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scaling {
    pub min: Option<i64>,
    pub max: Option<i64>,
    pub scale_type: Option<String>,
    pub target: Option<String>,
    pub proportion: Option<String>,
    pub zero: Option<String>,
    pub zero_duration: Option<String>,
}

impl Scaling {
    /// `(min / max)` with missing bounds shown as `<not set>`
    pub fn bounds_label(&self) -> String {
        format!("({} / {})", int_label(self.min), int_label(self.max))
    }

    /// Whether scale to zero is switched on
    pub fn zero_enabled(&self) -> bool {
        !matches!(self.zero.as_deref(), None | Some("false"))
    }
}

/// Render an optional value, falling back to `<not set>`
pub fn or_not_set(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => NOT_SET,
    }
}

fn int_label(value: Option<i64>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| NOT_SET.to_string())
}
