//! Diagnostic rules
//!
//! Rules compare the extracted installation against operational thresholds
//! and cross-component constraints. They run in a fixed order: the global
//! rules first, then for each function namespace (sorted) the per-function
//! rules in listing order followed by the namespace aggregates.
//!
//! Control-plane durations are resolved once in [`RuleSet::prepare`]; after
//! that evaluation cannot fail.

use crate::duration::Duration;
use crate::error::CheckError;
use crate::model::{Function, PlatformInstallation, UNSET_QUANTITY};
use tracing::debug;

/// Replicas needed for a component to be considered highly available
pub const MIN_HA_REPLICAS: u32 = 3;

/// Cluster-wide async concurrency below which queue-workers are undersized
pub const MIN_ASYNC_CONCURRENCY: u64 = 100;

/// Per-replica queue-worker concurrency above which invocations may starve
pub const MAX_QUEUE_INFLIGHT: u32 = 500;

/// Shortest idle period recommended before scaling a function to zero
pub const MIN_SCALE_DOWN_IDLE: Duration = Duration::from_mins(5);

const JETSTREAM_ANNOUNCEMENT: &str = "https://www.openfaas.com/blog/jetstream-for-openfaas/";
const DASHBOARD_SIGNING_KEY_DOCS: &str =
    "https://docs.openfaas.com/openfaas-pro/dashboard/#create-a-signing-key";

/// Every rule the engine knows, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rule {
    AckWaitExceedsUpstream,
    AsyncConcurrencyLow,
    QueueMaxInflightHigh,
    QueueWorkerNotHa,
    InternalMessaging,
    GatewayNotHa,
    ClassicMessaging,
    MeshDirectFunctions,
    MeshProbeFunctions,
    AutoscalerClusterRole,
    AutoscalerReplicas,
    OperatorMode,
    ProGatewayWithoutAutoscaler,
    NonRootUser,
    DashboardSigningKey,
    ScaleDownTooSoon,
    FunctionReadTimeout,
    FunctionWriteTimeout,
    FunctionExecTimeout,
    FunctionMemoryRequests,
    NamespaceNoScaleToZero,
    NamespaceWritableRootfs,
}

/// A single finding, printed as one line of the report
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub rule: Rule,
    pub message: String,
}

impl Warning {
    fn new(rule: Rule, message: impl Into<String>) -> Self {
        Self {
            rule,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Rules bound to an installation with its control-plane durations resolved
#[derive(Debug, Clone)]
pub struct RuleSet<'a> {
    installation: &'a PlatformInstallation,
    upstream_timeout: Duration,
    ack_wait: Option<Duration>,
}

impl<'a> RuleSet<'a> {
    /// Resolve the durations the rules compare against
    ///
    /// The gateway upstream_timeout must be set and valid. The queue-worker
    /// ack_wait, when set, must be valid.
    pub fn prepare(installation: &'a PlatformInstallation) -> Result<Self, CheckError> {
        let upstream = installation
            .gateway
            .as_ref()
            .and_then(|gateway| gateway.upstream_timeout.as_deref())
            .filter(|value| !value.is_empty())
            .ok_or(CheckError::MissingGatewayTimeout)?;
        let upstream_timeout = parse_control_plane("gateway", "upstream_timeout", upstream)?;

        let ack_wait = installation
            .queue_worker
            .as_ref()
            .and_then(|queue_worker| queue_worker.ack_wait.as_deref())
            .filter(|value| !value.is_empty())
            .map(|value| parse_control_plane("queue-worker", "ack_wait", value))
            .transpose()?;

        debug!(%upstream_timeout, ?ack_wait, "Resolved control-plane timeouts");

        Ok(Self {
            installation,
            upstream_timeout,
            ack_wait,
        })
    }

    /// Run every rule and collect the warnings in rule order
    pub fn evaluate(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();

        self.global_rules(&mut warnings);
        for namespace in &self.installation.function_namespaces {
            self.namespace_rules(namespace, self.installation.functions(namespace), &mut warnings);
        }

        debug!(count = warnings.len(), "Evaluated rules");
        warnings
    }

    fn global_rules(&self, warnings: &mut Vec<Warning>) {
        let installation = self.installation;
        let controller = installation.controller.as_ref();

        if let Some(queue_worker) = &installation.queue_worker {
            if let (Some(ack_wait), Some(raw)) = (self.ack_wait, queue_worker.ack_wait.as_deref()) {
                if ack_wait > self.upstream_timeout {
                    warnings.push(Warning::new(
                        Rule::AckWaitExceedsUpstream,
                        format!(
                            "queue-worker ack_wait ({}) must be <= gateway.upstream_timeout ({})",
                            raw, self.upstream_timeout
                        ),
                    ));
                }
            }

            let concurrency = queue_worker.concurrency();
            if concurrency < MIN_ASYNC_CONCURRENCY {
                warnings.push(Warning::new(
                    Rule::AsyncConcurrencyLow,
                    format!(
                        "queue-worker maximum concurrency is ({}), this may be too low",
                        concurrency
                    ),
                ));
            }

            if let Some(max_inflight) = queue_worker
                .max_inflight
                .filter(|inflight| *inflight > MAX_QUEUE_INFLIGHT)
            {
                warnings.push(Warning::new(
                    Rule::QueueMaxInflightHigh,
                    format!(
                        "queue-worker max_inflight is ({}), this may be too high",
                        max_inflight
                    ),
                ));
            }

            if queue_worker.replicas < MIN_HA_REPLICAS {
                warnings.push(Warning::new(
                    Rule::QueueWorkerNotHa,
                    format!(
                        "queue-worker replicas want >= {} but got {}, (not Highly Available (HA))",
                        MIN_HA_REPLICAS, queue_worker.replicas
                    ),
                ));
            }

            if installation.internal_messaging.is_some() {
                warnings.push(Warning::new(
                    Rule::InternalMessaging,
                    "Use external NATS to ensure high-availability and persistence",
                ));
            }
        }

        let gateway_replicas = installation
            .gateway
            .as_ref()
            .map(|gateway| gateway.replicas)
            .unwrap_or(0);
        if gateway_replicas < MIN_HA_REPLICAS {
            warnings.push(Warning::new(
                Rule::GatewayNotHa,
                format!(
                    "gateway replicas want >= {} but got {}, (not Highly Available (HA))",
                    MIN_HA_REPLICAS, gateway_replicas
                ),
            ));
        }

        if installation
            .queue_worker
            .as_ref()
            .is_some_and(|queue_worker| !queue_worker.jetstream_variant)
        {
            warnings.push(Warning::new(
                Rule::ClassicMessaging,
                format!(
                    "NATS Streaming will be deprecated and replaced with NATS JetStream: {}",
                    JETSTREAM_ANNOUNCEMENT
                ),
            ));
        }

        if installation.service_mesh_present {
            let gateway = installation.gateway.as_ref();
            if gateway.and_then(|g| g.direct_functions) != Some(true) {
                warnings.push(Warning::new(
                    Rule::MeshDirectFunctions,
                    "Istio detected, but direct_functions is disabled",
                ));
            }
            if gateway.and_then(|g| g.probe_functions) != Some(true) {
                warnings.push(Warning::new(
                    Rule::MeshProbeFunctions,
                    "Istio detected, but probe_functions is disabled",
                ));
            }
        }

        if let Some(autoscaler) = &installation.autoscaler {
            if controller.and_then(|c| c.cluster_role) != Some(true) {
                warnings.push(Warning::new(
                    Rule::AutoscalerClusterRole,
                    "Pro autoscaler detected, but cluster_role is disabled - unable to collect CPU/RAM metrics",
                ));
            }
            if autoscaler.replicas > 1 {
                warnings.push(Warning::new(
                    Rule::AutoscalerReplicas,
                    "autoscaler replicas should be 1 to prevent double scaling actions",
                ));
            }
        }

        if !installation.operator_mode() {
            warnings.push(Warning::new(
                Rule::OperatorMode,
                "Operator mode is not enabled, OpenFaaS Pro customers should use the OpenFaaS operator",
            ));
        }

        if installation.pro_gateway() && installation.autoscaler.is_none() {
            warnings.push(Warning::new(
                Rule::ProGatewayWithoutAutoscaler,
                "Pro gateway detected, but autoscaler is not enabled",
            ));
        }

        if controller.and_then(|c| c.set_nonroot_user) != Some(true) {
            warnings.push(Warning::new(
                Rule::NonRootUser,
                "Non-root flag is not set for the controller/operator",
            ));
        }

        if installation
            .dashboard
            .as_ref()
            .is_some_and(|dashboard| !dashboard.jwt_secret_mounted)
        {
            warnings.push(Warning::new(
                Rule::DashboardSigningKey,
                format!(
                    "Dashboard uses auto generated signing keys: {}",
                    DASHBOARD_SIGNING_KEY_DOCS
                ),
            ));
        }
    }

    fn namespace_rules(
        &self,
        namespace: &str,
        functions: &[Function],
        warnings: &mut Vec<Warning>,
    ) {
        for function in functions {
            self.function_rules(function, warnings);
        }

        if !functions.is_empty() && !functions.iter().any(Function::scales_to_zero) {
            warnings.push(Warning::new(
                Rule::NamespaceNoScaleToZero,
                format!(
                    "no functions in namespace {} are configured to scale down, this may be inefficient",
                    namespace
                ),
            ));
        }

        if functions.iter().any(|f| !f.read_only_root_filesystem) {
            warnings.push(Warning::new(
                Rule::NamespaceWritableRootfs,
                format!(
                    "at least one function in namespace {} does not set the file system to read-only",
                    namespace
                ),
            ));
        }
    }

    fn function_rules(&self, function: &Function, warnings: &mut Vec<Warning>) {
        let name = function.qualified_name();

        // An unparsable zero-duration is left to the autoscaler to reject
        let idle = function
            .scaling
            .as_ref()
            .and_then(|scaling| scaling.zero_duration.as_deref())
            .and_then(|raw| Duration::parse(raw).ok());
        if let Some(idle) = idle.filter(|idle| *idle < MIN_SCALE_DOWN_IDLE) {
            warnings.push(Warning::new(
                Rule::ScaleDownTooSoon,
                format!(
                    "{} scales down after {:.2} minutes, this may be too soon, 5 minutes or higher is recommended",
                    name,
                    idle.minutes()
                ),
            ));
        }

        // exec_timeout is echoed in canonical form, the HTTP timeouts verbatim
        let timeouts = [
            (Rule::FunctionReadTimeout, "read_timeout", &function.read_timeout, false),
            (Rule::FunctionWriteTimeout, "write_timeout", &function.write_timeout, false),
            (Rule::FunctionExecTimeout, "exec_timeout", &function.exec_timeout, true),
        ];
        for (rule, key, value, canonical) in timeouts {
            if let Some(message) = self.check_timeout(&name, key, value.as_deref(), canonical) {
                warnings.push(Warning::new(rule, message));
            }
        }

        if function.requests.memory == UNSET_QUANTITY {
            warnings.push(Warning::new(
                Rule::FunctionMemoryRequests,
                format!("{} no memory requests set", name),
            ));
        }
    }

    /// A function timeout must be set and fit within the gateway upstream timeout
    fn check_timeout(
        &self,
        name: &str,
        key: &str,
        value: Option<&str>,
        canonical: bool,
    ) -> Option<String> {
        let Some(raw) = value.filter(|v| !v.is_empty()) else {
            return Some(format!("{} {} is not set", name, key));
        };

        match Duration::parse(raw) {
            Ok(timeout) if timeout > self.upstream_timeout => {
                let shown = if canonical {
                    timeout.to_string()
                } else {
                    raw.to_string()
                };
                Some(format!(
                    "{} {} ({}) is greater than gateway.upstream_timeout ({})",
                    name, key, shown, self.upstream_timeout
                ))
            }
            Ok(_) => None,
            Err(_) => Some(format!("{} {} ({}) is not a valid duration", name, key, raw)),
        }
    }
}

/// Prepare and evaluate in one step
///
/// Fails before any rule runs, so callers never see a partial warning list.
pub fn evaluate(installation: &PlatformInstallation) -> Result<Vec<Warning>, CheckError> {
    Ok(RuleSet::prepare(installation)?.evaluate())
}

fn parse_control_plane(
    component: &'static str,
    key: &'static str,
    value: &str,
) -> Result<Duration, CheckError> {
    Duration::parse(value).map_err(|source| CheckError::InvalidDuration {
        component,
        key,
        value: value.to_string(),
        source,
    })
}
