//! Error types for faas-checker-core

use thiserror::Error;

/// Fatal conditions that stop a report from being produced
#[derive(Error, Debug)]
pub enum CheckError {
    /// The platform namespace is missing from the cluster
    #[error("OpenFaaS Core namespace \"{0}\" not found")]
    NamespaceNotFound(String),

    /// A control-plane boolean environment variable could not be parsed
    #[error("Error parsing {component} {key}: invalid boolean \"{value}\"")]
    InvalidBool {
        component: &'static str,
        key: &'static str,
        value: String,
    },

    /// A control-plane duration needed by the rules could not be parsed
    #[error("Unable to parse {component} {key} \"{value}\": {source}")]
    InvalidDuration {
        component: &'static str,
        key: &'static str,
        value: String,
        #[source]
        source: crate::duration::ParseDurationError,
    },

    /// The gateway has no upstream_timeout to compare against
    #[error("Unable to read gateway upstream_timeout: not set")]
    MissingGatewayTimeout,

    /// Reading from the cluster failed
    #[error("Cluster read failed: {0}")]
    Cluster(#[source] Box<dyn std::error::Error + Send + Sync>),
}
