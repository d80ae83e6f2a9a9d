//! faas-checker-core: inspection model, diagnostic rules and report
//!
//! The pipeline is strictly linear:
//!
//! 1. [`inspect`] reads the cluster through a [`ClusterView`] and extracts a
//!    [`PlatformInstallation`]
//! 2. [`RuleSet`] checks it against best-practice thresholds
//! 3. [`Report`] prints the configuration followed by the warnings

pub mod duration;
pub mod error;
pub mod extract;
pub mod inspect;
pub mod model;
pub mod report;
pub mod rules;
pub mod view;

pub use duration::{Duration, ParseDurationError};
pub use error::CheckError;
pub use inspect::inspect;
pub use model::*;
pub use report::Report;
pub use rules::{Rule, RuleSet, Warning, evaluate};
pub use view::{ClusterView, PLATFORM_SELECTOR};
