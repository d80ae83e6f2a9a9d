//! Plain-text report
//!
//! Sections are always written in the same order, so two runs against the
//! same snapshot produce identical output. Function blocks are column
//! aligned with elastic tabstops.

use crate::model::{Function, PlatformInstallation, Resources, or_not_set};
use crate::rules::Warning;
use std::io::{self, Write};
use tabwriter::TabWriter;

/// Prefix for every warning line
pub const WARNING_PREFIX: &str = "⚠️ ";

/// Report over an installation and the warnings raised against it
#[derive(Debug, Clone, Copy)]
pub struct Report<'a> {
    installation: &'a PlatformInstallation,
    warnings: &'a [Warning],
}

impl<'a> Report<'a> {
    pub fn new(installation: &'a PlatformInstallation, warnings: &'a [Warning]) -> Self {
        Self {
            installation,
            warnings,
        }
    }

    /// Render the whole report into a string
    pub fn render(&self) -> String {
        let mut buf = Vec::new();
        // Writing into a Vec cannot fail
        let _ = self.write_to(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// Write the report section by section
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "OpenFaaS Pro Report")?;

        self.write_gateway(out)?;
        self.write_queue_worker(out)?;
        self.write_namespaces(out)?;
        self.write_autoscaler(out)?;
        self.write_dashboard(out)?;
        self.write_features(out)?;
        self.write_other(out)?;
        self.write_functions(out)?;
        self.write_warnings(out)
    }

    fn write_gateway<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let gateway = self.installation.gateway.as_ref();
        let controller = self.installation.controller.as_ref();

        writeln!(out, "\nGateway\n")?;
        writeln!(
            out,
            "- gateway image: {}",
            or_not_set(gateway.map(|g| g.image.as_str()))
        )?;
        writeln!(
            out,
            "- controller image: {}",
            or_not_set(controller.map(|c| c.image.as_str()))
        )?;
        writeln!(
            out,
            "- gateway_replicas: {}",
            gateway.map(|g| g.replicas).unwrap_or(0)
        )?;
        writeln!(
            out,
            "- gateway_timeout - read: {} write: {} upstream: {}",
            or_not_set(gateway.and_then(|g| g.read_timeout.as_deref())),
            or_not_set(gateway.and_then(|g| g.write_timeout.as_deref())),
            or_not_set(gateway.and_then(|g| g.upstream_timeout.as_deref())),
        )?;
        writeln!(
            out,
            "- controller_mode: {}",
            or_not_set(controller.map(|c| c.mode.to_string()).as_deref())
        )?;
        writeln!(
            out,
            "- controller_timeout - read: {} write: {}",
            or_not_set(controller.and_then(|c| c.read_timeout.as_deref())),
            or_not_set(controller.and_then(|c| c.write_timeout.as_deref())),
        )
    }

    fn write_queue_worker<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let Some(queue_worker) = &self.installation.queue_worker else {
            return Ok(());
        };

        writeln!(out, "\nQueue-worker\n")?;
        writeln!(out, "- queue_worker_image: {}", or_not_set(Some(queue_worker.image.as_str())))?;
        writeln!(out, "- queue_worker_replicas: {}", queue_worker.replicas)?;
        writeln!(
            out,
            "- queue_worker_ack_wait: {}",
            or_not_set(queue_worker.ack_wait.as_deref())
        )?;
        writeln!(
            out,
            "- queue_worker_max_inflight: {}",
            or_not_set(queue_worker.max_inflight.map(|n| n.to_string()).as_deref())
        )
    }

    fn write_namespaces<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\nFunction namespaces:\n")?;
        for namespace in &self.installation.function_namespaces {
            writeln!(out, "- {}", namespace)?;
        }
        Ok(())
    }

    fn write_autoscaler<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(autoscaler) = &self.installation.autoscaler {
            writeln!(out, "\nAutoscaler\n")?;
            writeln!(out, "- autoscaler_image: {}", or_not_set(Some(autoscaler.image.as_str())))?;
            writeln!(out, "- autoscaler_replicas: {}", autoscaler.replicas)?;
        }
        Ok(())
    }

    fn write_dashboard<W: Write>(&self, out: &mut W) -> io::Result<()> {
        if let Some(dashboard) = &self.installation.dashboard {
            writeln!(out, "\nDashboard\n")?;
            writeln!(out, "- dashboard_image: {}", or_not_set(Some(dashboard.image.as_str())))?;
        }
        Ok(())
    }

    fn write_features<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\nFeatures detected:\n")?;
        for feature in self.installation.features() {
            writeln!(out, "- {} {}", feature.symbol(), feature.name)?;
        }
        writeln!(out)
    }

    fn write_other<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "Other:\n")?;
        writeln!(
            out,
            "- Kubernetes version: {}",
            self.installation.orchestrator_version
        )?;
        writeln!(
            out,
            "- Asynchronous concurrency (cluster): {}",
            self.installation.async_concurrency()
        )?;
        writeln!(out)
    }

    fn write_functions<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let autoscaling = self.installation.autoscaler.is_some();

        for namespace in &self.installation.function_namespaces {
            writeln!(out, "\nFunctions in ({}):\n", namespace)?;

            let functions = self.installation.functions(namespace);
            if functions.is_empty() {
                writeln!(out, "None detected")?;
            }
            for function in functions {
                write_function(out, function, autoscaling)?;
            }
        }
        Ok(())
    }

    fn write_warnings<W: Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "\nWarnings:\n")?;
        for warning in self.warnings {
            writeln!(out, "{}{}", WARNING_PREFIX, warning)?;
        }
        Ok(())
    }
}

/// One function as an aligned block
///
/// The scaling section is only shown when an autoscaler is deployed.
fn write_function<W: Write>(out: &mut W, function: &Function, autoscaling: bool) -> io::Result<()> {
    let mut tw = TabWriter::new(out).minwidth(0).padding(1);

    writeln!(tw, "* {}\t({} replicas)\n", function.name, function.replicas)?;

    writeln!(tw, "- read_timeout\t{}", or_not_set(function.read_timeout.as_deref()))?;
    writeln!(tw, "- write_timeout\t{}", or_not_set(function.write_timeout.as_deref()))?;
    writeln!(tw, "- exec_timeout\t{}", or_not_set(function.exec_timeout.as_deref()))?;

    if autoscaling {
        match &function.scaling {
            None => writeln!(tw, "\nno scaling configuration was set")?,
            Some(scaling) => {
                writeln!(tw, "\nscaling configuration\n")?;
                writeln!(tw, "- min/max replicas\t{}", scaling.bounds_label())?;
                writeln!(tw, "- type\t{}", or_not_set(scaling.scale_type.as_deref()))?;
                writeln!(tw, "- target\t{}", or_not_set(scaling.target.as_deref()))?;
                writeln!(
                    tw,
                    "- target-proportion\t{}",
                    or_not_set(scaling.proportion.as_deref())
                )?;
                writeln!(tw)?;

                if scaling.zero_enabled() {
                    writeln!(tw, "- scale to zero\t{}", or_not_set(scaling.zero.as_deref()))?;
                    writeln!(
                        tw,
                        "- scale to zero duration\t{}",
                        or_not_set(scaling.zero_duration.as_deref())
                    )?;
                } else {
                    writeln!(tw, "- scale to zero\tdisabled")?;
                }
            }
        }
    }

    writeln!(tw, "\nresources and limits\n")?;
    write_resources(&mut tw, "- requests", &function.requests)?;
    write_resources(&mut tw, "- limits", &function.limits)?;
    writeln!(tw)?;

    tw.flush()
}

fn write_resources<W: Write>(w: &mut W, name: &str, resources: &Resources) -> io::Result<()> {
    if resources.is_empty() {
        return writeln!(w, "{}:\t <none>", name);
    }
    writeln!(
        w,
        "{}:\t RAM: {} CPU: {}",
        name,
        resources.memory_label(),
        resources.cpu_label()
    )
}
