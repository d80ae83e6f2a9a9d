//! faas-checker: configuration report for OpenFaaS on Kubernetes

use clap::Parser;
use color_eyre::Result;
use faas_checker_core::{ClusterView, Report, evaluate, inspect};
use faas_checker_kube::{ConnectOptions, DEFAULT_KUBECONFIG, KubeClusterView};
use std::io::{self, Write};
use tracing::Level;
use tracing_subscriber::{EnvFilter, prelude::*};

/// faas-checker: check an OpenFaaS installation against best practices
#[derive(Parser, Debug)]
#[command(name = "faas-checker")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to KUBECONFIG ($HOME and ~ are expanded)
    #[arg(long, default_value = DEFAULT_KUBECONFIG)]
    kubeconfig: String,

    /// Namespace the OpenFaaS core components run in
    #[arg(long = "openfaas-namespace", default_value = "openfaas")]
    openfaas_namespace: String,

    /// Kubeconfig context to use (default: current context)
    #[arg(long)]
    context: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    color_eyre::install()?;
    init_logging(cli.debug)?;

    if let Err(err) = run(&cli).await {
        eprintln!("{}", error_line(&err));
        std::process::exit(1);
    }

    Ok(())
}

async fn run(cli: &Cli) -> Result<()> {
    if let Some(context) = &cli.context {
        tracing::info!("Using context: {}", context);
    }

    let options = ConnectOptions::new(&cli.kubeconfig).with_context(cli.context.clone());
    let view = KubeClusterView::connect(&options).await?;

    let mut stdout = io::stdout().lock();
    check(&view, &cli.openfaas_namespace, &mut stdout).await?;
    stdout.flush()?;

    Ok(())
}

/// Inspect, evaluate and write the report
///
/// Everything fallible is resolved before the first byte reaches `out`.
async fn check<V: ClusterView, W: Write>(view: &V, namespace: &str, out: &mut W) -> Result<()> {
    let installation = inspect(view, namespace).await?;
    let warnings = evaluate(&installation)?;
    Report::new(&installation, &warnings).write_to(out)?;
    Ok(())
}

/// One-line diagnostic printed before exiting with status 1
fn error_line(err: &color_eyre::Report) -> String {
    format!("Error: {err:#}")
}

/// Log to stderr so the report on stdout stays clean
///
/// Silent unless `--debug` or `RUST_LOG` asks for output.
fn init_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::from_default_env()
            .add_directive(Level::DEBUG.into())
            .add_directive("h2=info".parse()?)
            .add_directive("hyper=info".parse()?)
            .add_directive("hyper_util=info".parse()?)
            .add_directive("tower=info".parse()?)
            .add_directive("rustls=info".parse()?)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off"))
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .with(filter)
        .init();

    Ok(())
}
