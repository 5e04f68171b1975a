//! Job cycler - keeps one short-lived batch Job oscillating in a namespace

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use job_cycler::client;
use job_cycler::cycler::{JobCycler, TokioClock};
use job_cycler::job::{parse_env_var, JobTemplate};
use job_cycler::orchestrator::KubeJobClient;

/// Cycles a short-lived Kubernetes batch Job: create, wait, delete, repeat
#[derive(Parser, Debug)]
#[command(name = "job-cycler", version, about, long_about = None)]
struct Cli {
    /// Path to the kubeconfig file used when in-cluster configuration is
    /// unavailable (defaults to ~/.kube/config)
    #[arg(long)]
    kubeconfig: Option<PathBuf>,

    /// Namespace the Job is cycled in
    #[arg(long, default_value = "default")]
    namespace: String,

    /// Name of the cycled Job, reused every cycle
    #[arg(long, default_value = "cycled-job")]
    job_name: String,

    /// Container image the Job runs
    #[arg(long, default_value = "alpine")]
    image: String,

    /// Shell command the container runs (via `sh -c`)
    #[arg(long, default_value = "sleep 30")]
    command: String,

    /// Environment variables for the container (KEY=VALUE, repeatable)
    #[arg(long = "env", value_parser = parse_env_var)]
    env: Vec<(String, String)>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let kubeconfig = cli.kubeconfig.or_else(client::default_kubeconfig_path);
    let kube_client = match client::create_client(kubeconfig.as_deref()).await {
        Ok(c) => c,
        Err(e) => {
            // Terminal for this run: the loop is never entered, but the
            // process still exits cleanly.
            tracing::error!(error = %e, "failed to initialize kubernetes session");
            return Ok(());
        }
    };

    let template = JobTemplate {
        name: cli.job_name,
        namespace: cli.namespace.clone(),
        image: cli.image,
        command: cli.command,
        env: cli.env,
    };

    tracing::info!(
        job = %template.name,
        namespace = %template.namespace,
        "job cycler starting"
    );

    let api = KubeJobClient::new(kube_client, &cli.namespace);
    let cycler = JobCycler::new(Box::new(api), Box::new(TokioClock), template);
    cycler.run_forever().await;

    Ok(())
}
