//! Rigging CLI - deploy Helm releases with freshly built images

use clap::{Args, Parser, Subcommand};
use rigging_helm::DeployerOptions;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

mod commands;
mod error;
mod exit_codes;
mod util;

use error::Result;

#[derive(Parser)]
#[command(name = "rigging")]
#[command(author = "Rigging Contributors")]
#[command(version)]
#[command(about = "Deploy Helm releases with freshly built images", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Deploy configuration file
    #[arg(short, long, global = true, default_value = "rigging.yaml")]
    config: PathBuf,

    /// helm binary to run
    #[arg(long, global = true, env = "RIGGING_HELM", default_value = "helm")]
    helm_binary: PathBuf,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

/// Cluster selection shared by deploy and cleanup
#[derive(Args)]
struct ClusterArgs {
    /// Kubernetes context for every helm invocation
    #[arg(long)]
    kube_context: Option<String>,

    /// kubeconfig file for every helm invocation
    #[arg(long)]
    kubeconfig: Option<String>,

    /// Namespace that overrides every release's namespace
    #[arg(short, long)]
    namespace: Option<String>,
}

impl ClusterArgs {
    fn into_options(self) -> DeployerOptions {
        DeployerOptions {
            kube_context: self.kube_context.unwrap_or_default(),
            kube_config: self.kubeconfig.unwrap_or_default(),
            namespace: self.namespace.unwrap_or_default(),
            ..Default::default()
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Install or upgrade every release
    Deploy {
        #[command(flatten)]
        cluster: ClusterArgs,

        /// Force resource updates on upgrade
        #[arg(long)]
        force: bool,

        /// Builds file (YAML or JSON) listing built images
        #[arg(short, long)]
        builds: Option<PathBuf>,

        /// Built image as NAME=TAG (repeatable)
        #[arg(short, long = "image")]
        images: Vec<String>,
    },

    /// Delete every release
    Cleanup {
        #[command(flatten)]
        cluster: ClusterArgs,
    },

    /// List the files the releases depend on
    Deps,

    /// Show the helm binary version
    HelmVersion,
}

#[tokio::main]
async fn main() {
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_tracing(cli.debug);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Cancel the returned token on Ctrl-C; running helm processes are killed
fn cancel_on_interrupt() -> CancellationToken {
    let token = CancellationToken::new();
    let child = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, stopping helm");
            child.cancel();
        }
    });
    token
}

async fn run(cli: Cli) -> Result<()> {
    let cancel = cancel_on_interrupt();

    match cli.command {
        Commands::Deploy {
            cluster,
            force,
            builds,
            images,
        } => {
            let builds = util::load_builds(builds.as_deref(), &images)?;
            let mut options = cluster.into_options();
            options.force = force;
            commands::deploy::run(&cli.config, &cli.helm_binary, options, &builds, &cancel).await
        }

        Commands::Cleanup { cluster } => {
            commands::cleanup::run(&cli.config, &cli.helm_binary, cluster.into_options(), &cancel)
                .await
        }

        Commands::Deps => commands::deps::run(&cli.config),

        Commands::HelmVersion => commands::version::run(&cli.helm_binary, &cancel).await,
    }
}
