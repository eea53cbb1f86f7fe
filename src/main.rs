use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dockhand::commands::{deploy, status, verify};
use dockhand::deploy::{parse_env_pair, DeployPlan};

#[derive(Parser)]
#[command(name = "dockhand")]
#[command(about = "Compose deployment CLI with health verification", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fresh-clone the repo, place the artifact, write .env, restart the
    /// compose stack, and verify the result
    Deploy {
        /// URL of the repository to clone
        #[arg(long)]
        repo_url: String,

        /// Path to the built artifact on this machine (moved into place)
        #[arg(long)]
        artifact: PathBuf,

        /// Root directory for the checkout (wiped on every deploy)
        #[arg(long)]
        deploy_dir: PathBuf,

        /// Extra KEY=VALUE pair for the rendered .env (can be repeated)
        #[arg(long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
        env: Vec<(String, String)>,

        /// Skip health verification after compose up
        #[arg(long)]
        no_verify: bool,

        /// Total verification budget in seconds (default: 60)
        #[arg(long)]
        timeout: Option<u64>,

        /// Continuous healthy duration required in seconds (default: 15)
        #[arg(long)]
        stable: Option<u64>,

        /// Sleep between fleet samples in seconds (default: 2)
        #[arg(long)]
        poll_interval: Option<u64>,
    },

    /// Verify the health of an already-running compose stack
    Verify {
        /// Directory containing the compose file
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,

        /// Total verification budget in seconds (default: 60)
        #[arg(long)]
        timeout: Option<u64>,

        /// Continuous healthy duration required in seconds (default: 15)
        #[arg(long)]
        stable: Option<u64>,

        /// Sleep between fleet samples in seconds (default: 2)
        #[arg(long)]
        poll_interval: Option<u64>,
    },

    /// Show a one-shot snapshot of every service's state and health
    Status {
        /// Directory containing the compose file
        #[arg(long, default_value = ".")]
        project_dir: PathBuf,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Deploy {
            repo_url,
            artifact,
            deploy_dir,
            env,
            no_verify,
            timeout,
            stable,
            poll_interval,
        } => {
            let plan = DeployPlan {
                repo_url,
                artifact,
                deploy_dir,
                extra_env: env,
            };
            deploy::execute(plan, no_verify, timeout, stable, poll_interval)
        }
        Commands::Verify {
            project_dir,
            timeout,
            stable,
            poll_interval,
        } => verify::execute(project_dir, timeout, stable, poll_interval),
        Commands::Status { project_dir } => status::execute(project_dir),
    }
}
