mod clusters;
mod cmd;
mod util;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::clusters::ClusterRegistry;
use crate::cmd::cluster::ClusterCommand;
use crate::cmd::job::JobCommand;
use crate::cmd::token::TokenCommand;

#[derive(Parser)]
#[command(name = "pai")]
#[command(about = "Command-line client for OpenPAI-compatible clusters", long_about = None)]
struct Cli {
    /// Alias of the registered cluster to talk to
    #[arg(long, global = true)]
    cluster: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage registered clusters
    Cluster {
        #[command(subcommand)]
        command: ClusterCommand,
    },
    /// Submit and inspect jobs
    Job {
        #[command(subcommand)]
        command: JobCommand,
    },
    /// Manage access tokens
    Token {
        #[command(subcommand)]
        command: TokenCommand,
    },
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let registry = ClusterRegistry::default_path()?;

    match cli.command {
        Commands::Cluster { command } => cmd::cluster::run(&registry, command),
        Commands::Job { command } => {
            let config = cmd::select_cluster(&registry, cli.cluster.as_deref())?;
            cmd::job::run(&config, command).await
        }
        Commands::Token { command } => {
            let config = cmd::select_cluster(&registry, cli.cluster.as_deref())?;
            cmd::token::run(&config, command).await
        }
    }
}
