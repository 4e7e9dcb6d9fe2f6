use std::path::PathBuf;

use clap::Subcommand;
use color_eyre::eyre::Result;
use pai_core::ClusterConfig;

use crate::clusters::{ClusterRegistry, RegisteredCluster};
use crate::util::{read_json, table_to_console};

#[derive(Debug, Subcommand)]
pub enum ClusterCommand {
    /// Register a cluster from a descriptor file
    Add {
        /// Alias to register the cluster under
        alias: String,
        /// Path to a JSON descriptor (a single object or an array)
        #[arg(long)]
        file: PathBuf,
    },
    /// List registered clusters
    List,
    /// Remove a registered cluster
    Remove {
        /// Alias to remove
        alias: String,
    },
}

pub fn run(registry: &ClusterRegistry, command: ClusterCommand) -> Result<()> {
    match command {
        ClusterCommand::Add { alias, file } => {
            // A descriptor file holds either one cluster object or an
            // array of them; take the first entry of an array.
            let config: ClusterConfig = match read_json(&file) {
                Ok(config) => config,
                Err(_) => ClusterConfig::all_from_file(&file)?.swap_remove(0),
            };
            config.validate()?;
            registry.add(RegisteredCluster {
                alias: alias.clone(),
                config,
            })?;
            println!("Registered cluster `{}`", alias);
        }
        ClusterCommand::List => {
            let clusters = registry.list();
            if clusters.is_empty() {
                println!("No clusters registered.");
                return Ok(());
            }
            let mut rows = vec![vec![
                "ALIAS".to_string(),
                "USER".to_string(),
                "REST SERVER".to_string(),
            ]];
            for cluster in clusters {
                rows.push(vec![
                    cluster.alias,
                    cluster.config.username,
                    cluster.config.rest_server_uri,
                ]);
            }
            table_to_console(&rows);
        }
        ClusterCommand::Remove { alias } => {
            registry.remove(&alias)?;
            println!("Removed cluster `{}`", alias);
        }
    }
    Ok(())
}
