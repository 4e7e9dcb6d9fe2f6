use clap::Subcommand;
use color_eyre::eyre::Result;
use pai_core::{ClusterConfig, PaiClient};

use crate::util::table_to_console;

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// List access tokens of the current user
    List,
    /// Create an application token
    Create,
    /// Revoke a token
    Revoke {
        /// Token to revoke
        token: String,
    },
}

pub async fn run(config: &ClusterConfig, command: TokenCommand) -> Result<()> {
    let client = PaiClient::new(config);
    match command {
        TokenCommand::List => {
            let list = client.token().list().await?;
            let mut rows = vec![vec!["TOKEN".to_string()]];
            for token in list.tokens {
                rows.push(vec![token]);
            }
            table_to_console(&rows);
        }
        TokenCommand::Create => {
            let created = client.token().create_application_token().await?;
            println!("{}", created.token);
        }
        TokenCommand::Revoke { token } => {
            let message = client.token().revoke(&token).await?;
            println!("{}", message.message);
        }
    }
    Ok(())
}
