use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{Local, TimeZone};
use clap::Subcommand;
use color_eyre::eyre::{eyre, Result};
use indicatif::ProgressBar;
use pai_core::client::JobExecutionType;
use pai_core::{ClusterConfig, PaiClient};

use crate::util::{render_job_template, table_to_console};

#[derive(Debug, Subcommand)]
pub enum JobCommand {
    /// Submit a job from a YAML protocol file
    Submit {
        /// Path to the protocol file
        #[arg(long)]
        config: PathBuf,
        /// Template arguments as `key:value` pairs separated by `;`
        #[arg(long)]
        args: Option<String>,
    },
    /// List jobs
    List {
        /// List jobs of this user instead of the configured one
        #[arg(long)]
        user: Option<String>,
        /// List jobs of all users
        #[arg(long)]
        all: bool,
    },
    /// Show the status of a job
    Status {
        /// Job name
        name: String,
        /// Owner of the job, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Stop a running job
    Stop {
        /// Job name
        name: String,
        /// Owner of the job, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Restart a stopped job
    Start {
        /// Job name
        name: String,
        /// Owner of the job, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
    /// Print the protocol a job was submitted with
    Config {
        /// Job name
        name: String,
        /// Owner of the job, defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },
}

pub async fn run(config: &ClusterConfig, command: JobCommand) -> Result<()> {
    let client = PaiClient::new(config);
    match command {
        JobCommand::Submit {
            config: protocol_path,
            args,
        } => {
            let text = fs::read_to_string(&protocol_path)?;
            let rendered = render_job_template(&text, args.as_deref());

            // Catch protocol mistakes locally before the round trip.
            let protocol: serde_yaml::Value = serde_yaml::from_str(&rendered)?;
            let name = protocol
                .get("name")
                .and_then(|v| v.as_str())
                .ok_or_else(|| eyre!("protocol has no `name` field"))?
                .to_string();

            let spinner = ProgressBar::new_spinner();
            spinner.set_message(format!("Submitting job `{}`", name));
            spinner.enable_steady_tick(Duration::from_millis(100));
            let result = client.job().submit(&rendered).await;
            spinner.finish_and_clear();
            result?;
            println!("Submitted job `{}~{}`", config.username, name);
        }
        JobCommand::List { user, all } => {
            let username = if all {
                None
            } else {
                Some(user.unwrap_or_else(|| config.username.clone()))
            };
            let jobs = client.job().list(username.as_deref()).await?;
            let mut rows = vec![vec![
                "NAME".to_string(),
                "USER".to_string(),
                "STATE".to_string(),
                "VC".to_string(),
                "STARTED".to_string(),
            ]];
            for job in jobs {
                rows.push(vec![
                    job.name,
                    job.username,
                    job.state,
                    job.virtual_cluster.unwrap_or_else(|| "-".to_string()),
                    format_time(job.created_time),
                ]);
            }
            table_to_console(&rows);
        }
        JobCommand::Status { name, user } => {
            let username = user.unwrap_or_else(|| config.username.clone());
            let detail = client.job().get(&username, &name).await?;
            let status = detail.job_status;
            println!("Name:      {}", detail.name.unwrap_or(name));
            println!("User:      {}", status.username.unwrap_or(username));
            println!("State:     {}", status.state);
            if let Some(sub_state) = status.sub_state {
                println!("Substate:  {}", sub_state);
            }
            println!("Retries:   {}", status.retries);
            if let Some(vc) = status.virtual_cluster {
                println!("VC:        {}", vc);
            }
            println!("Started:   {}", format_time(status.created_time));
            println!("Completed: {}", format_time(status.completed_time));
            if let Some(code) = status.app_exit_code {
                println!("Exit code: {}", code);
            }
        }
        JobCommand::Stop { name, user } => {
            let username = user.unwrap_or_else(|| config.username.clone());
            let message = client
                .job()
                .update_execution_type(&username, &name, JobExecutionType::Stop)
                .await?;
            println!("{}", message.message);
        }
        JobCommand::Start { name, user } => {
            let username = user.unwrap_or_else(|| config.username.clone());
            let message = client
                .job()
                .update_execution_type(&username, &name, JobExecutionType::Start)
                .await?;
            println!("{}", message.message);
        }
        JobCommand::Config { name, user } => {
            let username = user.unwrap_or_else(|| config.username.clone());
            let protocol = client.job().get_config(&username, &name).await?;
            print!("{}", protocol);
            if !protocol.ends_with('\n') {
                println!();
            }
        }
    }
    Ok(())
}

fn format_time(millis: Option<u64>) -> String {
    let Some(millis) = millis else {
        return "-".to_string();
    };
    match Local.timestamp_millis_opt(millis as i64).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => "-".to_string(),
    }
}
