//! HDFS NameNode subcommands.

use anyhow::{Context, Result};
use cdpm_http::services::NameNodeClient;
use cdpm_http::{ResilientClient, SessionAuthenticator};
use clap::{Args, Subcommand};

use super::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct HdfsCommand {
    #[command(subcommand)]
    pub command: HdfsSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum HdfsSubcommand {
    /// Show NameNodeInfo from the active NameNode
    Health(HealthArgs),
}

#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn handle(cmd: HdfsCommand, config: &Config) -> Result<()> {
    let client = ResilientClient::new(
        config.transport()?,
        config.namenode_hosts()?,
        SessionAuthenticator::anonymous(),
    )
    .with_retry(config.retry_policy());
    let namenode = NameNodeClient::new(client);

    match cmd.command {
        HdfsSubcommand::Health(args) => {
            let status = namenode
                .health_status()
                .await
                .map_err(hint)
                .context("Failed to fetch NameNode health")?;
            output::emit(&status, args.pretty)
        }
    }
}
