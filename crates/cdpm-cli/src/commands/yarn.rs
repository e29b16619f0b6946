//! YARN ResourceManager subcommands.

use anyhow::{Context, Result};
use cdpm_http::services::YarnClient;
use cdpm_http::{ResilientClient, SessionAuthenticator};
use clap::{Args, Subcommand};

use super::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct YarnCommand {
    #[command(subcommand)]
    pub command: YarnSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum YarnSubcommand {
    /// Show one application
    App(AppArgs),
}

#[derive(Args, Debug)]
pub struct AppArgs {
    /// Application ID, e.g. application_1700000000000_0001
    pub app_id: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn handle(cmd: YarnCommand, config: &Config) -> Result<()> {
    let client = ResilientClient::new(
        config.transport()?,
        config.yarn_hosts()?,
        SessionAuthenticator::anonymous(),
    )
    .with_retry(config.retry_policy());
    let yarn = YarnClient::new(client);

    match cmd.command {
        YarnSubcommand::App(args) => {
            let app = yarn
                .application(&args.app_id)
                .await
                .map_err(hint)
                .with_context(|| format!("Failed to fetch application {}", args.app_id))?;
            output::emit(&app, args.pretty)
        }
    }
}
