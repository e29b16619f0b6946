//! HDFS balancer commands.
//!
//! The last started balancer command is kept in a status file so `stop`
//! works without an ID.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cdpm_http::services::ApiCommand;
use clap::{Args, Subcommand};

use super::{AuthArgs, connect};
use crate::commands::hint;
use crate::config::Config;
use crate::output;

#[derive(Args, Debug)]
pub struct RebalanceCommand {
    #[command(subcommand)]
    pub command: RebalanceSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum RebalanceSubcommand {
    /// Start the balancer
    Start(StartArgs),

    /// Abort the balancer if it is still running
    Stop(StopArgs),
}

#[derive(Args, Debug)]
pub struct StartArgs {
    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

#[derive(Args, Debug)]
pub struct StopArgs {
    /// Command ID (defaults to the last started command)
    pub id: Option<u64>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,
}

pub async fn handle(cmd: RebalanceCommand, auth: &AuthArgs, config: &Config) -> Result<()> {
    match cmd.command {
        RebalanceSubcommand::Start(args) => start(args, auth, config).await,
        RebalanceSubcommand::Stop(args) => stop(args, auth, config).await,
    }
}

async fn start(args: StartArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let cm = connect(auth, config).await?;
    let command = cm
        .rebalance_start()
        .await
        .map_err(hint)
        .context("Failed to start rebalance")?;

    let status_path = config.rebalance_status_path()?;
    save_status(&status_path, &command)?;

    output::success(&format!("Rebalance started (command {})", command.id));
    output::emit(&command, args.pretty)
}

async fn stop(args: StopArgs, auth: &AuthArgs, config: &Config) -> Result<()> {
    let status_path = config.rebalance_status_path()?;
    let id = match args.id {
        Some(id) => id,
        None => load_status(&status_path)?
            .context("No rebalance command recorded. Pass the command ID.")?
            .id,
    };

    let cm = connect(auth, config).await?;
    let current = cm
        .command(id)
        .await
        .map_err(hint)
        .with_context(|| format!("Failed to fetch command {}", id))?;

    let command = if current.active {
        let aborted = cm
            .rebalance_stop(id)
            .await
            .map_err(hint)
            .with_context(|| format!("Failed to abort command {}", id))?;
        output::success(&format!("Rebalance aborted (command {})", id));
        aborted
    } else {
        output::warning(&format!("Command {} is not active; nothing to abort", id));
        current
    };

    save_status(&status_path, &command)?;
    output::emit(&command, args.pretty)
}

fn load_status(path: &Path) -> Result<Option<ApiCommand>> {
    if !path.exists() {
        return Ok(None);
    }
    let json = fs::read_to_string(path).context("Failed to read rebalance status")?;
    let command = serde_json::from_str(&json).context("Invalid rebalance status file")?;
    Ok(Some(command))
}

fn save_status(path: &Path, command: &ApiCommand) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create status directory")?;
    }
    let json = serde_json::to_string_pretty(command)?;
    fs::write(path, json).context("Failed to write rebalance status")?;
    tracing::debug!(path = %path.display(), id = command.id, "rebalance status saved");
    Ok(())
}
